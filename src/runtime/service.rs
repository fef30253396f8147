//! Актор движка: единственный владелец всех сессий.
//!
//! Все операции — команды клиентов и выстрелы таймеров — проходят через
//! один mpsc-канал и исполняются строго последовательно. Это единственная
//! точка сериализации: движку не нужны блокировки, а поздний выстрел
//! отменённого таймера гасится поколением токена.

use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error};

use crate::api::{build_session_view, ApiError, Command, Reply};
use crate::domain::RoomCode;
use crate::engine::{
    EngineError, EventScope, Notification, SessionManager, TimerCommand, TimerToken,
};
use crate::engine::orchestrator::OpOutput;
use crate::infra::{codes, SystemRng};

/// Событие с привязкой к комнате — единица broadcast-канала.
#[derive(Clone, Debug)]
pub struct OutboundEnvelope {
    pub code: RoomCode,
    pub scope: EventScope,
    pub event: Notification,
}

enum Request {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<Reply, ApiError>>,
    },
    TimerFired {
        code: RoomCode,
        token: TimerToken,
    },
}

/// Ручка актора: ей владеет транспортный слой.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Request>,
    events: broadcast::Sender<OutboundEnvelope>,
}

impl EngineHandle {
    /// Выполнить команду и дождаться результата.
    pub async fn execute(&self, command: Command) -> Result<Reply, ApiError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Request::Command {
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ApiError::EngineGone)?;
        reply_rx.await.map_err(|_| ApiError::EngineGone)?
    }

    /// Подписка на поток событий всех комнат. Порядок внутри комнаты
    /// гарантирован порядком операций актора.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEnvelope> {
        self.events.subscribe()
    }
}

/// Запустить актора движка.
pub fn spawn() -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(256);
    let (events_tx, _) = broadcast::channel(1024);

    let actor = Actor {
        manager: SessionManager::new(),
        rx,
        self_tx: tx.clone(),
        events: events_tx.clone(),
        timers: HashMap::new(),
    };
    let handle = tokio::spawn(actor.run());

    (
        EngineHandle {
            tx,
            events: events_tx,
        },
        handle,
    )
}

struct Actor {
    manager: SessionManager<SystemRng>,
    rx: mpsc::Receiver<Request>,
    /// Клон собственного входа — для возврата выстрелов таймеров.
    self_tx: mpsc::Sender<Request>,
    events: broadcast::Sender<OutboundEnvelope>,
    /// Живые tokio-таймеры по (комната, токен).
    timers: HashMap<(RoomCode, TimerToken), JoinHandle<()>>,
}

impl Actor {
    async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            match request {
                Request::Command { command, reply } => {
                    let result = self.handle_command(command);
                    // Клиент мог отвалиться, не дождавшись ответа.
                    let _ = reply.send(result);
                }
                Request::TimerFired { code, token } => self.handle_timer(code, token),
            }
        }
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }

    fn handle_command(&mut self, command: Command) -> Result<Reply, ApiError> {
        match command {
            Command::CreateSession {
                participant_id,
                name,
                config,
            } => {
                let mut rng = SystemRng::new();
                let mut code = codes::generate(&mut rng);
                while self.manager.contains(&code) {
                    code = codes::generate(&mut rng);
                }
                let orchestrator = self.manager.create(
                    code.clone(),
                    participant_id,
                    name,
                    config.unwrap_or_default(),
                    rng,
                )?;
                let view = build_session_view(&orchestrator.session);
                let mut reply = Reply::empty(code);
                reply.view = Some(view);
                Ok(reply)
            }

            Command::GetView { code } => {
                let code = codes::normalize(&code);
                let orchestrator = self.manager.get(&code)?;
                let view = build_session_view(&orchestrator.session);
                let mut reply = Reply::empty(code);
                reply.view = Some(view);
                Ok(reply)
            }

            Command::Join {
                code,
                participant_id,
                name,
            } => {
                let code = codes::normalize(&code);
                let out = self.manager.get_mut(&code)?.join(participant_id, name)?;
                Ok(self.realize(&code, out))
            }

            Command::Leave {
                code,
                participant_id,
            } => {
                let code = codes::normalize(&code);
                let out = self.manager.get_mut(&code)?.leave(&participant_id)?;
                let reply = self.realize(&code, out);
                self.cleanup(&code);
                Ok(reply)
            }

            Command::StartGame {
                code,
                participant_id,
            } => {
                let code = codes::normalize(&code);
                let out = self.manager.get_mut(&code)?.start_game(&participant_id)?;
                Ok(self.realize(&code, out))
            }

            Command::PlaceWager {
                code,
                participant_id,
                amount,
            } => {
                let code = codes::normalize(&code);
                let out = self
                    .manager
                    .get_mut(&code)?
                    .place_wager(&participant_id, amount)?;
                Ok(self.realize(&code, out))
            }

            Command::RollDice {
                code,
                participant_id,
            } => {
                let code = codes::normalize(&code);
                let out = self.manager.get_mut(&code)?.roll_dice(&participant_id)?;
                Ok(self.realize(&code, out))
            }

            Command::ResolveDecision {
                code,
                participant_id,
                choice,
            } => {
                let code = codes::normalize(&code);
                let out = self
                    .manager
                    .get_mut(&code)?
                    .resolve_decision(&participant_id, choice)?;
                Ok(self.realize(&code, out))
            }

            Command::Accuse {
                code,
                participant_id,
                target_id,
                round,
            } => {
                let code = codes::normalize(&code);
                let target = target_id.ok_or(EngineError::MissingTarget)?;
                let out = self
                    .manager
                    .get_mut(&code)?
                    .accuse(&participant_id, &target, round)?;
                Ok(self.realize(&code, out))
            }
        }
    }

    fn handle_timer(&mut self, code: RoomCode, token: TimerToken) {
        self.timers.remove(&(code.clone(), token));
        match self.manager.get_mut(&code) {
            Ok(orchestrator) => match orchestrator.timer_fired(token) {
                Ok(out) => {
                    self.realize(&code, out);
                    self.cleanup(&code);
                }
                Err(e) => {
                    error!(session = %code, ?token, error = %e, "ошибка обработки таймера")
                }
            },
            // Сессию уже убрали — выстрел пережил её, это нормально.
            Err(_) => debug!(session = %code, ?token, "таймер пережил сессию"),
        }
    }

    /// Разнести события и материализовать команды таймеров.
    fn realize(&mut self, code: &RoomCode, out: OpOutput) -> Reply {
        for outbound in &out.events {
            // Ошибка = нет ни одного подписчика; это не сбой.
            let _ = self.events.send(OutboundEnvelope {
                code: code.clone(),
                scope: outbound.scope.clone(),
                event: outbound.event.clone(),
            });
        }

        for command in &out.timers {
            match command {
                TimerCommand::Cancel { token } => {
                    if let Some(handle) = self.timers.remove(&(code.clone(), *token)) {
                        handle.abort();
                    }
                }
                TimerCommand::Schedule { token, delay_secs } => {
                    let tx = self.self_tx.clone();
                    let fire_code = code.clone();
                    let token = *token;
                    let delay = *delay_secs;
                    let handle = tokio::spawn(async move {
                        sleep(Duration::from_secs(delay)).await;
                        let _ = tx
                            .send(Request::TimerFired {
                                code: fire_code,
                                token,
                            })
                            .await;
                    });
                    self.timers.insert((code.clone(), token), handle);
                }
            }
        }

        Reply {
            code: code.clone(),
            events: out.events,
            timers: out.timers,
            view: None,
        }
    }

    /// Убрать опустевшую сессию вместе с её таймерами.
    fn cleanup(&mut self, code: &RoomCode) {
        if self.manager.remove_if_empty(code) {
            let stale: Vec<(RoomCode, TimerToken)> = self
                .timers
                .keys()
                .filter(|(c, _)| c == code)
                .cloned()
                .collect();
            for key in stale {
                if let Some(handle) = self.timers.remove(&key) {
                    handle.abort();
                }
            }
        }
    }
}
