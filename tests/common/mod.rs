//! Общая обвязка интеграционных тестов: скриптованный источник
//! случайности и сборка столов.

#![allow(dead_code)]

use std::collections::VecDeque;

use chinchiro_engine::domain::SessionConfig;
use chinchiro_engine::engine::orchestrator::OpOutput;
use chinchiro_engine::engine::{
    EventScope, Notification, RandomSource, TimerCommand, TimerPurpose, TimerToken,
};
use chinchiro_engine::{Session, SessionOrchestrator};

/// Скриптованный источник: кости и индексы задаются заранее,
/// перемешивание сохраняет порядок входа.
pub struct ScriptedRng {
    rolls: VecDeque<u8>,
    picks: VecDeque<usize>,
}

impl ScriptedRng {
    pub fn new() -> Self {
        Self {
            rolls: VecDeque::new(),
            picks: VecDeque::new(),
        }
    }

    pub fn with_rolls(rolls: &[u8]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
            picks: VecDeque::new(),
        }
    }

    pub fn with_picks(mut self, picks: &[usize]) -> Self {
        self.picks = picks.iter().copied().collect();
        self
    }
}

impl RandomSource for ScriptedRng {
    fn roll_die(&mut self) -> u8 {
        self.rolls.pop_front().expect("сценарий бросков исчерпан")
    }

    fn pick(&mut self, _n: usize) -> usize {
        self.picks.pop_front().unwrap_or(0)
    }

    fn shuffle<T>(&mut self, _slice: &mut [T]) {
        // Порядок входа и есть порядок бросков.
    }
}

/// Конфиг без раздачи способностей — тесты выдают их руками.
pub fn no_abilities_config() -> SessionConfig {
    SessionConfig {
        distribute_abilities: false,
        ..SessionConfig::standard()
    }
}

/// Логи движка в вывод теста (повторная инициализация безвредна).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Стол: первый в списке — хост (и дилер первого раунда,
/// потому что перемешивание скриптовано в no-op).
pub fn table(
    names: &[&str],
    config: SessionConfig,
    rng: ScriptedRng,
) -> SessionOrchestrator<ScriptedRng> {
    init_tracing();
    let host = names[0];
    let session = Session::new("TEST42".to_string(), host.to_string(), host.to_string(), config);
    let mut orchestrator = SessionOrchestrator::new(session, rng);
    for name in &names[1..] {
        orchestrator
            .join(name.to_string(), name.to_string())
            .expect("вход в лобби");
    }
    orchestrator
}

/// Только broadcast-события операции, в порядке возникновения.
pub fn broadcasts(out: &OpOutput) -> Vec<&Notification> {
    out.events
        .iter()
        .filter(|o| o.scope == EventScope::Broadcast)
        .map(|o| &o.event)
        .collect()
}

/// Последний поставленный таймер заданного назначения.
pub fn scheduled_token(out: &OpOutput, purpose: TimerPurpose) -> TimerToken {
    out.timers
        .iter()
        .rev()
        .find_map(|c| match c {
            TimerCommand::Schedule { token, .. } if token.purpose == purpose => Some(*token),
            _ => None,
        })
        .expect("таймер не был поставлен")
}

/// Баланс участника.
pub fn balance(orchestrator: &SessionOrchestrator<ScriptedRng>, id: &str) -> i64 {
    orchestrator
        .session
        .participant(&id.to_string())
        .expect("участник есть")
        .balance
        .0
}
