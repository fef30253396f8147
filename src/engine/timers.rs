use serde::{Deserialize, Serialize};

/// Назначение логического таймера.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimerPurpose {
    /// Окно обвинения после броска.
    InterruptWindow,
    /// Таймаут решения по способности.
    Decision,
    /// Пауза между фазами/раундами (и возврат в лобби).
    Transition,
}

/// Токен таймера: назначение + поколение.
///
/// Движок сам не спит: он выдаёт команды "поставь/сними таймер", а
/// внешний слой (runtime) возвращает `timer_fired(token)`. Поколение
/// делает поздний выстрел отменённого таймера пустой операцией — это
/// единственная защита от двойного разрешения, и её достаточно, потому
/// что все операции сессии сериализованы одним владельцем.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub purpose: TimerPurpose,
    pub generation: u64,
}

/// Команда внешнему слою.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerCommand {
    Schedule { token: TimerToken, delay_secs: u64 },
    Cancel { token: TimerToken },
}

/// Таблица активных логических таймеров сессии.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerTable {
    next_generation: u64,
    interrupt: Option<TimerToken>,
    decision: Option<TimerToken>,
    transition: Option<TimerToken>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, purpose: TimerPurpose) -> &mut Option<TimerToken> {
        match purpose {
            TimerPurpose::InterruptWindow => &mut self.interrupt,
            TimerPurpose::Decision => &mut self.decision,
            TimerPurpose::Transition => &mut self.transition,
        }
    }

    /// Поставить таймер; прежний таймер того же назначения снимается.
    pub fn schedule(&mut self, purpose: TimerPurpose, delay_secs: u64) -> Vec<TimerCommand> {
        let mut commands = Vec::new();

        self.next_generation += 1;
        let token = TimerToken {
            purpose,
            generation: self.next_generation,
        };

        if let Some(old) = self.slot(purpose).replace(token) {
            commands.push(TimerCommand::Cancel { token: old });
        }
        commands.push(TimerCommand::Schedule { token, delay_secs });
        commands
    }

    /// Снять таймер, если стоит.
    pub fn cancel(&mut self, purpose: TimerPurpose) -> Vec<TimerCommand> {
        match self.slot(purpose).take() {
            Some(token) => vec![TimerCommand::Cancel { token }],
            None => Vec::new(),
        }
    }

    /// Принять выстрел таймера. true = токен актуален (и слот очищен),
    /// false = выстрел устаревший, игнорируем.
    pub fn accept_fire(&mut self, token: TimerToken) -> bool {
        let slot = self.slot(token.purpose);
        if *slot == Some(token) {
            *slot = None;
            true
        } else {
            false
        }
    }
}
