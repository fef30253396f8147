use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;

/// Конфигурация сессии: лимиты ставок, таймауты, бонусы, штрафы.
///
/// Аналог стейков/правил стола: всё, что отличает "столы" друг от друга,
/// собрано здесь, движок сам констант не держит.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Стартовый баланс каждого участника при старте игры.
    pub starting_balance: Chips,
    /// Минимальная ставка не-дилера.
    pub min_wager: Chips,
    /// Максимальная ставка не-дилера.
    pub max_wager: Chips,
    /// Максимум участников в комнате.
    pub max_participants: usize,

    /// Длительность окна обвинения после каждого броска (сек).
    pub interrupt_window_secs: u64,
    /// Таймаут решения по способности, если сама способность не задала свой (сек).
    pub decision_timeout_secs: u64,
    /// Пауза между раундами / перед возвратом в лобби (сек).
    pub round_transition_secs: u64,

    /// Бонус каждому активному участнику за полный круг дилера ("сет").
    pub set_bonus: Chips,
    /// Штраф обвинителю за ложное обвинение.
    pub false_accusation_penalty: Chips,
    /// Штраф уличённому, если у способности нет своего штрафа.
    pub default_cheat_penalty: Chips,

    /// Раздавать ли способности на старте игры.
    /// false = фаза ability_distribution проходит как no-op.
    pub distribute_abilities: bool,
    /// Разрешить повторы при раздаче способностей.
    pub abilities_with_replacement: bool,
}

impl SessionConfig {
    /// Стандартные правила стола.
    pub fn standard() -> Self {
        Self {
            starting_balance: Chips(10_000),
            min_wager: Chips(100),
            max_wager: Chips(10_000),
            max_participants: 6,
            interrupt_window_secs: 5,
            decision_timeout_secs: 15,
            round_transition_secs: 3,
            set_bonus: Chips(500),
            false_accusation_penalty: Chips(500),
            default_cheat_penalty: Chips(2_000),
            distribute_abilities: true,
            abilities_with_replacement: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Лимит повторных бросков при "пустом" результате (бланке).
/// Четвёртый бланк подряд записывается как автоматический проигрыш.
pub const MAX_REROLL_ATTEMPTS: u8 = 3;

/// Сколько костей в обычном броске.
pub const DICE_PER_ROLL: usize = 3;
