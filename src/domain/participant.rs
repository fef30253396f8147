use serde::{Deserialize, Serialize};

use crate::ability::Ability;
use crate::domain::chips::Chips;
use crate::domain::ParticipantId;
use crate::eval::Hand;

/// Состояние участника внутри сессии.
///
/// Жизненный цикл: создаётся при входе, сбрасывается на старте игры
/// (баланс, способность) и на старте раунда (ставка/кости/переброс),
/// уничтожается при выходе из лобби или развале сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Связь с клиентом жива. Реконнект — забота транспорта,
    /// здесь только флаг.
    pub connected: bool,
    pub balance: Chips,
    /// Ставка текущего раунда (у дилера всегда ноль).
    pub wager: Chips,
    /// Текущие кости: пусто, 3 значения, либо 4 пока способность
    /// в середине разрешения.
    pub dice: Vec<u8>,
    /// Оценённая рука текущего броска.
    pub hand: Option<Hand>,
    pub is_dealer: bool,
    /// Способность на игру (максимум одна).
    pub ability: Option<Ability>,
    /// Использовано перебросов в этом раунде (0..=3).
    pub reroll_attempts: u8,
    /// Четвёртый бланк подряд: результат записан как автопроигрыш.
    pub roll_forfeited: bool,
    /// Выбыл по банкротству. Ставится только на границе раунда.
    pub eliminated: bool,
    /// Итоговое место, заполняется только на конце игры.
    pub final_rank: Option<u32>,
}

impl Participant {
    pub fn new(id: ParticipantId, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
            balance: Chips::ZERO,
            wager: Chips::ZERO,
            dice: Vec::new(),
            hand: None,
            is_dealer: false,
            ability: None,
            reroll_attempts: 0,
            roll_forfeited: false,
            eliminated: false,
            final_rank: None,
        }
    }

    /// Сброс на старте игры: баланс восстановлен, способность снята
    /// (новая раздача — забота фазы ability_distribution).
    pub fn reset_for_game(&mut self, starting_balance: Chips) {
        self.balance = starting_balance;
        self.ability = None;
        self.is_dealer = false;
        self.eliminated = false;
        self.final_rank = None;
        self.reset_for_round();
    }

    /// Сброс на старте раунда.
    pub fn reset_for_round(&mut self) {
        self.wager = Chips::ZERO;
        self.dice.clear();
        self.hand = None;
        self.reroll_attempts = 0;
        self.roll_forfeited = false;
    }

    /// Участвует ли в игре: на связи и не выбыл.
    ///
    /// Баланс здесь не смотрим: штрафы и выплаты могут уводить его в
    /// минус посреди раунда, не выбивая участника из текущей очереди.
    /// Банкротство фиксируется отдельным проходом на границе раунда.
    pub fn is_active(&self) -> bool {
        self.connected && !self.eliminated
    }

    /// Есть ли зафиксированный результат броска в этом раунде.
    /// Бланк не финален, пока не исчерпаны перебросы (roll_forfeited).
    pub fn has_final_roll(&self) -> bool {
        self.roll_forfeited
            || self
                .hand
                .as_ref()
                .map(|h| !h.is_blank())
                .unwrap_or(false)
    }
}
