use serde::{Deserialize, Serialize};

use crate::api::dto::{HandDto, ParticipantDto};
use crate::arbitration::CheatRecord;
use crate::domain::{ParticipantId, RoundNo};

/// Кому адресовано событие.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventScope {
    /// Всем участникам сессии.
    Broadcast,
    /// Конкретному участнику.
    To(ParticipantId),
}

/// Событие с адресом. Порядок событий строго соответствует порядку
/// операций, которые их породили, — транспорт обязан его сохранять.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub scope: EventScope,
    pub event: Notification,
}

impl Outbound {
    pub fn broadcast(event: Notification) -> Self {
        Self {
            scope: EventScope::Broadcast,
            event,
        }
    }

    pub fn to(id: ParticipantId, event: Notification) -> Self {
        Self {
            scope: EventScope::To(id),
            event,
        }
    }
}

/// Результат одного не-дилера в раунде.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengerOutcome {
    pub participant_id: ParticipantId,
    pub hand: Option<HandDto>,
    pub won: bool,
    /// Сколько фишек ушло (положительное = выигрыш челленджера).
    pub transfer: i64,
}

/// Строка итогового рейтинга.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankEntry {
    pub participant_id: ParticipantId,
    pub name: String,
    pub balance: i64,
    pub rank: u32,
}

/// Уведомления для транспортного слоя.
///
/// Имена событий и полей — поверхность совместимости: презентационная
/// логика переключается по ним, менять нельзя.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Notification {
    PlayerJoined {
        participant: ParticipantDto,
        roster: Vec<ParticipantDto>,
    },
    PlayerLeft {
        participant_id: ParticipantId,
        roster: Vec<ParticipantDto>,
    },
    GameStarted {
        roll_order: Vec<ParticipantId>,
        roster: Vec<ParticipantDto>,
    },
    /// Адресное: какая способность досталась (чужие скрыты).
    AbilityAssigned {
        ability_id: String,
        name: String,
        description: String,
    },
    RoundStarted {
        round: RoundNo,
        dealer_id: ParticipantId,
        roster: Vec<ParticipantDto>,
    },
    BetPlaced {
        participant_id: ParticipantId,
        amount: i64,
        /// Сколько ставок ещё не сделано.
        remaining: usize,
    },
    /// Предшествует результату броска — для тайминга анимации.
    RollingStarted {
        participant_id: ParticipantId,
    },
    DiceRolled {
        participant_id: ParticipantId,
        dice: Vec<u8>,
        hand: HandDto,
        /// Косметический эффект способности, если была.
        effect: Option<String>,
        can_reroll: bool,
        reroll_attempts: u8,
    },
    /// Адресному — prompt/options, остальным — только кто решает.
    WaitingForAction {
        participant_id: ParticipantId,
        prompt: Option<String>,
        options: Option<Vec<String>>,
        timeout_secs: u64,
    },
    DiceUpdated {
        participant_id: ParticipantId,
        dice: Vec<u8>,
        hand: HandDto,
        reason: String,
    },
    VisualEffect {
        participant_id: ParticipantId,
        effect: String,
    },
    SkillVisualEffect {
        participant_id: ParticipantId,
        skill_id: String,
        effect: String,
    },
    InterruptWindowOpen {
        participant_id: ParticipantId,
        window_secs: u64,
    },
    InterruptWindowClosed {
        participant_id: ParticipantId,
    },
    DoubtResult {
        accuser_id: ParticipantId,
        target_id: ParticipantId,
        success: bool,
        penalty: i64,
        reward: i64,
        roster: Vec<ParticipantDto>,
    },
    RoundResult {
        round: RoundNo,
        dealer_id: ParticipantId,
        dealer_hand: Option<HandDto>,
        results: Vec<ChallengerOutcome>,
        roster: Vec<ParticipantDto>,
    },
    SetCompleted {
        set_count: u32,
        bonus: i64,
        roster: Vec<ParticipantDto>,
    },
    PlayersBankrupt {
        participant_ids: Vec<ParticipantId>,
    },
    GameEnded {
        ranking: Vec<RankEntry>,
        ledger: Vec<CheatRecord>,
    },
    ReturnedToLobby {
        roster: Vec<ParticipantDto>,
    },
    GameReset {
        roster: Vec<ParticipantDto>,
    },
}
