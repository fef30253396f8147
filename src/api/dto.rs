use serde::{Deserialize, Serialize};

use crate::domain::session::{Phase, Session};
use crate::domain::{Participant, ParticipantId, RoomCode, RoundNo};
use crate::eval::{Hand, HandCategory};

/// DTO руки для фронта.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandDto {
    pub category: HandCategory,
    pub rank: u8,
    pub dice: Vec<u8>,
    pub label: String,
}

pub fn hand_to_dto(hand: &Hand) -> HandDto {
    HandDto {
        category: hand.category,
        rank: hand.rank,
        dice: hand.dice.to_vec(),
        label: hand.label.clone(),
    }
}

/// DTO участника.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantDto {
    pub participant_id: ParticipantId,
    pub name: String,
    pub connected: bool,
    pub balance: i64,
    pub wager: i64,
    pub dice: Vec<u8>,
    pub hand: Option<HandDto>,
    pub is_dealer: bool,
    /// Идентификатор способности — только для самого участника
    /// (режим "героя"), чужие способности скрыты.
    pub ability_id: Option<String>,
    pub reroll_attempts: u8,
    pub final_rank: Option<u32>,
}

/// Собрать DTO участника. `is_hero` открывает способность.
pub fn participant_to_dto(p: &Participant, is_hero: bool) -> ParticipantDto {
    ParticipantDto {
        participant_id: p.id.clone(),
        name: p.name.clone(),
        connected: p.connected,
        balance: p.balance.0,
        wager: p.wager.0,
        dice: p.dice.clone(),
        hand: p.hand.as_ref().map(hand_to_dto),
        is_dealer: p.is_dealer,
        ability_id: if is_hero {
            p.ability.as_ref().map(|a| a.spec().id.to_string())
        } else {
            None
        },
        reroll_attempts: p.reroll_attempts,
        final_rank: p.final_rank,
    }
}

/// Ростер в порядке бросков, способности скрыты (для broadcast-событий).
pub fn build_roster(session: &Session) -> Vec<ParticipantDto> {
    session
        .roll_order
        .iter()
        .filter_map(|id| session.participants.get(id))
        .map(|p| participant_to_dto(p, false))
        .collect()
}

/// Снимок сессии для внешних наблюдателей (read-only).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionViewDto {
    pub code: RoomCode,
    pub phase: Phase,
    pub round: RoundNo,
    pub set_count: u32,
    pub dealer_id: Option<ParticipantId>,
    pub roll_order: Vec<ParticipantId>,
    pub participants: Vec<ParticipantDto>,
    /// Кто сейчас принимает решение по способности (если конвейер стоит).
    pub deciding: Option<ParticipantId>,
}

/// Собрать снимок сессии. Внешние слои мутировать состояние не могут —
/// только читать такие снимки.
pub fn build_session_view(session: &Session) -> SessionViewDto {
    SessionViewDto {
        code: session.code.clone(),
        phase: session.phase,
        round: session.round,
        set_count: session.set_count,
        dealer_id: session.dealer_id().cloned(),
        roll_order: session.roll_order.clone(),
        participants: build_roster(session),
        deciding: session.pending.as_ref().map(|p| p.participant_id.clone()),
    }
}
