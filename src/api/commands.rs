//! Команды транспортного протокола.
//!
//! Транспорт (websocket и т.п.) десериализует входящие сообщения в
//! `Command` и передаёт их runtime-слою как есть; движок транспортных
//! деталей не знает.

use serde::{Deserialize, Serialize};

use crate::ability::AbilityChoice;
use crate::domain::config::SessionConfig;
use crate::domain::{ParticipantId, RoomCode, RoundNo};

/// Команда клиента.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Command {
    /// Создать комнату; создатель сразу входит хостом.
    CreateSession {
        participant_id: ParticipantId,
        name: String,
        /// None = стандартные правила стола.
        config: Option<SessionConfig>,
    },
    Join {
        code: RoomCode,
        participant_id: ParticipantId,
        name: String,
    },
    Leave {
        code: RoomCode,
        participant_id: ParticipantId,
    },
    StartGame {
        code: RoomCode,
        participant_id: ParticipantId,
    },
    PlaceWager {
        code: RoomCode,
        participant_id: ParticipantId,
        amount: i64,
    },
    RollDice {
        code: RoomCode,
        participant_id: ParticipantId,
    },
    ResolveDecision {
        code: RoomCode,
        participant_id: ParticipantId,
        choice: AbilityChoice,
    },
    Accuse {
        code: RoomCode,
        participant_id: ParticipantId,
        target_id: Option<ParticipantId>,
        /// None = текущий раунд.
        round: Option<RoundNo>,
    },
    /// Снимок сессии (read-only).
    GetView { code: RoomCode },
}

impl Command {
    /// Код комнаты, к которой относится команда (None для создания).
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Command::CreateSession { .. } => None,
            Command::Join { code, .. }
            | Command::Leave { code, .. }
            | Command::StartGame { code, .. }
            | Command::PlaceWager { code, .. }
            | Command::RollDice { code, .. }
            | Command::ResolveDecision { code, .. }
            | Command::Accuse { code, .. }
            | Command::GetView { code } => Some(code),
        }
    }
}
