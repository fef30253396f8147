//! Ошибки внешней поверхности и их проекция на провод.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::session_manager::ManagerError;
use crate::engine::EngineError;

/// Ошибка обработки команды.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Manager(#[from] ManagerError),

    /// Актор движка завершился — процесс в стадии остановки.
    #[error("Движок недоступен")]
    EngineGone,
}

impl ApiError {
    /// Стабильный машинный код ошибки для клиента.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Engine(e) => match e {
                EngineError::SessionNotFound(_) => "session_not_found",
                EngineError::ParticipantNotFound(_) => "participant_not_found",
                EngineError::SessionFull => "session_full",
                EngineError::AlreadyJoined(_) => "already_joined",
                EngineError::WagerOutOfRange { .. } => "wager_out_of_range",
                EngineError::MissingTarget => "missing_target",
                EngineError::SelfAccusation => "self_accusation",
                EngineError::WrongPhase(_) => "wrong_phase",
                EngineError::NotEnoughParticipants => "not_enough_participants",
                EngineError::NotHost => "not_host",
                EngineError::DealerCannotWager => "dealer_cannot_wager",
                EngineError::AlreadyWagered => "already_wagered",
                EngineError::NotYourTurn(_) => "not_your_turn",
                EngineError::AlreadyRolled => "already_rolled",
                EngineError::NoPendingDecision => "no_pending_decision",
                EngineError::DecisionNotYours => "decision_not_yours",
                EngineError::NotInInterruptWindow => "not_in_interrupt_window",
                EngineError::Eval(_) => "eval_error",
                EngineError::Internal(_) => "internal",
            },
            ApiError::Manager(e) => match e {
                ManagerError::CodeTaken(_) => "code_taken",
                ManagerError::NotFound(_) => "session_not_found",
            },
            ApiError::EngineGone => "engine_gone",
        }
    }

    pub fn to_wire(&self) -> ErrorDto {
        ErrorDto {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Проводное представление ошибки.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDto {
    pub code: String,
    pub message: String,
}
