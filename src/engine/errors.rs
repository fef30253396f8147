use thiserror::Error;

use crate::domain::session::Phase;
use crate::domain::{ParticipantId, RoomCode};
use crate::eval::EvalError;

/// Ошибки движка сессии.
///
/// Все они синхронные отказы: состояние сессии при ошибке не меняется.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    // --- ошибки валидации входа ---
    #[error("Комната {0} не найдена")]
    SessionNotFound(RoomCode),

    #[error("Участник {0} не найден в сессии")]
    ParticipantNotFound(ParticipantId),

    #[error("Комната заполнена")]
    SessionFull,

    #[error("Участник {0} уже в комнате")]
    AlreadyJoined(ParticipantId),

    #[error("Ставка {amount} вне лимитов стола ({min}..={max})")]
    WagerOutOfRange { amount: i64, min: i64, max: i64 },

    #[error("Нужно указать цель обвинения")]
    MissingTarget,

    #[error("Нельзя обвинить самого себя")]
    SelfAccusation,

    // --- ошибки состояния ---
    #[error("Операция недоступна в фазе {0:?}")]
    WrongPhase(Phase),

    #[error("Недостаточно участников для старта (нужно минимум 2)")]
    NotEnoughParticipants,

    #[error("Стартовать игру может только создатель комнаты")]
    NotHost,

    #[error("Дилер не делает ставок")]
    DealerCannotWager,

    #[error("Ставка в этом раунде уже сделана")]
    AlreadyWagered,

    #[error("Сейчас не очередь участника {0}")]
    NotYourTurn(ParticipantId),

    #[error("Бросок в этом раунде уже зафиксирован")]
    AlreadyRolled,

    #[error("Нет отложенного решения")]
    NoPendingDecision,

    #[error("Отложенное решение принадлежит другому участнику")]
    DecisionNotYours,

    #[error("Обвинения принимаются только в окне после броска")]
    NotInInterruptWindow,

    // --- внутренние ---
    #[error("Ошибка оценки броска: {0}")]
    Eval(#[from] EvalError),

    #[error("Внутренняя ошибка: {0}")]
    Internal(&'static str),
}
