//! Движок сессий чинчиро: фазовый автомат раунда, оценка рук,
//! система способностей с журналом скрытых активаций и обвинениями.
//!
//! Архитектура в два слоя:
//! - синхронное ядро (`domain`, `eval`, `ability`, `arbitration`,
//!   `engine`) — детерминированное при фиксированном `RandomSource`,
//!   никогда не спит и не смотрит на часы;
//! - асинхронная обвязка (`runtime`) — актор на tokio, который
//!   сериализует команды, реализует логические таймеры и разносит
//!   события подписчикам.
//!
//! Транспорт (websocket и т.п.) в крейт не входит: наружу смотрят
//! только `api::Command`, DTO-снимки и события `engine::Notification`.

pub mod ability;
pub mod api;
pub mod arbitration;
pub mod domain;
pub mod engine;
pub mod eval;
pub mod infra;
pub mod runtime;

pub use ability::{Ability, AbilityChoice, AbilityKind};
pub use api::{ApiError, Command, SessionViewDto};
pub use domain::{Chips, Participant, ParticipantId, RoomCode, RoundNo, Session, SessionConfig};
pub use engine::{
    EngineError, Notification, Outbound, RandomSource, SessionManager, SessionOrchestrator,
};
pub use eval::{evaluate, Hand, HandCategory};
pub use infra::{DeterministicRng, SystemRng};
pub use runtime::EngineHandle;
