//! Доменная модель чинчиро: фишки, кости, участники, сессия, конфиг.

pub mod chips;
pub mod config;
pub mod participant;
pub mod session;

// Базовые идентификаторы. Участников идентифицирует транспортный слой
// (socket -> id), поэтому id — строка, а не внутренний счётчик.
pub type ParticipantId = String;
/// Короткий код комнаты, который человек может набрать руками.
pub type RoomCode = String;
/// Номер раунда внутри одной игры (с 1).
pub type RoundNo = u32;

// Удобные реэкспорты, чтобы в других модулях писать crate::domain::Chips и т.п.
pub use chips::*;
pub use config::*;
pub use participant::*;
pub use session::*;
