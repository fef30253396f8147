//! Внешняя поверхность: команды, DTO-снимки и проводные ошибки.
//!
//! Правило слоя: наружу уходят только DTO и события, внутрь приходят
//! только команды. Прямого доступа к `Session` у внешнего кода нет.

pub mod commands;
pub mod dto;
pub mod errors;

pub use commands::Command;
pub use dto::{build_roster, build_session_view, SessionViewDto};
pub use errors::{ApiError, ErrorDto};

use crate::domain::RoomCode;
use crate::engine::{Outbound, TimerCommand};

/// Результат выполнения команды.
///
/// События и команды таймеров исполняет runtime-слой; `view` заполняется
/// только для команд, которые по смыслу возвращают снимок.
#[derive(Debug)]
pub struct Reply {
    pub code: RoomCode,
    pub events: Vec<Outbound>,
    pub timers: Vec<TimerCommand>,
    pub view: Option<SessionViewDto>,
}

impl Reply {
    pub fn empty(code: RoomCode) -> Self {
        Self {
            code,
            events: Vec::new(),
            timers: Vec::new(),
            view: None,
        }
    }
}
