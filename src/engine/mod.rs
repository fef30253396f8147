//! Движок сессии: конечный автомат фаз, оркестратор операций,
//! логические таймеры и упорядоченный поток событий.
//!
//! Движок полностью синхронный и детерминированный при фиксированном
//! `RandomSource`: он никогда не спит и не смотрит на часы — все паузы
//! выражены командами таймеров, которые реализует внешний слой
//! (`runtime`), возвращая `timer_fired` обратно в оркестратор.

pub mod errors;
pub mod events;
pub mod orchestrator;
pub mod phase;
pub mod session_manager;
pub mod timers;

pub use errors::EngineError;
pub use events::{ChallengerOutcome, EventScope, Notification, Outbound, RankEntry};
pub use orchestrator::{OpOutput, SessionOrchestrator};
pub use session_manager::{ManagerError, SessionManager};
pub use timers::{TimerCommand, TimerPurpose, TimerToken};

/// Источник случайности — единственная точка недетерминизма движка.
///
/// Продакшен использует системный генератор (`infra::SystemRng`),
/// тесты подставляют скриптованные реализации и получают полностью
/// воспроизводимые партии.
pub trait RandomSource {
    /// Бросок одной кости: 1..=6.
    fn roll_die(&mut self) -> u8;

    /// Равномерный индекс 0..n (n > 0).
    fn pick(&mut self, n: usize) -> usize;

    /// Несмещённая перестановка среза.
    fn shuffle<T>(&mut self, slice: &mut [T]);
}
