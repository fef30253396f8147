//! Асинхронная обвязка движка.
//!
//! Движок синхронный; всё время и вся конкурентность живут здесь:
//! единственный актор сериализует команды и выстрелы таймеров, tokio
//! реализует логические таймеры, broadcast-канал разносит события.

pub mod service;

pub use service::{spawn, EngineHandle, OutboundEnvelope};
