//! Обвинения и арбитраж: журнал скрытых активаций и их разбор.

pub mod ledger;

pub use ledger::{AccusationLedger, AccusationVerdict, CheatRecord};
