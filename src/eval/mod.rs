//! Оценка броска: категория руки, ранг, сравнение, множители выплат.
//!
//! Всё здесь — чистые функции без состояния. Контракт: ровно три кости
//! со значениями 1..=6; количество гарантирует вызывающий код.

pub mod evaluator;
pub mod hand_rank;

pub use evaluator::{compare_hands, evaluate, Comparison, EvalError};
pub use hand_rank::{payout_multipliers, Hand, HandCategory};
