//! Инфраструктура: источники случайности и генерация кодов комнат.

pub mod codes;
pub mod rng;

pub use rng::{DeterministicRng, SystemRng};
