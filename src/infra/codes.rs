//! Генерация кодов комнат.

use crate::domain::RoomCode;
use crate::engine::RandomSource;

/// Алфавит без визуально похожих символов (0/O, 1/I/L).
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Длина кода комнаты.
pub const CODE_LEN: usize = 6;

/// Сгенерировать код комнаты. Уникальность обеспечивает реестр:
/// при коллизии код просто генерируется заново.
pub fn generate<R: RandomSource>(rng: &mut R) -> RoomCode {
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.pick(ALPHABET.len())] as char)
        .collect()
}

/// Валиден ли введённый руками код.
pub fn is_valid(code: &str) -> bool {
    code.len() == CODE_LEN
        && code
            .bytes()
            .all(|b| ALPHABET.contains(&b.to_ascii_uppercase()))
}

/// Нормализация пользовательского ввода: регистр не важен.
pub fn normalize(code: &str) -> RoomCode {
    code.trim().to_ascii_uppercase()
}
