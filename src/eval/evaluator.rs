use thiserror::Error;

use super::hand_rank::{Hand, HandCategory};

/// Нарушение входного контракта оценки.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("Оценка ожидает ровно 3 кости, получено {0}")]
    WrongDiceCount(usize),

    #[error("Недопустимое значение кости: {0} (ожидается 1..=6)")]
    DieOutOfRange(u8),
}

/// Главная функция: три кости -> категория руки.
///
/// Порядок проверок важен только для читаемости — категории
/// взаимоисключающие, первое совпадение и есть ответ:
///   1-2-3 -> хифуми; 4-5-6 -> сигоро; 1-1-1 -> пинзоро;
///   тройка >=2 -> араси; пара -> очко синглтона; иначе бута.
pub fn evaluate(dice: &[u8]) -> Result<Hand, EvalError> {
    if dice.len() != 3 {
        return Err(EvalError::WrongDiceCount(dice.len()));
    }
    for &d in dice {
        if !(1..=6).contains(&d) {
            return Err(EvalError::DieOutOfRange(d));
        }
    }

    let mut sorted = [dice[0], dice[1], dice[2]];
    sorted.sort_unstable();
    let [a, b, c] = sorted;

    let category = if sorted == [1, 2, 3] {
        HandCategory::Hifumi
    } else if sorted == [4, 5, 6] {
        HandCategory::Shigoro
    } else if sorted == [1, 1, 1] {
        HandCategory::Pinzoro
    } else if a == b && b == c {
        HandCategory::Storm(a)
    } else if a == b {
        HandCategory::Normal(c)
    } else if b == c {
        HandCategory::Normal(a)
    } else {
        HandCategory::Blank
    };

    Ok(Hand::from_category(category, sorted))
}

/// Результат сравнения двух рук ("челленджер" против "дома").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// Дом (дилер) выиграл.
    HouseWins,
    /// Челленджер выиграл.
    ChallengerWins,
    /// Победитель не объявлен: одна из сторон должна перебросить.
    NeedsReroll {
        challenger: bool,
        house: bool,
    },
}

/// Сравнение рук.
///
/// `forced = false`: бута у любой стороны -> победителя нет, эту сторону
/// помечаем на переброс. `forced = true`: сравниваем ранги напрямую,
/// при равенстве выигрывает дом (дилерское преимущество).
pub fn compare_hands(challenger: &Hand, house: &Hand, forced: bool) -> Comparison {
    if !forced && (challenger.is_blank() || house.is_blank()) {
        return Comparison::NeedsReroll {
            challenger: challenger.is_blank(),
            house: house.is_blank(),
        };
    }

    if challenger.rank > house.rank {
        Comparison::ChallengerWins
    } else {
        // Ничья по рангу тоже уходит дому.
        Comparison::HouseWins
    }
}
