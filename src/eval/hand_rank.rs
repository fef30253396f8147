use serde::{Deserialize, Serialize};

/// Категория руки в чинчиро, по силе.
///
/// Категории взаимоисключающие по построению: три кости либо дают одну из
/// специальных комбинаций, либо пару с синглтоном, либо ничего.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HandCategory {
    /// 1-2-3 — "хифуми", мгновенный проигрыш (но с множителем 2x при расчёте).
    Hifumi,
    /// Ни пары, ни комбинации — "бута". Триггерит правило переброса.
    Blank,
    /// Пара + синглтон. Значение = синглтон (1..=6), оно же "очки".
    Normal(u8),
    /// 4-5-6 — "сигоро", бонусная комбинация.
    Shigoro,
    /// Три одинаковых >= 2 — "араси" (шторм). Значение = какая именно тройка.
    Storm(u8),
    /// 1-1-1 — "пинзоро", старшая рука.
    Pinzoro,
}

impl HandCategory {
    /// Числовой ранг для тотального порядка:
    ///   пинзоро 100 > араси (80+v) > сигоро 70 > пара (10+v) > бута 5 > хифуми 0.
    pub fn rank(&self) -> u8 {
        match self {
            HandCategory::Pinzoro => 100,
            HandCategory::Storm(v) => 80 + v,
            HandCategory::Shigoro => 70,
            HandCategory::Normal(v) => 10 + v,
            HandCategory::Blank => 5,
            HandCategory::Hifumi => 0,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, HandCategory::Blank)
    }

    /// Человеческое название руки для фронта.
    pub fn label(&self) -> String {
        match self {
            HandCategory::Pinzoro => "Пинзоро (1-1-1)".to_string(),
            HandCategory::Storm(v) => format!("Араси ({0}-{0}-{0})", v),
            HandCategory::Shigoro => "Сигоро (4-5-6)".to_string(),
            HandCategory::Normal(v) => format!("Очко {}", v),
            HandCategory::Blank => "Бута (пусто)".to_string(),
            HandCategory::Hifumi => "Хифуми (1-2-3)".to_string(),
        }
    }
}

/// Оценённая рука: категория + ранг + отсортированные кости + подпись.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hand {
    pub category: HandCategory,
    pub rank: u8,
    /// Кости по возрастанию.
    pub dice: [u8; 3],
    pub label: String,
}

impl Hand {
    pub fn from_category(category: HandCategory, sorted_dice: [u8; 3]) -> Self {
        Self {
            category,
            rank: category.rank(),
            dice: sorted_dice,
            label: category.label(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.category.is_blank()
    }
}

/// Множители выплат по категории: (за дилера, за челленджера).
///
/// Хифуми несёт 2x/2x, но применяется только через принудительное
/// сравнение — сама по себе эта рука никогда не выигрывает.
pub fn payout_multipliers(category: HandCategory) -> (i64, i64) {
    match category {
        HandCategory::Pinzoro => (5, 3),
        HandCategory::Storm(_) => (3, 3),
        HandCategory::Shigoro => (2, 2),
        HandCategory::Hifumi => (2, 2),
        HandCategory::Normal(_) | HandCategory::Blank => (1, 1),
    }
}
