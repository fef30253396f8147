use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;

/// Лимит использований способности за игру.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum UseLimit {
    Unlimited,
    Limited(u8),
}

/// Закрытое множество способностей.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Заряженные кости: подменить свой бросок на 4-5-6. Скрытая.
    LoadedDice,
    /// Второй шанс: перебросить слабый результат по решению владельца.
    SecondChance,
    /// Снайпер: щёлкнуть по кости чужого завершённого броска. Скрытая.
    Snipe,
    /// Кабуки: при победе с араси и выше — выплата x2. Пассивная.
    Kabuki,
    /// Страховка: при проигрыше потеря режется вдвое. Пассивная.
    Insurance,
    /// Подначка: реплика в начале раунда, без механики. Пассивная.
    Taunt,
    /// Подкрутка: бута тихо превращается в пару. Скрытая, пассивная.
    Tilt,
    /// Четвёртая кость: бросить 4 кости и отбросить одну по выбору.
    FourthDie,
    /// Каварими: хифуми тихо записывается как бута. Скрытая, пассивная.
    Kawarimi,
}

/// Все зарегистрированные способности (порядок = порядок в каталоге).
pub const ALL_ABILITY_KINDS: [AbilityKind; 9] = [
    AbilityKind::LoadedDice,
    AbilityKind::SecondChance,
    AbilityKind::Snipe,
    AbilityKind::Kabuki,
    AbilityKind::Insurance,
    AbilityKind::Taunt,
    AbilityKind::Tilt,
    AbilityKind::FourthDie,
    AbilityKind::Kawarimi,
];

/// Статическое описание способности.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbilitySpec {
    /// Стабильный строковый идентификатор (ключ журнала обвинений).
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Скрытая: активация пишется в журнал и может быть оспорена.
    pub covert: bool,
    /// Пассивная: срабатывает сама, без явной активации.
    pub passive: bool,
    pub uses: UseLimit,
    /// Кулдаун в раундах после срабатывания.
    pub cooldown_rounds: u8,
    /// Штраф при уличении (None = дефолт из конфига сессии).
    pub cheat_penalty: Option<Chips>,
    /// Свой таймаут решения (None = дефолт из конфига сессии).
    pub decision_timeout_secs: Option<u64>,
}

impl AbilityKind {
    pub fn spec(&self) -> AbilitySpec {
        match self {
            AbilityKind::LoadedDice => AbilitySpec {
                id: "loaded_dice",
                name: "Заряженные кости",
                description: "Один раз за игру подменить свой бросок на 4-5-6.",
                covert: true,
                passive: false,
                uses: UseLimit::Limited(1),
                cooldown_rounds: 0,
                cheat_penalty: Some(Chips(3_000)),
                decision_timeout_secs: Some(10),
            },
            AbilityKind::SecondChance => AbilitySpec {
                id: "second_chance",
                name: "Второй шанс",
                description: "Перебросить слабый результат. Два заряда, кулдаун раунд.",
                covert: false,
                passive: false,
                uses: UseLimit::Limited(2),
                cooldown_rounds: 1,
                cheat_penalty: None,
                decision_timeout_secs: Some(10),
            },
            AbilityKind::Snipe => AbilitySpec {
                id: "snipe",
                name: "Снайпер",
                description: "Сбить старшую кость чужого сильного броска.",
                covert: true,
                passive: false,
                uses: UseLimit::Limited(1),
                cooldown_rounds: 0,
                cheat_penalty: Some(Chips(2_500)),
                decision_timeout_secs: Some(8),
            },
            AbilityKind::Kabuki => AbilitySpec {
                id: "kabuki",
                name: "Кабуки",
                description: "Победа с араси и выше платит вдвое.",
                covert: false,
                passive: true,
                uses: UseLimit::Unlimited,
                cooldown_rounds: 2,
                cheat_penalty: None,
                decision_timeout_secs: None,
            },
            AbilityKind::Insurance => AbilitySpec {
                id: "insurance",
                name: "Страховка",
                description: "Проигрыш режется вдвое.",
                covert: false,
                passive: true,
                uses: UseLimit::Unlimited,
                cooldown_rounds: 1,
                cheat_penalty: None,
                decision_timeout_secs: None,
            },
            AbilityKind::Taunt => AbilitySpec {
                id: "taunt",
                name: "Подначка",
                description: "Реплика в начале раунда. Механики нет.",
                covert: false,
                passive: true,
                uses: UseLimit::Unlimited,
                cooldown_rounds: 0,
                cheat_penalty: None,
                decision_timeout_secs: None,
            },
            AbilityKind::Tilt => AbilitySpec {
                id: "tilt",
                name: "Подкрутка",
                description: "Пустой бросок тихо становится парой.",
                covert: true,
                passive: true,
                uses: UseLimit::Limited(2),
                cooldown_rounds: 1,
                cheat_penalty: Some(Chips(1_500)),
                decision_timeout_secs: None,
            },
            AbilityKind::FourthDie => AbilitySpec {
                id: "fourth_die",
                name: "Четвёртая кость",
                description: "Бросить четыре кости и отбросить одну.",
                covert: false,
                passive: false,
                uses: UseLimit::Limited(1),
                cooldown_rounds: 0,
                cheat_penalty: None,
                decision_timeout_secs: Some(12),
            },
            AbilityKind::Kawarimi => AbilitySpec {
                id: "kawarimi",
                name: "Каварими",
                description: "Хифуми тихо записывается как бута.",
                covert: true,
                passive: true,
                uses: UseLimit::Limited(1),
                cooldown_rounds: 0,
                cheat_penalty: None,
                decision_timeout_secs: None,
            },
        }
    }

    /// Найти способность по строковому id (обратная сторона `spec().id`).
    pub fn from_id(id: &str) -> Option<AbilityKind> {
        ALL_ABILITY_KINDS.iter().copied().find(|k| k.spec().id == id)
    }
}
