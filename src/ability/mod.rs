//! Протокол способностей: пять хуков с no-op умолчаниями, учёт
//! использований/кулдаунов и явные продолжения для решений человека.
//!
//! Способность — закрытое множество вариантов (`AbilityKind`) плюс её
//! изменяемое состояние. Диспетчеризация идёт по самому варианту, без
//! интроспекции типов. Запрос решения никогда не захватывает живых
//! ссылок: хук возвращает тегированное продолжение (`ContinuationKind`),
//! а результат решения считает чистая функция `resolve_continuation`.

pub mod catalog;
pub mod hooks;
pub mod kinds;

pub use catalog::AbilityCatalog;
pub use hooks::resolve_continuation;
pub use kinds::{AbilityKind, AbilitySpec, UseLimit, ALL_ABILITY_KINDS};

use serde::{Deserialize, Serialize};

use crate::domain::ParticipantId;
use crate::eval::HandCategory;

/// Изменяемое состояние одного экземпляра способности.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AbilityState {
    /// Сколько раз способность уже сработала.
    pub uses_spent: u8,
    /// Сколько раундов осталось до готовности (0 = готова).
    pub cooldown_left: u8,
}

/// Экземпляр способности, выданный участнику на игру.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ability {
    pub kind: AbilityKind,
    pub state: AbilityState,
}

impl Ability {
    pub fn new(kind: AbilityKind) -> Self {
        Self {
            kind,
            state: AbilityState::default(),
        }
    }

    pub fn spec(&self) -> AbilitySpec {
        self.kind.spec()
    }

    /// Готова ли способность к срабатыванию:
    /// кулдаун нулевой и лимит использований не исчерпан.
    pub fn is_usable(&self) -> bool {
        if self.state.cooldown_left > 0 {
            return false;
        }
        match self.spec().uses {
            UseLimit::Unlimited => true,
            UseLimit::Limited(n) => self.state.uses_spent < n,
        }
    }

    /// Зафиксировать срабатывание: счётчик вверх, кулдаун заново.
    pub fn mark_used(&mut self) {
        self.state.uses_spent = self.state.uses_spent.saturating_add(1);
        self.state.cooldown_left = self.spec().cooldown_rounds;
    }

    /// Тик кулдауна на границе раунда.
    pub fn tick_cooldown(&mut self) {
        if self.state.cooldown_left > 0 {
            self.state.cooldown_left -= 1;
        }
    }
}

/// Результат вызова хука.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookOutcome {
    /// Хук ничего не делает (умолчание для всех точек).
    Pass,
    /// Полностью заменить кости владельца (до или после оценки).
    OverrideDice(Vec<u8>),
    /// Переопределить категорию уже оценённого броска.
    OverrideHand(HandCategory),
    /// Требуется решение человека — конвейер приостанавливается.
    RequiresDecision(DecisionRequest),
}

/// Запрос решения: что показать и как продолжить.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionRequest {
    /// Текст для решающего участника.
    pub prompt: String,
    /// Структурированные варианты выбора (для кнопок фронта).
    pub options: Vec<String>,
    /// Таймаут решения, сек. None = таймаут из конфига сессии.
    pub timeout_secs: Option<u64>,
    /// Тегированное продолжение.
    pub continuation: ContinuationKind,
}

/// Явное продолжение отложенного решения.
///
/// Вместо замыкания, захваченного посреди конвейера, храним данные:
/// чистая функция `resolve_continuation` по ним и выбору участника
/// вычисляет эффект.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContinuationKind {
    /// Подменить бросок заряженными костями (да/нет).
    UseLoadedDice,
    /// Перебросить только что выпавший результат (да/нет).
    /// "Да" требует свежих костей от оркестратора.
    RerollOnce,
    /// Брошены четыре кости — выбрать, какую отбросить (индекс).
    DropDie { rolled: Vec<u8> },
    /// Щёлкнуть по кости участника `target` (да/нет).
    /// `dice` — снимок костей цели на момент запроса, чтобы продолжение
    /// не зависело от живого состояния.
    SnipeTarget {
        target: ParticipantId,
        dice: Vec<u8>,
    },
}

/// Выбор участника (или дефолт по таймауту).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AbilityChoice {
    /// Подтвердить использование.
    Confirm,
    /// Отказаться / оставить как есть. Это же — дефолт таймаута.
    Decline,
    /// Выбор по индексу (для вариантов с перечнем).
    Pick(usize),
}

/// Итоговый эффект решённого продолжения.
///
/// Все поля опциональны: пустой эффект = "ничего не произошло".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbilityEffect {
    /// Заменить кости владельца (None = владелец бросает/оставляет сам).
    pub own_dice: Option<Vec<u8>>,
    /// Заменить кости другого участника (переоценить и разослать).
    pub target_dice: Option<(ParticipantId, Vec<u8>)>,
    /// Чисто косметический эффект для фронта.
    pub visual: Option<String>,
    /// Сработала ли способность по существу (для учёта использований
    /// и записи covert-активаций в журнал).
    pub activated: bool,
}
