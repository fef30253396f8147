//! Реализации пяти хуков по вариантам и чистое разрешение продолжений.

use crate::domain::ParticipantId;
use crate::engine::RandomSource;
use crate::eval::{Hand, HandCategory};

use super::{
    Ability, AbilityChoice, AbilityEffect, AbilityKind, ContinuationKind, DecisionRequest,
    HookOutcome,
};

/// Реплики «Подначки» — чередуются по числу срабатываний.
const TAUNT_LINES: [&str; 3] = [
    "Сегодня кости на моей стороне.",
    "Ставь смелее, всё равно отдашь.",
    "Я слышу, как дрожат твои фишки.",
];

impl Ability {
    /// (a) Начало раунда: максимум реплика, механики нет.
    pub fn on_round_start(&mut self) -> Option<String> {
        match self.kind {
            AbilityKind::Taunt if self.is_usable() => {
                let line = TAUNT_LINES[self.state.uses_spent as usize % TAUNT_LINES.len()];
                self.mark_used();
                Some(line.to_string())
            }
            _ => None,
        }
    }

    /// (b) Перед броском: можно подменить кости целиком или запросить решение.
    pub fn before_roll<R: RandomSource>(&mut self, rng: &mut R) -> HookOutcome {
        if !self.is_usable() {
            return HookOutcome::Pass;
        }
        match self.kind {
            AbilityKind::LoadedDice => HookOutcome::RequiresDecision(DecisionRequest {
                prompt: "Подменить бросок заряженными костями (4-5-6)?".to_string(),
                options: vec!["Использовать".to_string(), "Пропустить".to_string()],
                timeout_secs: self.spec().decision_timeout_secs,
                continuation: ContinuationKind::UseLoadedDice,
            }),
            AbilityKind::FourthDie => {
                // Четыре кости бросаются сразу: участник видит их все,
                // пока решает, какую отбросить.
                let rolled: Vec<u8> = (0..4).map(|_| rng.roll_die()).collect();
                HookOutcome::RequiresDecision(DecisionRequest {
                    prompt: format!("Выпало {:?}. Какую кость отбросить?", rolled),
                    options: rolled.iter().map(|d| format!("Отбросить {}", d)).collect(),
                    timeout_secs: self.spec().decision_timeout_secs,
                    continuation: ContinuationKind::DropDie { rolled },
                })
            }
            _ => HookOutcome::Pass,
        }
    }

    /// (c) После броска: переписать кости, переопределить категорию
    /// или запросить решение.
    pub fn after_roll(&mut self, hand: &Hand) -> HookOutcome {
        if !self.is_usable() {
            return HookOutcome::Pass;
        }
        match self.kind {
            // Переброс предлагаем только на слабом результате. Бута
            // исключена: её и так перебрасывают по правилу стола.
            AbilityKind::SecondChance if hand.rank <= 15 && !hand.is_blank() => {
                HookOutcome::RequiresDecision(DecisionRequest {
                    prompt: format!("Выпало: {}. Перебросить?", hand.label),
                    options: vec!["Перебросить".to_string(), "Оставить".to_string()],
                    timeout_secs: self.spec().decision_timeout_secs,
                    continuation: ContinuationKind::RerollOnce,
                })
            }
            // Бута тихо превращается в пару: младшая кость подгоняется
            // под среднюю, синглтоном остаётся старшая.
            AbilityKind::Tilt if hand.is_blank() => {
                let [_, b, c] = hand.dice;
                HookOutcome::OverrideDice(vec![b, b, c])
            }
            // Хифуми записывается как бута (и уходит в правило переброса).
            AbilityKind::Kawarimi if hand.category == HandCategory::Hifumi => {
                HookOutcome::OverrideHand(HandCategory::Blank)
            }
            _ => HookOutcome::Pass,
        }
    }

    /// (d) Расчёт результата: множитель для стороны владельца.
    /// 1.0 = без эффекта.
    pub fn on_result(&mut self, won: bool, own_hand: &Hand, _opponent: &Hand) -> f64 {
        if !self.is_usable() {
            return 1.0;
        }
        match self.kind {
            AbilityKind::Kabuki if won && own_hand.rank >= 82 => 2.0,
            AbilityKind::Insurance if !won => 0.5,
            _ => 1.0,
        }
    }

    /// (e) Перехват чужого завершённого броска.
    pub fn on_interrupt(&mut self, target: &ParticipantId, target_hand: &Hand) -> HookOutcome {
        if !self.is_usable() {
            return HookOutcome::Pass;
        }
        match self.kind {
            // Снайпить есть смысл только сильную руку.
            AbilityKind::Snipe if target_hand.rank >= 70 => {
                HookOutcome::RequiresDecision(DecisionRequest {
                    prompt: format!(
                        "У {} выпало {}. Щёлкнуть по кости?",
                        target, target_hand.label
                    ),
                    options: vec!["Щёлкнуть".to_string(), "Не вмешиваться".to_string()],
                    timeout_secs: self.spec().decision_timeout_secs,
                    continuation: ContinuationKind::SnipeTarget {
                        target: target.clone(),
                        dice: target_hand.dice.to_vec(),
                    },
                })
            }
            _ => HookOutcome::Pass,
        }
    }
}

/// Чистое разрешение продолжения.
///
/// `fresh_dice` передаёт оркестратор, если выбор явно требует нового
/// броска (RerollOnce + Confirm). Дефолт таймаута — `Decline`.
pub fn resolve_continuation(
    continuation: &ContinuationKind,
    choice: AbilityChoice,
    fresh_dice: Option<Vec<u8>>,
) -> AbilityEffect {
    match continuation {
        ContinuationKind::UseLoadedDice => match choice {
            AbilityChoice::Confirm => AbilityEffect {
                own_dice: Some(vec![4, 5, 6]),
                activated: true,
                ..AbilityEffect::default()
            },
            _ => AbilityEffect::default(),
        },

        ContinuationKind::RerollOnce => match (choice, fresh_dice) {
            (AbilityChoice::Confirm, Some(dice)) => AbilityEffect {
                own_dice: Some(dice),
                activated: true,
                visual: Some("reroll".to_string()),
                ..AbilityEffect::default()
            },
            _ => AbilityEffect::default(),
        },

        ContinuationKind::DropDie { rolled } => {
            // Кости уже брошены — способность потрачена при любом выборе.
            // Дефолт (таймаут/отказ) отбрасывает лишнюю, четвёртую.
            let drop_idx = match choice {
                AbilityChoice::Pick(i) if i < rolled.len() => i,
                _ => rolled.len() - 1,
            };
            let mut kept = rolled.clone();
            kept.remove(drop_idx);
            AbilityEffect {
                own_dice: Some(kept),
                activated: true,
                ..AbilityEffect::default()
            }
        }

        ContinuationKind::SnipeTarget { target, dice } => match choice {
            AbilityChoice::Confirm => {
                // Старшая кость сбивается в единицу.
                let mut new_dice = dice.clone();
                if let Some((idx, _)) = new_dice
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, d)| **d)
                {
                    new_dice[idx] = 1;
                }
                AbilityEffect {
                    target_dice: Some((target.clone(), new_dice)),
                    visual: Some("snipe".to_string()),
                    activated: true,
                    ..AbilityEffect::default()
                }
            }
            _ => AbilityEffect::default(),
        },
    }
}
