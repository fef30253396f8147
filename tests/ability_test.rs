//! Система способностей: хуки, продолжения, лимиты, каталог.

mod common;

use chinchiro_engine::ability::{
    resolve_continuation, Ability, AbilityCatalog, AbilityChoice, AbilityKind, ContinuationKind,
    HookOutcome, ALL_ABILITY_KINDS,
};
use chinchiro_engine::eval::{evaluate, HandCategory};

use common::ScriptedRng;

#[test]
fn taunt_rotates_lines() {
    let mut taunt = Ability::new(AbilityKind::Taunt);
    let first = taunt.on_round_start().expect("реплика есть");
    let second = taunt.on_round_start().expect("реплика есть");
    assert_ne!(first, second);

    // Без механики: остальные хуки молчат.
    let hand = evaluate(&[2, 2, 5]).unwrap();
    assert_eq!(taunt.after_roll(&hand), HookOutcome::Pass);
}

#[test]
fn loaded_dice_asks_before_roll() {
    let mut ability = Ability::new(AbilityKind::LoadedDice);
    let mut rng = ScriptedRng::new();

    match ability.before_roll(&mut rng) {
        HookOutcome::RequiresDecision(req) => {
            assert_eq!(req.continuation, ContinuationKind::UseLoadedDice);
            assert_eq!(req.timeout_secs, Some(10));
        }
        other => panic!("ожидалось решение, получено {:?}", other),
    }

    // Единственный заряд: после срабатывания хук молчит.
    ability.mark_used();
    assert_eq!(ability.before_roll(&mut rng), HookOutcome::Pass);
}

#[test]
fn fourth_die_rolls_four_and_asks_which_to_drop() {
    let mut ability = Ability::new(AbilityKind::FourthDie);
    let mut rng = ScriptedRng::with_rolls(&[6, 1, 3, 3]);

    match ability.before_roll(&mut rng) {
        HookOutcome::RequiresDecision(req) => {
            assert_eq!(
                req.continuation,
                ContinuationKind::DropDie {
                    rolled: vec![6, 1, 3, 3],
                }
            );
            assert_eq!(req.options.len(), 4);
        }
        other => panic!("ожидалось решение, получено {:?}", other),
    }
}

#[test]
fn second_chance_offers_reroll_only_on_weak_hands() {
    let mut ability = Ability::new(AbilityKind::SecondChance);

    let weak = evaluate(&[2, 2, 1]).unwrap(); // очко 1
    assert!(matches!(
        ability.after_roll(&weak),
        HookOutcome::RequiresDecision(_)
    ));

    let strong = evaluate(&[3, 3, 6]).unwrap(); // очко 6
    assert_eq!(ability.after_roll(&strong), HookOutcome::Pass);

    // Бута перебрасывается по правилу стола, способность не тратим.
    let blank = evaluate(&[2, 4, 6]).unwrap();
    assert_eq!(ability.after_roll(&blank), HookOutcome::Pass);
}

#[test]
fn tilt_turns_blank_into_pair() {
    let mut ability = Ability::new(AbilityKind::Tilt);
    let blank = evaluate(&[6, 2, 4]).unwrap();

    match ability.after_roll(&blank) {
        HookOutcome::OverrideDice(dice) => {
            assert_eq!(dice, vec![4, 4, 6]);
            assert_eq!(
                evaluate(&dice).unwrap().category,
                HandCategory::Normal(6)
            );
        }
        other => panic!("ожидалась подмена костей, получено {:?}", other),
    }

    let pair = evaluate(&[2, 2, 5]).unwrap();
    assert_eq!(ability.after_roll(&pair), HookOutcome::Pass);
}

#[test]
fn kawarimi_downgrades_hifumi_to_blank() {
    let mut ability = Ability::new(AbilityKind::Kawarimi);
    let hifumi = evaluate(&[1, 2, 3]).unwrap();
    assert_eq!(
        ability.after_roll(&hifumi),
        HookOutcome::OverrideHand(HandCategory::Blank)
    );
}

#[test]
fn kabuki_doubles_strong_wins_only() {
    let mut ability = Ability::new(AbilityKind::Kabuki);
    let storm = evaluate(&[4, 4, 4]).unwrap();
    let pair = evaluate(&[2, 2, 5]).unwrap();

    assert_eq!(ability.on_result(true, &storm, &pair), 2.0);
    assert_eq!(ability.on_result(true, &pair, &storm), 1.0);
    assert_eq!(ability.on_result(false, &storm, &pair), 1.0);
    // Сигоро (70) ниже порога араси.
    let shigoro = evaluate(&[4, 5, 6]).unwrap();
    assert_eq!(ability.on_result(true, &shigoro, &pair), 1.0);
}

#[test]
fn insurance_halves_losses() {
    let mut ability = Ability::new(AbilityKind::Insurance);
    let pair = evaluate(&[2, 2, 5]).unwrap();
    let storm = evaluate(&[4, 4, 4]).unwrap();

    assert_eq!(ability.on_result(false, &pair, &storm), 0.5);
    assert_eq!(ability.on_result(true, &storm, &pair), 1.0);
}

#[test]
fn snipe_targets_only_strong_rolls() {
    let mut ability = Ability::new(AbilityKind::Snipe);
    let target = "жертва".to_string();

    let shigoro = evaluate(&[4, 5, 6]).unwrap();
    match ability.on_interrupt(&target, &shigoro) {
        HookOutcome::RequiresDecision(req) => {
            assert_eq!(
                req.continuation,
                ContinuationKind::SnipeTarget {
                    target: target.clone(),
                    dice: vec![4, 5, 6],
                }
            );
        }
        other => panic!("ожидалось решение, получено {:?}", other),
    }

    let pair = evaluate(&[2, 2, 5]).unwrap();
    assert_eq!(ability.on_interrupt(&target, &pair), HookOutcome::Pass);
}

#[test]
fn continuation_loaded_dice() {
    let confirmed =
        resolve_continuation(&ContinuationKind::UseLoadedDice, AbilityChoice::Confirm, None);
    assert_eq!(confirmed.own_dice, Some(vec![4, 5, 6]));
    assert!(confirmed.activated);

    let declined =
        resolve_continuation(&ContinuationKind::UseLoadedDice, AbilityChoice::Decline, None);
    assert_eq!(declined.own_dice, None);
    assert!(!declined.activated);
}

#[test]
fn continuation_reroll_needs_fresh_dice() {
    let effect = resolve_continuation(
        &ContinuationKind::RerollOnce,
        AbilityChoice::Confirm,
        Some(vec![5, 5, 6]),
    );
    assert_eq!(effect.own_dice, Some(vec![5, 5, 6]));
    assert!(effect.activated);

    let declined = resolve_continuation(&ContinuationKind::RerollOnce, AbilityChoice::Decline, None);
    assert!(!declined.activated);
}

#[test]
fn continuation_drop_die() {
    let continuation = ContinuationKind::DropDie {
        rolled: vec![6, 1, 3, 3],
    };

    let picked = resolve_continuation(&continuation, AbilityChoice::Pick(1), None);
    assert_eq!(picked.own_dice, Some(vec![6, 3, 3]));
    assert!(picked.activated);

    // Дефолт таймаута отбрасывает четвёртую; способность всё равно
    // потрачена — кости уже брошены.
    let defaulted = resolve_continuation(&continuation, AbilityChoice::Decline, None);
    assert_eq!(defaulted.own_dice, Some(vec![6, 1, 3]));
    assert!(defaulted.activated);
}

#[test]
fn continuation_snipe_knocks_highest_die() {
    let continuation = ContinuationKind::SnipeTarget {
        target: "жертва".to_string(),
        dice: vec![4, 5, 6],
    };
    let effect = resolve_continuation(&continuation, AbilityChoice::Confirm, None);
    assert_eq!(
        effect.target_dice,
        Some(("жертва".to_string(), vec![4, 5, 1]))
    );
    assert!(effect.activated);
}

#[test]
fn use_limits_and_cooldowns() {
    let mut ability = Ability::new(AbilityKind::SecondChance);
    assert!(ability.is_usable());

    ability.mark_used();
    // Кулдаун раунд: сразу после срабатывания не готова.
    assert!(!ability.is_usable());
    ability.tick_cooldown();
    assert!(ability.is_usable());

    ability.mark_used();
    ability.tick_cooldown();
    // Два заряда исчерпаны.
    assert!(!ability.is_usable());
}

#[test]
fn catalog_draw_without_replacement_is_distinct() {
    let catalog = AbilityCatalog::standard();
    assert_eq!(catalog.len(), ALL_ABILITY_KINDS.len());

    let mut rng = ScriptedRng::new();
    let drawn = catalog.draw(&mut rng, 4, false);
    assert_eq!(drawn.len(), 4);
    for pair in drawn.windows(2) {
        assert_ne!(pair[0].kind, pair[1].kind);
    }

    // Запрос больше каталога срезается, а не падает.
    let mut rng = ScriptedRng::new();
    let all = catalog.draw(&mut rng, 100, false);
    assert_eq!(all.len(), ALL_ABILITY_KINDS.len());
}

#[test]
fn catalog_draw_with_replacement_allows_repeats() {
    let catalog = AbilityCatalog::standard();
    // Все индексы скриптованы в ноль — каждый раз первая способность.
    let mut rng = ScriptedRng::new().with_picks(&[0, 0, 0]);
    let drawn = catalog.draw(&mut rng, 3, true);
    assert_eq!(drawn.len(), 3);
    assert!(drawn.iter().all(|a| a.kind == ALL_ABILITY_KINDS[0]));
}

#[test]
fn catalog_instantiate_by_id() {
    let catalog = AbilityCatalog::standard();
    let snipe = catalog.instantiate("snipe").expect("снайпер в каталоге");
    assert_eq!(snipe.kind, AbilityKind::Snipe);
    assert!(catalog.instantiate("нет_такой").is_none());

    for kind in ALL_ABILITY_KINDS {
        assert_eq!(AbilityKind::from_id(kind.spec().id), Some(kind));
    }
}
