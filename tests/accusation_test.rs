//! Обвинения: попадание, промах, повторный разбор, охранные проверки.

mod common;

use chinchiro_engine::ability::{Ability, AbilityChoice, AbilityKind};
use chinchiro_engine::domain::Phase;
use chinchiro_engine::engine::{EngineError, Notification};

use common::{balance, broadcasts, no_abilities_config, table, ScriptedRng};

fn grant(o: &mut chinchiro_engine::SessionOrchestrator<ScriptedRng>, id: &str, kind: AbilityKind) {
    o.session
        .participant_mut(&id.to_string())
        .unwrap()
        .ability = Some(Ability::new(kind));
}

#[test]
fn successful_accusation_fines_cheater() {
    let rng = ScriptedRng::new();
    let mut o = table(&["alice", "bob"], no_abilities_config(), rng);
    o.start_game(&"alice".to_string()).unwrap();
    grant(&mut o, "bob", AbilityKind::LoadedDice);
    o.place_wager(&"bob".to_string(), 500).unwrap();

    o.roll_dice(&"bob".to_string()).unwrap();
    o.resolve_decision(&"bob".to_string(), AbilityChoice::Confirm)
        .unwrap();
    assert_eq!(o.session.phase, Phase::InterruptWindow);

    let out = o
        .accuse(&"alice".to_string(), &"bob".to_string(), None)
        .unwrap();

    // Штраф заряженных костей 3000, половина — обвинителю.
    assert_eq!(balance(&o, "bob"), 7_000);
    assert_eq!(balance(&o, "alice"), 11_500);
    assert!(broadcasts(&out).iter().any(|e| matches!(
        e,
        Notification::DoubtResult {
            success: true,
            penalty: 3_000,
            reward: 1_500,
            ..
        }
    )));

    // Запись разобрана с указанием обвинителя.
    let record = &o.session.ledger.all()[0];
    assert!(record.resolved);
    assert_eq!(record.accuser.as_deref(), Some("alice"));

    // Разбор закрывает окно: очередь уходит дилеру.
    assert_eq!(o.session.phase, Phase::DealerRoll);
}

#[test]
fn false_accusation_fines_accuser() {
    let rng = ScriptedRng::with_rolls(&[2, 2, 5]);
    let mut o = table(&["alice", "bob", "cara"], no_abilities_config(), rng);
    o.start_game(&"alice".to_string()).unwrap();
    o.place_wager(&"bob".to_string(), 500).unwrap();
    o.place_wager(&"cara".to_string(), 500).unwrap();

    // Чистый бросок Боба.
    o.roll_dice(&"bob".to_string()).unwrap();
    assert_eq!(o.session.phase, Phase::InterruptWindow);

    let out = o
        .accuse(&"cara".to_string(), &"bob".to_string(), None)
        .unwrap();
    assert_eq!(balance(&o, "cara"), 9_500);
    assert_eq!(balance(&o, "bob"), 10_000);
    assert!(broadcasts(&out).iter().any(|e| matches!(
        e,
        Notification::DoubtResult {
            success: false,
            penalty: 500,
            reward: 0,
            ..
        }
    )));
    // Окно закрыто, бросает следующий.
    assert_eq!(o.session.phase, Phase::PlayerRoll);
}

#[test]
fn record_is_adjudicated_exactly_once() {
    let rng = ScriptedRng::with_rolls(&[2, 2, 5]);
    let mut o = table(&["alice", "bob", "cara"], no_abilities_config(), rng);
    o.start_game(&"alice".to_string()).unwrap();
    grant(&mut o, "bob", AbilityKind::LoadedDice);
    o.place_wager(&"bob".to_string(), 500).unwrap();
    o.place_wager(&"cara".to_string(), 500).unwrap();

    o.roll_dice(&"bob".to_string()).unwrap();
    o.resolve_decision(&"bob".to_string(), AbilityChoice::Confirm)
        .unwrap();
    o.accuse(&"alice".to_string(), &"bob".to_string(), None)
        .unwrap();
    assert_eq!(balance(&o, "alice"), 11_500);

    // Следующее окно: та же запись второй раз не разбирается.
    o.roll_dice(&"cara".to_string()).unwrap();
    assert_eq!(o.session.phase, Phase::InterruptWindow);
    o.accuse(&"alice".to_string(), &"bob".to_string(), Some(1))
        .unwrap();
    assert_eq!(balance(&o, "alice"), 11_000);
    assert_eq!(balance(&o, "bob"), 7_000);
}

#[test]
fn accusation_guards() {
    let rng = ScriptedRng::with_rolls(&[2, 2, 5]);
    let mut o = table(&["alice", "bob"], no_abilities_config(), rng);
    o.start_game(&"alice".to_string()).unwrap();

    // Вне окна обвинения не принимаются.
    assert_eq!(
        o.accuse(&"alice".to_string(), &"bob".to_string(), None),
        Err(EngineError::NotInInterruptWindow)
    );

    o.place_wager(&"bob".to_string(), 500).unwrap();
    o.roll_dice(&"bob".to_string()).unwrap();
    assert_eq!(o.session.phase, Phase::InterruptWindow);

    assert_eq!(
        o.accuse(&"alice".to_string(), &"alice".to_string(), None),
        Err(EngineError::SelfAccusation)
    );
    assert_eq!(
        o.accuse(&"alice".to_string(), &"nobody".to_string(), None),
        Err(EngineError::ParticipantNotFound("nobody".to_string()))
    );
    // Отказы не закрыли окно.
    assert_eq!(o.session.phase, Phase::InterruptWindow);
}
