//! Проводной формат протокола. Имена событий, операций и полей —
//! поверхность совместимости с фронтом, фиксируем их здесь.

use chinchiro_engine::ability::AbilityChoice;
use chinchiro_engine::api::{ApiError, Command};
use chinchiro_engine::engine::{EngineError, Notification};
use chinchiro_engine::eval::{evaluate, HandCategory};
use serde_json::json;

#[test]
fn notifications_use_event_data_envelope() {
    let event = Notification::BetPlaced {
        participant_id: "bob".to_string(),
        amount: 500,
        remaining: 1,
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({
            "event": "bet_placed",
            "data": {"participant_id": "bob", "amount": 500, "remaining": 1}
        })
    );

    let event = Notification::InterruptWindowOpen {
        participant_id: "bob".to_string(),
        window_secs: 5,
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({
            "event": "interrupt_window_open",
            "data": {"participant_id": "bob", "window_secs": 5}
        })
    );
}

#[test]
fn dice_rolled_carries_the_full_hand() {
    let hand = evaluate(&[2, 5, 2]).unwrap();
    let event = Notification::DiceRolled {
        participant_id: "bob".to_string(),
        dice: vec![2, 2, 5],
        hand: chinchiro_engine::api::dto::hand_to_dto(&hand),
        effect: None,
        can_reroll: false,
        reroll_attempts: 0,
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["event"], "dice_rolled");
    assert_eq!(value["data"]["dice"], json!([2, 2, 5]));
    assert_eq!(value["data"]["hand"]["category"], json!({"normal": 5}));
    assert_eq!(value["data"]["hand"]["rank"], 15);
    assert_eq!(value["data"]["effect"], serde_json::Value::Null);
}

#[test]
fn hand_categories_serialize_snake_case() {
    assert_eq!(
        serde_json::to_value(HandCategory::Pinzoro).unwrap(),
        json!("pinzoro")
    );
    assert_eq!(
        serde_json::to_value(HandCategory::Storm(4)).unwrap(),
        json!({"storm": 4})
    );
    assert_eq!(
        serde_json::to_value(HandCategory::Hifumi).unwrap(),
        json!("hifumi")
    );
}

#[test]
fn commands_deserialize_from_op_args() {
    let command: Command = serde_json::from_value(json!({
        "op": "place_wager",
        "args": {"code": "ABCD23", "participant_id": "bob", "amount": 500}
    }))
    .unwrap();
    assert_eq!(
        command,
        Command::PlaceWager {
            code: "ABCD23".to_string(),
            participant_id: "bob".to_string(),
            amount: 500,
        }
    );
    assert_eq!(command.room_code(), Some(&"ABCD23".to_string()));

    let command: Command = serde_json::from_value(json!({
        "op": "resolve_decision",
        "args": {"code": "ABCD23", "participant_id": "bob", "choice": {"pick": 2}}
    }))
    .unwrap();
    assert!(matches!(
        command,
        Command::ResolveDecision {
            choice: AbilityChoice::Pick(2),
            ..
        }
    ));

    let command: Command = serde_json::from_value(json!({
        "op": "accuse",
        "args": {"code": "ABCD23", "participant_id": "bob", "target_id": null, "round": null}
    }))
    .unwrap();
    assert!(matches!(command, Command::Accuse { target_id: None, .. }));
}

#[test]
fn ability_choices_serialize_snake_case() {
    assert_eq!(
        serde_json::to_value(AbilityChoice::Confirm).unwrap(),
        json!("confirm")
    );
    assert_eq!(
        serde_json::to_value(AbilityChoice::Decline).unwrap(),
        json!("decline")
    );
}

#[test]
fn errors_project_to_stable_codes() {
    let err = ApiError::from(EngineError::DealerCannotWager);
    let wire = err.to_wire();
    assert_eq!(wire.code, "dealer_cannot_wager");
    assert!(!wire.message.is_empty());

    let value = serde_json::to_value(&wire).unwrap();
    assert_eq!(value["code"], "dealer_cannot_wager");
}
