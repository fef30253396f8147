//! Оценка рук: категории, порядок, множители, сравнение.

use chinchiro_engine::eval::{
    compare_hands, evaluate, payout_multipliers, Comparison, EvalError, HandCategory,
};

#[test]
fn special_combinations() {
    assert_eq!(evaluate(&[1, 2, 3]).unwrap().category, HandCategory::Hifumi);
    assert_eq!(evaluate(&[6, 5, 4]).unwrap().category, HandCategory::Shigoro);
    assert_eq!(evaluate(&[1, 1, 1]).unwrap().category, HandCategory::Pinzoro);
    assert_eq!(
        evaluate(&[4, 4, 4]).unwrap().category,
        HandCategory::Storm(4)
    );
}

#[test]
fn pair_gives_singleton_points() {
    assert_eq!(
        evaluate(&[2, 2, 5]).unwrap().category,
        HandCategory::Normal(5)
    );
    // Пара может быть и старшей: очки всегда у синглтона.
    assert_eq!(
        evaluate(&[1, 6, 6]).unwrap().category,
        HandCategory::Normal(1)
    );
}

#[test]
fn no_combination_is_blank() {
    let hand = evaluate(&[2, 4, 6]).unwrap();
    assert_eq!(hand.category, HandCategory::Blank);
    assert!(hand.is_blank());
}

#[test]
fn dice_are_sorted_in_hand() {
    let hand = evaluate(&[5, 2, 2]).unwrap();
    assert_eq!(hand.dice, [2, 2, 5]);
}

#[test]
fn input_contract() {
    assert_eq!(evaluate(&[1, 2]), Err(EvalError::WrongDiceCount(2)));
    assert_eq!(
        evaluate(&[1, 2, 3, 4]),
        Err(EvalError::WrongDiceCount(4))
    );
    assert_eq!(evaluate(&[0, 2, 3]), Err(EvalError::DieOutOfRange(0)));
    assert_eq!(evaluate(&[1, 2, 7]), Err(EvalError::DieOutOfRange(7)));
}

#[test]
fn total_order_of_categories() {
    // Пинзоро > араси > сигоро > очки > бута > хифуми;
    // внутри араси и очков — по значению.
    let ranks = [
        HandCategory::Pinzoro.rank(),
        HandCategory::Storm(6).rank(),
        HandCategory::Storm(2).rank(),
        HandCategory::Shigoro.rank(),
        HandCategory::Normal(6).rank(),
        HandCategory::Normal(1).rank(),
        HandCategory::Blank.rank(),
        HandCategory::Hifumi.rank(),
    ];
    for pair in ranks.windows(2) {
        assert!(pair[0] > pair[1], "порядок нарушен: {:?}", pair);
    }
}

#[test]
fn payout_table() {
    assert_eq!(payout_multipliers(HandCategory::Pinzoro), (5, 3));
    assert_eq!(payout_multipliers(HandCategory::Storm(3)), (3, 3));
    assert_eq!(payout_multipliers(HandCategory::Shigoro), (2, 2));
    assert_eq!(payout_multipliers(HandCategory::Hifumi), (2, 2));
    assert_eq!(payout_multipliers(HandCategory::Normal(4)), (1, 1));
    assert_eq!(payout_multipliers(HandCategory::Blank), (1, 1));
}

#[test]
fn blank_requires_reroll_unless_forced() {
    let blank = evaluate(&[2, 4, 6]).unwrap();
    let pair = evaluate(&[3, 3, 5]).unwrap();

    assert_eq!(
        compare_hands(&blank, &pair, false),
        Comparison::NeedsReroll {
            challenger: true,
            house: false,
        }
    );
    // Принудительное сравнение: бута (5) < очко (15).
    assert_eq!(compare_hands(&blank, &pair, true), Comparison::HouseWins);
    assert_eq!(compare_hands(&pair, &blank, true), Comparison::ChallengerWins);
}

#[test]
fn tie_goes_to_house() {
    let a = evaluate(&[2, 2, 4]).unwrap();
    let b = evaluate(&[5, 5, 4]).unwrap();
    assert_eq!(a.rank, b.rank);
    assert_eq!(compare_hands(&a, &b, true), Comparison::HouseWins);
}

#[test]
fn hifumi_always_loses_forced() {
    let hifumi = evaluate(&[1, 2, 3]).unwrap();
    let blank = evaluate(&[2, 4, 6]).unwrap();
    assert_eq!(compare_hands(&hifumi, &blank, true), Comparison::HouseWins);
}
