use tracing::warn;

use crate::domain::session::Phase;

/// Разрешён ли переход `from -> to`.
///
/// Таблица полностью повторяет штатный поток автомата; всё вне её —
/// программная ошибка вызывающего кода, а не игрока.
pub fn is_transition_allowed(from: Phase, to: Phase) -> bool {
    use Phase::*;

    match (from, to) {
        // Лобби -> раздача способностей (старт игры).
        (Waiting, AbilityDistribution) => true,
        // Раздача способностей -> ставки.
        (AbilityDistribution, Betting) => true,
        // Все поставили -> броски не-дилеров.
        (Betting, PlayerRoll) => true,
        // Очередной бросок -> окно обвинения.
        (PlayerRoll, InterruptWindow) => true,
        (DealerRoll, InterruptWindow) => true,
        // Окно закрыто -> следующий бросающий / дилер / результат.
        (InterruptWindow, PlayerRoll) => true,
        (InterruptWindow, DealerRoll) => true,
        (InterruptWindow, Result) => true,
        // Решение по способности: вход из бросков и окна, возврат туда же.
        (PlayerRoll, WaitingForAction) => true,
        (DealerRoll, WaitingForAction) => true,
        (InterruptWindow, WaitingForAction) => true,
        (WaitingForAction, PlayerRoll) => true,
        (WaitingForAction, DealerRoll) => true,
        (WaitingForAction, InterruptWindow) => true,
        // Расчёт -> итоги раунда -> новый раунд или конец игры.
        (Result, RoundEnd) => true,
        (RoundEnd, Betting) => true,
        (RoundEnd, GameEnd) => true,
        // После конца игры — обратно в лобби.
        (GameEnd, Waiting) => true,

        // Выбытие участника посреди раунда: пропуск этапов, которые
        // некому играть.
        (PlayerRoll, DealerRoll) => true,
        (PlayerRoll, Result) => true,
        (DealerRoll, Result) => true,
        // Досрочный конец игры, когда активных осталось <= 1.
        (Betting, GameEnd) => true,
        (PlayerRoll, GameEnd) => true,
        (DealerRoll, GameEnd) => true,
        (InterruptWindow, GameEnd) => true,

        _ => false,
    }
}

/// Проверка перехода перед каждой сменой фазы.
///
/// Невалидный переход логируется и отклоняется, но не фатален: штатный
/// поток все переходы пред-валидирует, сюда попадает только баг.
pub fn validate_transition(code: &str, from: Phase, to: Phase) -> bool {
    if is_transition_allowed(from, to) {
        true
    } else {
        warn!(
            session = code,
            ?from,
            ?to,
            "отклонён невалидный переход фазы"
        );
        false
    }
}
