//! Оркестратор сессии: все операции над одной партией чинчиро.
//!
//! Каждая операция — синхронная функция `&mut self -> Result<OpOutput>`:
//! она либо отклоняется без изменения состояния, либо продвигает автомат
//! и возвращает упорядоченный пакет событий плюс команды таймеров.
//! Владелец оркестратора (runtime-задача сессии) обязан исполнять
//! операции строго последовательно — на этом держится вся идемпотентность
//! таймеров и единственность отложенного решения.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::ability::{
    resolve_continuation, AbilityCatalog, AbilityChoice, AbilityKind, ContinuationKind,
    DecisionRequest, HookOutcome,
};
use crate::api::dto::{build_roster, hand_to_dto, participant_to_dto};
use crate::arbitration::AccusationVerdict;
use crate::domain::config::{DICE_PER_ROLL, MAX_REROLL_ATTEMPTS};
use crate::domain::session::{PendingAbilityAction, Phase, Session};
use crate::domain::{Chips, ParticipantId, RoundNo};
use crate::eval::{compare_hands, evaluate, payout_multipliers, Comparison, Hand};

use super::errors::EngineError;
use super::events::{ChallengerOutcome, Notification, Outbound, RankEntry};
use super::phase::validate_transition;
use super::timers::{TimerCommand, TimerPurpose, TimerTable, TimerToken};
use super::RandomSource;

/// Результат одной операции: события в порядке возникновения плюс
/// команды таймеров для внешнего слоя.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct OpOutput {
    pub events: Vec<Outbound>,
    pub timers: Vec<TimerCommand>,
}

impl OpOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, event: Outbound) {
        self.events.push(event);
    }

    fn push_timers(&mut self, commands: Vec<TimerCommand>) {
        self.timers.extend(commands);
    }
}

/// Оркестратор одной сессии.
///
/// Держит состояние (`Session`), таблицу логических таймеров и источник
/// случайности. Никогда не спит и не смотрит на часы — время приходит
/// снаружи через `timer_fired`.
pub struct SessionOrchestrator<R: RandomSource> {
    pub session: Session,
    timers: TimerTable,
    rng: R,
    catalog: AbilityCatalog,
    /// Чей бросок сейчас обсуждается в окне обвинения.
    window_roller: Option<ParticipantId>,
}

impl<R: RandomSource> SessionOrchestrator<R> {
    pub fn new(session: Session, rng: R) -> Self {
        Self {
            session,
            timers: TimerTable::new(),
            rng,
            catalog: AbilityCatalog::standard(),
            window_roller: None,
        }
    }

    // ------------------------------------------------------------------
    // Операции протокола
    // ------------------------------------------------------------------

    /// Вход в лобби. Вне лобби новых участников не принимаем:
    /// реконнект существующих — забота транспорта.
    pub fn join(
        &mut self,
        id: ParticipantId,
        name: String,
    ) -> Result<OpOutput, EngineError> {
        if self.session.phase != Phase::Waiting {
            return Err(EngineError::WrongPhase(self.session.phase));
        }
        if self.session.participants.contains_key(&id) {
            return Err(EngineError::AlreadyJoined(id));
        }
        if self.session.participants.len() >= self.session.config.max_participants {
            return Err(EngineError::SessionFull);
        }

        let participant = crate::domain::Participant::new(id.clone(), name);
        let dto = participant_to_dto(&participant, false);
        self.session.participants.insert(id.clone(), participant);
        self.session.roll_order.push(id.clone());

        info!(session = %self.session.code, participant = %id, "участник вошёл");

        let mut out = OpOutput::new();
        out.push(Outbound::broadcast(Notification::PlayerJoined {
            participant: dto,
            roster: build_roster(&self.session),
        }));
        Ok(out)
    }

    /// Выход участника.
    ///
    /// В лобби участник удаляется совсем; посреди игры — помечается
    /// отключённым и выметается на границе раунда. Если на выходящем
    /// висело отложенное решение, оно разрешается дефолтом до ухода.
    pub fn leave(&mut self, id: &ParticipantId) -> Result<OpOutput, EngineError> {
        if !self.session.participants.contains_key(id) {
            return Err(EngineError::ParticipantNotFound(id.clone()));
        }

        let mut out = OpOutput::new();

        // Уходящий не оставляет конвейер висеть на своём решении.
        if self
            .session
            .pending
            .as_ref()
            .map(|p| &p.participant_id == id)
            .unwrap_or(false)
        {
            out.push_timers(self.timers.cancel(TimerPurpose::Decision));
            if let Some(pending) = self.session.pending.take() {
                self.apply_pending(pending, AbilityChoice::Decline, &mut out)?;
            }
        }

        info!(session = %self.session.code, participant = %id, "участник вышел");

        if self.session.phase == Phase::Waiting {
            self.session.participants.remove(id);
            self.session.roll_order.retain(|p| p != id);
        } else if let Some(p) = self.session.participant_mut(id) {
            p.connected = false;
            // Недоигранная бута без хозяина фиксируется автопроигрышем.
            if p.hand.as_ref().map(Hand::is_blank).unwrap_or(false) && !p.has_final_roll() {
                p.roll_forfeited = true;
            }
        }

        if &self.session.host == id {
            self.reassign_host();
        }

        out.push(Outbound::broadcast(Notification::PlayerLeft {
            participant_id: id.clone(),
            roster: build_roster(&self.session),
        }));

        self.resume_after_departure(&mut out)?;
        Ok(out)
    }

    /// Старт игры (только создатель комнаты, из лобби, минимум двое).
    pub fn start_game(&mut self, caller: &ParticipantId) -> Result<OpOutput, EngineError> {
        if self.session.phase != Phase::Waiting {
            return Err(EngineError::WrongPhase(self.session.phase));
        }
        if caller != &self.session.host {
            return Err(EngineError::NotHost);
        }
        if self.session.participants.len() < 2 {
            return Err(EngineError::NotEnoughParticipants);
        }

        let mut out = OpOutput::new();
        let restart = self.session.round > 0;

        let starting = self.session.config.starting_balance;
        for p in self.session.participants.values_mut() {
            p.reset_for_game(starting);
        }
        self.session.round = 0;
        self.session.set_count = 0;
        self.session.dealer_index = 0;
        self.session.set_start_dealer = 0;
        self.session.roller_index = 0;
        self.session.ledger = crate::arbitration::AccusationLedger::new();
        self.session.pending = None;

        // Порядок бросков фиксируется один раз на всю игру.
        let mut order = self.session.roll_order.clone();
        self.rng.shuffle(&mut order);
        self.session.roll_order = order;

        self.set_phase(Phase::AbilityDistribution)?;

        if restart {
            out.push(Outbound::broadcast(Notification::GameReset {
                roster: build_roster(&self.session),
            }));
        }

        info!(
            session = %self.session.code,
            participants = self.session.participants.len(),
            "игра стартовала"
        );
        out.push(Outbound::broadcast(Notification::GameStarted {
            roll_order: self.session.roll_order.clone(),
            roster: build_roster(&self.session),
        }));

        if self.session.config.distribute_abilities {
            let abilities = self.catalog.draw(
                &mut self.rng,
                self.session.roll_order.len(),
                self.session.config.abilities_with_replacement,
            );
            let order = self.session.roll_order.clone();
            for (id, ability) in order.iter().zip(abilities) {
                let spec = ability.spec();
                out.push(Outbound::to(
                    id.clone(),
                    Notification::AbilityAssigned {
                        ability_id: spec.id.to_string(),
                        name: spec.name.to_string(),
                        description: spec.description.to_string(),
                    },
                ));
                if let Some(p) = self.session.participant_mut(id) {
                    p.ability = Some(ability);
                }
            }
        }

        self.begin_round(&mut out)?;
        Ok(out)
    }

    /// Ставка не-дилера в фазе ставок.
    pub fn place_wager(
        &mut self,
        id: &ParticipantId,
        amount: i64,
    ) -> Result<OpOutput, EngineError> {
        if self.session.phase != Phase::Betting {
            return Err(EngineError::WrongPhase(self.session.phase));
        }
        let dealer = self.session.dealer_id().cloned();
        let config_min = self.session.config.min_wager.0;
        let config_max = self.session.config.max_wager.0;

        let p = self
            .session
            .participant(id)
            .ok_or_else(|| EngineError::ParticipantNotFound(id.clone()))?;
        if Some(id) == dealer.as_ref() {
            return Err(EngineError::DealerCannotWager);
        }
        if !p.wager.is_zero() {
            return Err(EngineError::AlreadyWagered);
        }
        // Лимиты стола, срезанные по балансу: короткий стек может пойти
        // ва-банк ниже минимума.
        let min = config_min.min(p.balance.0);
        let max = config_max.min(p.balance.0);
        if amount < min || amount > max {
            return Err(EngineError::WagerOutOfRange { amount, min, max });
        }

        if let Some(p) = self.session.participant_mut(id) {
            p.wager = Chips(amount);
        }

        let remaining = self.betting_remaining();
        debug!(session = %self.session.code, participant = %id, amount, remaining, "ставка принята");

        let mut out = OpOutput::new();
        out.push(Outbound::broadcast(Notification::BetPlaced {
            participant_id: id.clone(),
            amount,
            remaining,
        }));

        if remaining == 0 {
            self.set_phase(Phase::PlayerRoll)?;
            if let Some(idx) = self.next_pending_roller() {
                self.session.roller_index = idx;
            }
        }
        Ok(out)
    }

    /// Бросок костей: не-дилеры строго по порядку, дилер последним.
    pub fn roll_dice(&mut self, id: &ParticipantId) -> Result<OpOutput, EngineError> {
        let phase = self.session.phase;
        match phase {
            Phase::PlayerRoll => {
                let current = self
                    .session
                    .roll_order
                    .get(self.session.roller_index)
                    .cloned();
                if current.as_ref() != Some(id) {
                    return Err(EngineError::NotYourTurn(id.clone()));
                }
            }
            Phase::DealerRoll => {
                if self.session.dealer_id() != Some(id) {
                    return Err(EngineError::NotYourTurn(id.clone()));
                }
            }
            other => return Err(EngineError::WrongPhase(other)),
        }

        let p = self
            .session
            .participant(id)
            .ok_or_else(|| EngineError::ParticipantNotFound(id.clone()))?;
        if p.has_final_roll() {
            return Err(EngineError::AlreadyRolled);
        }
        let initial_attempt = p.reroll_attempts == 0 && p.hand.is_none();

        let mut out = OpOutput::new();
        out.push(Outbound::broadcast(Notification::RollingStarted {
            participant_id: id.clone(),
        }));

        // Хук перед броском — только на первой попытке раунда,
        // перебросы буты идут без него.
        if initial_attempt {
            let hook = match self.session.participants.get_mut(id) {
                Some(p) => match p.ability.as_mut() {
                    Some(a) if a.is_usable() => Some((a.before_roll(&mut self.rng), a.kind)),
                    _ => None,
                },
                None => None,
            };
            match hook {
                Some((HookOutcome::RequiresDecision(req), kind)) => {
                    // Для "четвёртой кости" участник видит все четыре,
                    // пока решает.
                    let prior = match &req.continuation {
                        ContinuationKind::DropDie { rolled } => rolled.clone(),
                        _ => Vec::new(),
                    };
                    if !prior.is_empty() {
                        if let Some(p) = self.session.participant_mut(id) {
                            p.dice = prior.clone();
                        }
                        out.push(Outbound::broadcast(Notification::VisualEffect {
                            participant_id: id.clone(),
                            effect: "extra_die".to_string(),
                        }));
                    }
                    self.suspend_for_decision(id, kind, prior, req, phase, &mut out)?;
                    return Ok(out);
                }
                Some((HookOutcome::OverrideDice(dice), _)) => {
                    self.note_covert_activation(id, &mut out);
                    self.process_rolled(id, dice, None, &mut out)?;
                    return Ok(out);
                }
                _ => {}
            }
        }

        let dice = self.roll_plain();
        self.process_rolled(id, dice, None, &mut out)?;
        Ok(out)
    }

    /// Явное решение по отложенному запросу способности.
    pub fn resolve_decision(
        &mut self,
        id: &ParticipantId,
        choice: AbilityChoice,
    ) -> Result<OpOutput, EngineError> {
        let pending_owner = self
            .session
            .pending
            .as_ref()
            .map(|p| p.participant_id.clone())
            .ok_or(EngineError::NoPendingDecision)?;
        if &pending_owner != id {
            return Err(EngineError::DecisionNotYours);
        }

        let mut out = OpOutput::new();
        out.push_timers(self.timers.cancel(TimerPurpose::Decision));
        // pending проверен выше, take не может вернуть None.
        if let Some(pending) = self.session.pending.take() {
            self.apply_pending(pending, choice, &mut out)?;
        }
        Ok(out)
    }

    /// Обвинение в жульничестве. Принимается только в окне после броска;
    /// разбор закрывает окно немедленно.
    pub fn accuse(
        &mut self,
        accuser: &ParticipantId,
        target: &ParticipantId,
        round: Option<RoundNo>,
    ) -> Result<OpOutput, EngineError> {
        if self.session.phase != Phase::InterruptWindow {
            return Err(EngineError::NotInInterruptWindow);
        }
        if accuser == target {
            return Err(EngineError::SelfAccusation);
        }
        if self.session.participant(accuser).is_none() {
            return Err(EngineError::ParticipantNotFound(accuser.clone()));
        }
        if self.session.participant(target).is_none() {
            return Err(EngineError::ParticipantNotFound(target.clone()));
        }

        let round = round.unwrap_or(self.session.round);
        let verdict = self.session.ledger.adjudicate(accuser, target, round);

        let mut out = OpOutput::new();
        match verdict {
            AccusationVerdict::Hit { ability_id } => {
                let penalty = AbilityKind::from_id(&ability_id)
                    .and_then(|k| k.spec().cheat_penalty)
                    .unwrap_or(self.session.config.default_cheat_penalty);
                let reward = Chips(penalty.0 / 2);
                if let Some(t) = self.session.participant_mut(target) {
                    t.balance -= penalty;
                }
                if let Some(a) = self.session.participant_mut(accuser) {
                    a.balance += reward;
                }
                info!(
                    session = %self.session.code,
                    accuser = %accuser,
                    target = %target,
                    ability = %ability_id,
                    "обвинение попало"
                );
                out.push(Outbound::broadcast(Notification::DoubtResult {
                    accuser_id: accuser.clone(),
                    target_id: target.clone(),
                    success: true,
                    penalty: penalty.0,
                    reward: reward.0,
                    roster: build_roster(&self.session),
                }));
            }
            AccusationVerdict::Miss => {
                let penalty = self.session.config.false_accusation_penalty;
                if let Some(a) = self.session.participant_mut(accuser) {
                    a.balance -= penalty;
                }
                info!(
                    session = %self.session.code,
                    accuser = %accuser,
                    target = %target,
                    "ложное обвинение"
                );
                out.push(Outbound::broadcast(Notification::DoubtResult {
                    accuser_id: accuser.clone(),
                    target_id: target.clone(),
                    success: false,
                    penalty: penalty.0,
                    reward: 0,
                    roster: build_roster(&self.session),
                }));
            }
        }

        out.push_timers(self.timers.cancel(TimerPurpose::InterruptWindow));
        self.close_interrupt_window(&mut out)?;
        Ok(out)
    }

    /// Выстрел логического таймера. Устаревший токен — пустая операция.
    pub fn timer_fired(&mut self, token: TimerToken) -> Result<OpOutput, EngineError> {
        let mut out = OpOutput::new();
        if !self.timers.accept_fire(token) {
            debug!(session = %self.session.code, ?token, "устаревший таймер, игнорируем");
            return Ok(out);
        }

        match token.purpose {
            TimerPurpose::Decision => {
                // Таймаут решения: дефолтный отказ.
                match self.session.pending.take() {
                    Some(pending) => {
                        debug!(
                            session = %self.session.code,
                            participant = %pending.participant_id,
                            "таймаут решения, применяем дефолт"
                        );
                        self.apply_pending(pending, AbilityChoice::Decline, &mut out)?;
                    }
                    None => warn!(
                        session = %self.session.code,
                        "таймер решения без отложенного решения"
                    ),
                }
            }
            TimerPurpose::InterruptWindow => {
                self.close_interrupt_window(&mut out)?;
            }
            TimerPurpose::Transition => match self.session.phase {
                Phase::RoundEnd => self.finish_round(&mut out)?,
                Phase::GameEnd => self.return_to_lobby(&mut out)?,
                other => warn!(
                    session = %self.session.code,
                    ?other,
                    "переходный таймер в неожиданной фазе"
                ),
            },
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Внутренний конвейер раунда
    // ------------------------------------------------------------------

    /// Начало раунда: сбросы, флаг дилера, реплики способностей.
    fn begin_round(&mut self, out: &mut OpOutput) -> Result<(), EngineError> {
        self.session.round += 1;
        self.window_roller = None;

        let dealer = self
            .session
            .dealer_id()
            .cloned()
            .ok_or(EngineError::Internal("нет дилера при старте раунда"))?;
        for p in self.session.participants.values_mut() {
            p.reset_for_round();
            p.is_dealer = false;
        }
        if let Some(d) = self.session.participant_mut(&dealer) {
            d.is_dealer = true;
        }

        self.set_phase(Phase::Betting)?;

        info!(
            session = %self.session.code,
            round = self.session.round,
            dealer = %dealer,
            "раунд начался"
        );
        out.push(Outbound::broadcast(Notification::RoundStarted {
            round: self.session.round,
            dealer_id: dealer,
            roster: build_roster(&self.session),
        }));

        // Хук начала раунда: на сегодня только реплики, но точка общая.
        for id in self.session.active_ids() {
            let line = self
                .session
                .participant_mut(&id)
                .and_then(|p| p.ability.as_mut())
                .and_then(|a| a.on_round_start().map(|line| (a.kind, line)));
            if let Some((kind, line)) = line {
                out.push(Outbound::broadcast(Notification::SkillVisualEffect {
                    participant_id: id,
                    skill_id: kind.spec().id.to_string(),
                    effect: line,
                }));
            }
        }
        Ok(())
    }

    /// Принять брошенные кости участника и провести их через хуки,
    /// правило переброса и фиксацию результата.
    fn process_rolled(
        &mut self,
        id: &ParticipantId,
        dice: Vec<u8>,
        effect: Option<String>,
        out: &mut OpOutput,
    ) -> Result<(), EngineError> {
        let mut dice = dice;
        let mut hand = evaluate(&dice)?;
        let phase = self.session.phase;

        // Хук после броска.
        let hook = match self.session.participants.get_mut(id) {
            Some(p) => match p.ability.as_mut() {
                Some(a) if a.is_usable() => Some((a.after_roll(&hand), a.kind)),
                _ => None,
            },
            None => None,
        };
        match hook {
            Some((HookOutcome::OverrideDice(new_dice), _)) => {
                // Тихая подмена: кости выглядят как обычный бросок.
                self.note_covert_activation(id, out);
                hand = evaluate(&new_dice)?;
                dice = new_dice;
            }
            Some((HookOutcome::OverrideHand(category), _)) => {
                self.note_covert_activation(id, out);
                hand = Hand::from_category(category, hand.dice);
            }
            Some((HookOutcome::RequiresDecision(req), kind)) => {
                let can_reroll =
                    hand.is_blank() && self.reroll_attempts_of(id) < MAX_REROLL_ATTEMPTS;
                if let Some(p) = self.session.participant_mut(id) {
                    p.dice = dice.clone();
                    p.hand = Some(hand.clone());
                }
                out.push(Outbound::broadcast(Notification::DiceRolled {
                    participant_id: id.clone(),
                    dice: dice.clone(),
                    hand: hand_to_dto(&hand),
                    effect,
                    can_reroll,
                    reroll_attempts: self.reroll_attempts_of(id),
                }));
                self.suspend_for_decision(id, kind, dice, req, phase, out)?;
                return Ok(());
            }
            _ => {}
        }

        if let Some(p) = self.session.participant_mut(id) {
            p.dice = dice.clone();
            p.hand = Some(hand.clone());
        }

        if hand.is_blank() {
            let attempts = self.reroll_attempts_of(id);
            if attempts < MAX_REROLL_ATTEMPTS {
                // Бута перебрасывается; бросающий остаётся тем же.
                if let Some(p) = self.session.participant_mut(id) {
                    p.reroll_attempts += 1;
                }
                out.push(Outbound::broadcast(Notification::DiceRolled {
                    participant_id: id.clone(),
                    dice,
                    hand: hand_to_dto(&hand),
                    effect,
                    can_reroll: true,
                    reroll_attempts: attempts + 1,
                }));
                return Ok(());
            }
            // Четвёртая бута подряд — автопроигрыш.
            if let Some(p) = self.session.participant_mut(id) {
                p.roll_forfeited = true;
            }
            debug!(session = %self.session.code, participant = %id, "переброс исчерпан, автопроигрыш");
        }

        out.push(Outbound::broadcast(Notification::DiceRolled {
            participant_id: id.clone(),
            dice,
            hand: hand_to_dto(&hand),
            effect,
            can_reroll: false,
            reroll_attempts: self.reroll_attempts_of(id),
        }));
        self.finalize_roll(id, hand, out)
    }

    /// Бросок зафиксирован: открыть окно обвинения и дать чужим
    /// способностям шанс вмешаться.
    fn finalize_roll(
        &mut self,
        id: &ParticipantId,
        hand: Hand,
        out: &mut OpOutput,
    ) -> Result<(), EngineError> {
        self.set_phase(Phase::InterruptWindow)?;
        self.window_roller = Some(id.clone());

        let window = self.session.config.interrupt_window_secs;
        out.push(Outbound::broadcast(Notification::InterruptWindowOpen {
            participant_id: id.clone(),
            window_secs: window,
        }));
        out.push_timers(self.timers.schedule(TimerPurpose::InterruptWindow, window));

        // Перехваты чужих способностей: первый запросивший решение
        // приостанавливает окно, остальные ждут следующих бросков.
        let watchers: Vec<ParticipantId> = self
            .session
            .active_ids()
            .into_iter()
            .filter(|w| w != id)
            .collect();
        for watcher in watchers {
            let hook = match self.session.participants.get_mut(&watcher) {
                Some(p) => match p.ability.as_mut() {
                    Some(a) if a.is_usable() => Some((a.on_interrupt(id, &hand), a.kind)),
                    _ => None,
                },
                None => None,
            };
            if let Some((HookOutcome::RequiresDecision(req), kind)) = hook {
                out.push_timers(self.timers.cancel(TimerPurpose::InterruptWindow));
                let prior = hand.dice.to_vec();
                self.suspend_for_decision(
                    &watcher,
                    kind,
                    prior,
                    req,
                    Phase::InterruptWindow,
                    out,
                )?;
                break;
            }
        }
        Ok(())
    }

    /// Закрыть окно обвинения и продвинуть конвейер дальше.
    fn close_interrupt_window(&mut self, out: &mut OpOutput) -> Result<(), EngineError> {
        if let Some(roller) = self.window_roller.take() {
            out.push(Outbound::broadcast(Notification::InterruptWindowClosed {
                participant_id: roller,
            }));
        }
        self.advance_rolling(out)
    }

    /// Кому бросать дальше: следующий не-дилер, дилер, или расчёт.
    fn advance_rolling(&mut self, out: &mut OpOutput) -> Result<(), EngineError> {
        if let Some(idx) = self.next_pending_roller() {
            self.session.roller_index = idx;
            if self.session.phase != Phase::PlayerRoll {
                self.set_phase(Phase::PlayerRoll)?;
            }
            return Ok(());
        }

        let dealer_pending = self
            .session
            .dealer_id()
            .and_then(|d| self.session.participant(d))
            .map(|p| p.is_active() && !p.has_final_roll())
            .unwrap_or(false);
        if dealer_pending {
            if self.session.phase != Phase::DealerRoll {
                self.set_phase(Phase::DealerRoll)?;
            }
            return Ok(());
        }

        self.set_phase(Phase::Result)?;
        self.compute_results(out)
    }

    /// Расчёт раунда: принудительное сравнение каждой пары, перевод
    /// фишек, пауза перед итогами.
    fn compute_results(&mut self, out: &mut OpOutput) -> Result<(), EngineError> {
        let dealer_id = self
            .session
            .dealer_id()
            .cloned()
            .ok_or(EngineError::Internal("нет дилера при расчёте"))?;
        let (dealer_hand, dealer_forfeited) = match self.session.participant(&dealer_id) {
            Some(d) => (d.hand.clone(), d.roll_forfeited),
            None => (None, true),
        };

        let mut results = Vec::new();
        let order = self.session.roll_order.clone();
        for ch_id in order.iter().filter(|c| *c != &dealer_id) {
            let (wager, ch_hand, ch_forfeited) = match self.session.participant(ch_id) {
                Some(p) => (p.wager, p.hand.clone(), p.roll_forfeited),
                None => continue,
            };
            // Без ставки или без результата участия в расчёте нет.
            if wager.is_zero() || (ch_hand.is_none() && !ch_forfeited) {
                continue;
            }

            // Автопроигрыш бьёт любое сравнение; при обоюдном —
            // преимущество дома.
            let dealer_won = if ch_forfeited {
                true
            } else if dealer_forfeited {
                false
            } else {
                match (&ch_hand, &dealer_hand) {
                    (Some(ch), Some(dh)) => {
                        matches!(compare_hands(ch, dh, true), Comparison::HouseWins)
                    }
                    // Дилер без руки и без автопроигрыша до расчёта не
                    // доходит; это программная ошибка, не проигрыш стола.
                    _ => {
                        return Err(EngineError::Internal(
                            "расчёт без зафиксированной руки дилера",
                        ))
                    }
                }
            };

            // Множители категорий; автопроигрыш платится по 1x.
            let (house_mult, challenger_mult) = if ch_forfeited || dealer_forfeited {
                (1, 1)
            } else {
                let hm = dealer_hand
                    .as_ref()
                    .map(|h| payout_multipliers(h.category).0)
                    .unwrap_or(1);
                let cm = ch_hand
                    .as_ref()
                    .map(|h| payout_multipliers(h.category).1)
                    .unwrap_or(1);
                (hm, cm)
            };

            // Множители способностей обеих сторон, перемножаются.
            let mut factor = 1.0_f64;
            if let (Some(dh), Some(ch)) = (&dealer_hand, &ch_hand) {
                factor *= self.result_factor(&dealer_id, dealer_won, dh, ch, out);
                factor *= self.result_factor(ch_id, !dealer_won, ch, dh, out);
            }

            let base = wager.0 * house_mult * challenger_mult;
            let transfer = ((base as f64) * factor).floor() as i64;

            if dealer_won {
                if let Some(p) = self.session.participant_mut(ch_id) {
                    p.balance -= Chips(transfer);
                }
                if let Some(d) = self.session.participant_mut(&dealer_id) {
                    d.balance += Chips(transfer);
                }
            } else {
                if let Some(d) = self.session.participant_mut(&dealer_id) {
                    d.balance -= Chips(transfer);
                }
                if let Some(p) = self.session.participant_mut(ch_id) {
                    p.balance += Chips(transfer);
                }
            }

            results.push(ChallengerOutcome {
                participant_id: ch_id.clone(),
                hand: ch_hand.as_ref().map(hand_to_dto),
                won: !dealer_won,
                transfer: if dealer_won { -transfer } else { transfer },
            });
        }

        info!(
            session = %self.session.code,
            round = self.session.round,
            outcomes = results.len(),
            "раунд рассчитан"
        );
        out.push(Outbound::broadcast(Notification::RoundResult {
            round: self.session.round,
            dealer_id,
            dealer_hand: dealer_hand.as_ref().map(hand_to_dto),
            results,
            roster: build_roster(&self.session),
        }));

        self.set_phase(Phase::RoundEnd)?;
        out.push_timers(self.timers.schedule(
            TimerPurpose::Transition,
            self.session.config.round_transition_secs,
        ));
        Ok(())
    }

    /// Итоги раунда: кулдауны, банкроты, ротация дилера, бонус сета,
    /// затем новый раунд или конец игры.
    fn finish_round(&mut self, out: &mut OpOutput) -> Result<(), EngineError> {
        for p in self.session.participants.values_mut() {
            if let Some(a) = p.ability.as_mut() {
                a.tick_cooldown();
            }
        }

        // Банкротства фиксируются только здесь, на границе раунда:
        // посреди раунда баланс может уходить в минус (штрафы, выплаты),
        // не выбивая участника из текущей очереди.
        let bankrupt: Vec<ParticipantId> = self
            .session
            .roll_order
            .iter()
            .filter(|id| {
                self.session
                    .participant(id)
                    .map(|p| p.balance.is_bankrupt() && !p.eliminated)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        if !bankrupt.is_empty() {
            for id in &bankrupt {
                if let Some(p) = self.session.participant_mut(id) {
                    p.eliminated = true;
                }
            }
            info!(session = %self.session.code, count = bankrupt.len(), "участники обанкротились");
            out.push(Outbound::broadcast(Notification::PlayersBankrupt {
                participant_ids: bankrupt,
            }));
        }

        if self.session.active_count() <= 1 {
            return self.end_game(out);
        }

        // Ротация дилера с детекцией полного круга ("сета"). Пройденный
        // по пути стартовый индекс сета засчитывает круг даже когда
        // стартовый дилер уже выбыл.
        let len = self.session.roll_order.len();
        let mut idx = self.session.dealer_index;
        let mut set_completed = false;
        for _ in 0..len {
            idx = (idx + 1) % len;
            if idx == self.session.set_start_dealer {
                set_completed = true;
            }
            let active = self
                .session
                .roll_order
                .get(idx)
                .and_then(|id| self.session.participant(id))
                .map(|p| p.is_active())
                .unwrap_or(false);
            if active {
                break;
            }
        }
        self.session.dealer_index = idx;

        if set_completed {
            self.session.set_count += 1;
            self.session.set_start_dealer = idx;
            let bonus = self.session.config.set_bonus;
            for id in self.session.active_ids() {
                if let Some(p) = self.session.participant_mut(&id) {
                    p.balance += bonus;
                }
            }
            info!(session = %self.session.code, set = self.session.set_count, "сет сыгран, бонус начислен");
            out.push(Outbound::broadcast(Notification::SetCompleted {
                set_count: self.session.set_count,
                bonus: bonus.0,
                roster: build_roster(&self.session),
            }));
        }

        self.begin_round(out)
    }

    /// Конец игры: итоговый рейтинг, журнал скрытых активаций,
    /// пауза и возврат в лобби.
    fn end_game(&mut self, out: &mut OpOutput) -> Result<(), EngineError> {
        let mut standings: Vec<(usize, ParticipantId, String, i64)> = self
            .session
            .roll_order
            .iter()
            .enumerate()
            .filter_map(|(pos, id)| {
                self.session
                    .participant(id)
                    .map(|p| (pos, id.clone(), p.name.clone(), p.balance.0))
            })
            .collect();
        // Больший баланс выше; при равенстве — порядок бросков.
        standings.sort_by(|a, b| b.3.cmp(&a.3).then(a.0.cmp(&b.0)));

        let mut ranking = Vec::new();
        for (rank0, (_, id, name, balance)) in standings.into_iter().enumerate() {
            let rank = (rank0 + 1) as u32;
            if let Some(p) = self.session.participant_mut(&id) {
                p.final_rank = Some(rank);
            }
            ranking.push(RankEntry {
                participant_id: id,
                name,
                balance,
                rank,
            });
        }

        info!(session = %self.session.code, round = self.session.round, "игра окончена");
        out.push(Outbound::broadcast(Notification::GameEnded {
            ranking,
            ledger: self.session.ledger.all().to_vec(),
        }));

        self.set_phase(Phase::GameEnd)?;
        out.push_timers(self.timers.cancel(TimerPurpose::InterruptWindow));
        out.push_timers(self.timers.cancel(TimerPurpose::Decision));
        out.push_timers(self.timers.schedule(
            TimerPurpose::Transition,
            self.session.config.round_transition_secs,
        ));
        Ok(())
    }

    /// Возврат в лобби после конца игры. Отключённые выметаются совсем.
    fn return_to_lobby(&mut self, out: &mut OpOutput) -> Result<(), EngineError> {
        let gone: Vec<ParticipantId> = self
            .session
            .participants
            .values()
            .filter(|p| !p.connected)
            .map(|p| p.id.clone())
            .collect();
        for id in &gone {
            self.session.participants.remove(id);
            self.session.roll_order.retain(|p| p != id);
        }
        if gone.contains(&self.session.host) {
            self.reassign_host();
        }

        self.set_phase(Phase::Waiting)?;
        self.window_roller = None;
        self.session.pending = None;

        out.push(Outbound::broadcast(Notification::ReturnedToLobby {
            roster: build_roster(&self.session),
        }));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Отложенные решения
    // ------------------------------------------------------------------

    /// Приостановить конвейер до решения участника.
    fn suspend_for_decision(
        &mut self,
        id: &ParticipantId,
        kind: AbilityKind,
        prior_dice: Vec<u8>,
        req: DecisionRequest,
        resume: Phase,
        out: &mut OpOutput,
    ) -> Result<(), EngineError> {
        let timeout = req
            .timeout_secs
            .unwrap_or(self.session.config.decision_timeout_secs);

        self.set_phase(Phase::WaitingForAction)?;
        self.session.pending = Some(PendingAbilityAction {
            participant_id: id.clone(),
            ability_kind: kind,
            prior_dice,
            prompt: req.prompt.clone(),
            options: req.options.clone(),
            timeout_secs: timeout,
            continuation: req.continuation,
            resume,
        });

        // Всем — кто решает; решающему — ещё и что именно.
        out.push(Outbound::broadcast(Notification::WaitingForAction {
            participant_id: id.clone(),
            prompt: None,
            options: None,
            timeout_secs: timeout,
        }));
        out.push(Outbound::to(
            id.clone(),
            Notification::WaitingForAction {
                participant_id: id.clone(),
                prompt: Some(req.prompt),
                options: Some(req.options),
                timeout_secs: timeout,
            },
        ));
        out.push_timers(self.timers.schedule(TimerPurpose::Decision, timeout));
        Ok(())
    }

    /// Применить разрешённое продолжение и вернуть конвейер в фазу,
    /// из которой он был приостановлен.
    fn apply_pending(
        &mut self,
        pending: PendingAbilityAction,
        choice: AbilityChoice,
        out: &mut OpOutput,
    ) -> Result<(), EngineError> {
        let pid = pending.participant_id.clone();
        let spec = pending.ability_kind.spec();

        let fresh = if matches!(pending.continuation, ContinuationKind::RerollOnce)
            && choice == AbilityChoice::Confirm
        {
            Some(self.roll_plain())
        } else {
            None
        };
        let effect = resolve_continuation(&pending.continuation, choice, fresh);

        if effect.activated {
            if let Some(a) = self
                .session
                .participant_mut(&pid)
                .and_then(|p| p.ability.as_mut())
            {
                a.mark_used();
            }
            if spec.covert {
                let round = self.session.round;
                self.session.ledger.log_activation(
                    pid.clone(),
                    spec.id.to_string(),
                    round,
                    now_ms(),
                );
            }
        }
        if let Some(visual) = &effect.visual {
            if !spec.covert {
                out.push(Outbound::broadcast(Notification::SkillVisualEffect {
                    participant_id: pid.clone(),
                    skill_id: spec.id.to_string(),
                    effect: visual.clone(),
                }));
            }
        }

        self.set_phase(pending.resume)?;

        // Вмешательство в чужой бросок (окно обвинения).
        if pending.resume == Phase::InterruptWindow {
            if let Some((target, new_dice)) = effect.target_dice {
                let new_hand = evaluate(&new_dice)?;
                if let Some(t) = self.session.participant_mut(&target) {
                    t.dice = new_dice.clone();
                    t.hand = Some(new_hand.clone());
                    // После вмешательства переброс не положен: бута
                    // фиксируется как автопроигрыш.
                    if new_hand.is_blank() {
                        t.roll_forfeited = true;
                    }
                }
                out.push(Outbound::broadcast(Notification::DiceUpdated {
                    participant_id: target,
                    dice: new_dice,
                    hand: hand_to_dto(&new_hand),
                    reason: "interference".to_string(),
                }));
            }
            // Окно продолжается с полным отсчётом.
            let window = self.session.config.interrupt_window_secs;
            if let Some(roller) = self.window_roller.clone() {
                out.push(Outbound::broadcast(Notification::InterruptWindowOpen {
                    participant_id: roller,
                    window_secs: window,
                }));
            }
            out.push_timers(self.timers.schedule(TimerPurpose::InterruptWindow, window));
            return Ok(());
        }

        // Решения на этапе броска владельца.
        if let Some(dice) = effect.own_dice {
            let label = if effect.activated && !spec.covert {
                Some(spec.id.to_string())
            } else {
                None
            };
            return self.process_rolled(&pid, dice, label, out);
        }
        match pending.continuation {
            // Отказ от переброса: рука уже оценена, фиксируем её.
            ContinuationKind::RerollOnce => {
                let hand = self
                    .session
                    .participant(&pid)
                    .and_then(|p| p.hand.clone())
                    .ok_or(EngineError::Internal("нет руки при отказе от переброса"))?;
                self.finalize_roll(&pid, hand, out)
            }
            // Отказ до броска: бросаем как обычно.
            _ => {
                let dice = self.roll_plain();
                self.process_rolled(&pid, dice, None, out)
            }
        }
    }

    // ------------------------------------------------------------------
    // Вспомогательное
    // ------------------------------------------------------------------

    /// Смена фазы через таблицу переходов. Отказ — программная ошибка,
    /// состояние не меняется.
    fn set_phase(&mut self, to: Phase) -> Result<(), EngineError> {
        if validate_transition(&self.session.code, self.session.phase, to) {
            self.session.phase = to;
            Ok(())
        } else {
            Err(EngineError::Internal("невалидный переход фазы"))
        }
    }

    fn roll_plain(&mut self) -> Vec<u8> {
        (0..DICE_PER_ROLL).map(|_| self.rng.roll_die()).collect()
    }

    /// Сколько активных не-дилеров ещё не поставило.
    fn betting_remaining(&self) -> usize {
        self.session
            .active_challenger_ids()
            .iter()
            .filter(|id| {
                self.session
                    .participant(id)
                    .map(|p| p.wager.is_zero())
                    .unwrap_or(false)
            })
            .count()
    }

    /// Следующий не-дилер без зафиксированного результата,
    /// в порядке бросков.
    fn next_pending_roller(&self) -> Option<usize> {
        self.session
            .roll_order
            .iter()
            .enumerate()
            .find(|(idx, id)| {
                *idx != self.session.dealer_index
                    && self
                        .session
                        .participant(id)
                        .map(|p| p.is_active() && !p.has_final_roll())
                        .unwrap_or(false)
            })
            .map(|(idx, _)| idx)
    }

    /// Продвинуть конвейер после выхода участника: этап, который ждал
    /// именно его, не должен застрять.
    fn resume_after_departure(&mut self, out: &mut OpOutput) -> Result<(), EngineError> {
        match self.session.phase {
            Phase::Waiting | Phase::GameEnd => return Ok(()),
            _ => {}
        }

        // Игра не продолжается, когда активных <= 1.
        if self.session.active_count() <= 1
            && matches!(
                self.session.phase,
                Phase::Betting | Phase::PlayerRoll | Phase::DealerRoll | Phase::InterruptWindow
            )
        {
            out.push_timers(self.timers.cancel(TimerPurpose::InterruptWindow));
            return self.end_game(out);
        }

        match self.session.phase {
            Phase::Betting => {
                if self.betting_remaining() == 0 {
                    self.set_phase(Phase::PlayerRoll)?;
                    if let Some(idx) = self.next_pending_roller() {
                        self.session.roller_index = idx;
                    } else {
                        self.advance_rolling(out)?;
                    }
                }
            }
            Phase::PlayerRoll => {
                // Текущий бросающий мог выбыть.
                let current_active = self
                    .session
                    .roll_order
                    .get(self.session.roller_index)
                    .and_then(|id| self.session.participant(id))
                    .map(|p| p.is_active() && !p.has_final_roll())
                    .unwrap_or(false);
                if !current_active {
                    self.advance_rolling(out)?;
                }
            }
            Phase::DealerRoll => {
                let dealer_gone = self
                    .session
                    .dealer_id()
                    .and_then(|d| self.session.participant(d))
                    .map(|p| !p.is_active() && !p.has_final_roll())
                    .unwrap_or(true);
                if dealer_gone {
                    // Дилер выбыл, не бросив: автопроигрыш дома.
                    if let Some(d) = self.session.dealer_id().cloned() {
                        if let Some(p) = self.session.participant_mut(&d) {
                            p.roll_forfeited = true;
                        }
                    }
                    self.set_phase(Phase::Result)?;
                    self.compute_results(out)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Множитель способности стороны при расчёте. Отличный от единицы
    /// множитель — это срабатывание: учёт и видимый эффект.
    fn result_factor(
        &mut self,
        id: &ParticipantId,
        won: bool,
        own: &Hand,
        opponent: &Hand,
        out: &mut OpOutput,
    ) -> f64 {
        let hit = match self
            .session
            .participant_mut(id)
            .and_then(|p| p.ability.as_mut())
        {
            Some(a) if a.is_usable() => {
                let f = a.on_result(won, own, opponent);
                if (f - 1.0).abs() > f64::EPSILON {
                    a.mark_used();
                }
                Some((f, a.kind))
            }
            _ => None,
        };
        let Some((factor, kind)) = hit else {
            return 1.0;
        };

        if (factor - 1.0).abs() > f64::EPSILON {
            let spec = kind.spec();
            if !spec.covert {
                out.push(Outbound::broadcast(Notification::SkillVisualEffect {
                    participant_id: id.clone(),
                    skill_id: spec.id.to_string(),
                    effect: format!("x{}", factor),
                }));
            }
        }
        factor
    }

    /// Скрытая активация пассивной способности: учёт и запись в журнал.
    fn note_covert_activation(&mut self, id: &ParticipantId, _out: &mut OpOutput) {
        let Some(kind) = self
            .session
            .participant(id)
            .and_then(|p| p.ability.as_ref())
            .map(|a| a.kind)
        else {
            return;
        };
        if let Some(a) = self
            .session
            .participant_mut(id)
            .and_then(|p| p.ability.as_mut())
        {
            a.mark_used();
        }
        let spec = kind.spec();
        if spec.covert {
            let round = self.session.round;
            self.session
                .ledger
                .log_activation(id.clone(), spec.id.to_string(), round, now_ms());
        }
    }

    fn reroll_attempts_of(&self, id: &ParticipantId) -> u8 {
        self.session
            .participant(id)
            .map(|p| p.reroll_attempts)
            .unwrap_or(0)
    }

    /// Хост ушёл — право старта переходит первому по порядку бросков.
    fn reassign_host(&mut self) {
        let next = self
            .session
            .roll_order
            .iter()
            .find(|id| {
                self.session
                    .participant(id)
                    .map(|p| p.connected)
                    .unwrap_or(false)
            })
            .cloned();
        if let Some(next) = next {
            self.session.host = next;
        }
    }
}

/// Unix-время в миллисекундах для журнала активаций.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
