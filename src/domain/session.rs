use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ability::{AbilityKind, ContinuationKind};
use crate::arbitration::AccusationLedger;
use crate::domain::config::SessionConfig;
use crate::domain::participant::Participant;
use crate::domain::{ParticipantId, RoomCode, RoundNo};

/// Фаза конечного автомата сессии.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Лобби: ждём участников и старта.
    Waiting,
    /// Раздача способностей (может быть no-op по конфигу).
    AbilityDistribution,
    /// Все не-дилеры делают ставки.
    Betting,
    /// Не-дилеры бросают по фиксированному порядку.
    PlayerRoll,
    /// Дилер бросает последним.
    DealerRoll,
    /// Окно обвинения после каждого отдельного броска.
    InterruptWindow,
    /// Конвейер приостановлен: ждём решения человека по способности.
    WaitingForAction,
    /// Сравнение рук и перевод фишек.
    Result,
    /// Итоги раунда: кулдауны, банкроты, ротация дилера, бонус сета.
    RoundEnd,
    /// Игра окончена, итоговый рейтинг посчитан.
    GameEnd,
}

/// Единственное отложенное решение по способности.
///
/// Живёт в сессии максимум в одном экземпляре и потребляется ровно один
/// раз: либо явным выбором, либо таймаутом.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingAbilityAction {
    /// Кто принимает решение.
    pub participant_id: ParticipantId,
    pub ability_kind: AbilityKind,
    /// Кости до решения (снимок).
    pub prior_dice: Vec<u8>,
    pub prompt: String,
    pub options: Vec<String>,
    pub timeout_secs: u64,
    /// Тегированное продолжение (см. `ability::resolve_continuation`).
    pub continuation: ContinuationKind,
    /// Фаза, из которой конвейер был приостановлен.
    pub resume: Phase,
}

/// Полное состояние одной игровой сессии.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub code: RoomCode,
    /// Создатель комнаты; только он может стартовать игру.
    pub host: ParticipantId,
    pub config: SessionConfig,
    pub phase: Phase,

    /// Порядок бросков. До старта — порядок входа, на старте игры
    /// перемешивается один раз и больше не меняется.
    pub roll_order: Vec<ParticipantId>,
    /// Индекс дилера в roll_order.
    pub dealer_index: usize,
    /// Индекс текущего бросающего не-дилера в roll_order.
    pub roller_index: usize,
    /// Номер раунда (с 1, 0 = игра не идёт).
    pub round: RoundNo,
    /// Сколько полных кругов дилера сыграно.
    pub set_count: u32,
    /// Индекс дилера, с которого начался текущий сет.
    pub set_start_dealer: usize,

    pub participants: HashMap<ParticipantId, Participant>,
    pub ledger: AccusationLedger,
    /// Максимум одно отложенное решение на сессию.
    pub pending: Option<PendingAbilityAction>,
}

impl Session {
    pub fn new(
        code: RoomCode,
        host_id: ParticipantId,
        host_name: String,
        config: SessionConfig,
    ) -> Self {
        let mut participants = HashMap::new();
        participants.insert(
            host_id.clone(),
            Participant::new(host_id.clone(), host_name),
        );

        Self {
            code,
            host: host_id.clone(),
            config,
            phase: Phase::Waiting,
            roll_order: vec![host_id],
            dealer_index: 0,
            roller_index: 0,
            round: 0,
            set_count: 0,
            set_start_dealer: 0,
            participants,
            ledger: AccusationLedger::new(),
            pending: None,
        }
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn participant_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    /// Текущий дилер.
    pub fn dealer_id(&self) -> Option<&ParticipantId> {
        self.roll_order.get(self.dealer_index)
    }

    /// Активные участники в порядке бросков.
    pub fn active_ids(&self) -> Vec<ParticipantId> {
        self.roll_order
            .iter()
            .filter(|id| {
                self.participants
                    .get(*id)
                    .map(|p| p.is_active())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Активные не-дилеры в порядке бросков.
    pub fn active_challenger_ids(&self) -> Vec<ParticipantId> {
        let dealer = self.dealer_id().cloned();
        self.active_ids()
            .into_iter()
            .filter(|id| Some(id) != dealer.as_ref())
            .collect()
    }

    /// Сколько активных участников осталось.
    pub fn active_count(&self) -> usize {
        self.active_ids().len()
    }
}
