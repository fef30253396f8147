use serde::{Deserialize, Serialize};

use crate::domain::{ParticipantId, RoundNo};

/// Запись о скрытой активации способности.
///
/// Создаётся в момент срабатывания covert-способности; никогда не
/// удаляется до конца игры (нужна для итогового отчёта).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheatRecord {
    /// Кто применил способность.
    pub actor: ParticipantId,
    /// Идентификатор способности (`AbilitySpec::id`).
    pub ability_id: String,
    /// В каком раунде.
    pub round: RoundNo,
    /// Unix-время активации, мс. Заполняет оркестратор.
    pub timestamp_ms: u64,
    /// Разобрана ли запись успешным обвинением.
    pub resolved: bool,
    /// Кто уличил (если resolved).
    pub accuser: Option<ParticipantId>,
}

/// Вердикт по обвинению.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccusationVerdict {
    /// Обвинение попало: запись помечена, возвращаем id способности
    /// (по нему считается штраф).
    Hit { ability_id: String },
    /// Неразобранной записи нет — обвинение ложное.
    Miss,
}

/// Журнал скрытых активаций одной сессии.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccusationLedger {
    pub records: Vec<CheatRecord>,
}

impl AccusationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Зафиксировать скрытую активацию.
    pub fn log_activation(
        &mut self,
        actor: ParticipantId,
        ability_id: String,
        round: RoundNo,
        timestamp_ms: u64,
    ) {
        self.records.push(CheatRecord {
            actor,
            ability_id,
            round,
            timestamp_ms,
            resolved: false,
            accuser: None,
        });
    }

    /// Есть ли у участника неразобранная активация в раунде.
    pub fn has_unresolved(&self, target: &ParticipantId, round: RoundNo) -> bool {
        self.records
            .iter()
            .any(|r| !r.resolved && r.actor == *target && r.round == round)
    }

    /// Разобрать обвинение: первая неразобранная запись цели в раунде
    /// помечается resolved ровно один раз. Повторное обвинение той же
    /// записи — промах.
    pub fn adjudicate(
        &mut self,
        accuser: &ParticipantId,
        target: &ParticipantId,
        round: RoundNo,
    ) -> AccusationVerdict {
        let found = self
            .records
            .iter_mut()
            .find(|r| !r.resolved && r.actor == *target && r.round == round);

        match found {
            Some(record) => {
                record.resolved = true;
                record.accuser = Some(accuser.clone());
                AccusationVerdict::Hit {
                    ability_id: record.ability_id.clone(),
                }
            }
            None => AccusationVerdict::Miss,
        }
    }

    /// Снимок журнала для итогового отчёта (game_ended).
    pub fn all(&self) -> &[CheatRecord] {
        &self.records
    }
}
