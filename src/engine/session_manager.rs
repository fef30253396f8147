//! Реестр активных сессий: создание по коду комнаты, поиск, уборка.

use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use crate::domain::config::SessionConfig;
use crate::domain::session::Session;
use crate::domain::{ParticipantId, RoomCode};

use super::orchestrator::SessionOrchestrator;
use super::RandomSource;

/// Ошибки реестра сессий.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("Код комнаты {0} уже занят")]
    CodeTaken(RoomCode),

    #[error("Комната {0} не найдена")]
    NotFound(RoomCode),
}

/// Владелец всех оркестраторов процесса.
///
/// Сам по себе не потокобезопасен: предполагается единственный владелец
/// (актор runtime-слоя), который сериализует все операции.
pub struct SessionManager<R: RandomSource> {
    sessions: HashMap<RoomCode, SessionOrchestrator<R>>,
}

impl<R: RandomSource> SessionManager<R> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Создать сессию. Создатель сразу становится её участником и хостом.
    pub fn create(
        &mut self,
        code: RoomCode,
        host_id: ParticipantId,
        host_name: String,
        config: SessionConfig,
        rng: R,
    ) -> Result<&mut SessionOrchestrator<R>, ManagerError> {
        if self.sessions.contains_key(&code) {
            return Err(ManagerError::CodeTaken(code));
        }
        info!(session = %code, host = %host_id, "сессия создана");
        let session = Session::new(code.clone(), host_id, host_name, config);
        let orchestrator = SessionOrchestrator::new(session, rng);
        Ok(self.sessions.entry(code).or_insert(orchestrator))
    }

    pub fn get(&self, code: &RoomCode) -> Result<&SessionOrchestrator<R>, ManagerError> {
        self.sessions
            .get(code)
            .ok_or_else(|| ManagerError::NotFound(code.clone()))
    }

    pub fn get_mut(
        &mut self,
        code: &RoomCode,
    ) -> Result<&mut SessionOrchestrator<R>, ManagerError> {
        self.sessions
            .get_mut(code)
            .ok_or_else(|| ManagerError::NotFound(code.clone()))
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.sessions.contains_key(code)
    }

    pub fn remove(&mut self, code: &RoomCode) -> Option<SessionOrchestrator<R>> {
        let removed = self.sessions.remove(code);
        if removed.is_some() {
            info!(session = %code, "сессия удалена");
        }
        removed
    }

    /// Убрать сессию, если в ней никого не осталось. true = убрана.
    pub fn remove_if_empty(&mut self, code: &RoomCode) -> bool {
        let empty = self
            .sessions
            .get(code)
            .map(|o| o.session.participants.is_empty())
            .unwrap_or(false);
        if empty {
            self.remove(code);
        }
        empty
    }

    pub fn codes(&self) -> Vec<RoomCode> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<R: RandomSource> Default for SessionManager<R> {
    fn default() -> Self {
        Self::new()
    }
}
