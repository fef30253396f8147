use tracing::warn;

use crate::engine::RandomSource;

use super::{Ability, AbilityKind, ALL_ABILITY_KINDS};

/// Каталог способностей: регистрация по идентификатору и случайный выбор.
#[derive(Clone, Debug)]
pub struct AbilityCatalog {
    registered: Vec<AbilityKind>,
}

impl AbilityCatalog {
    /// Каталог со всеми встроенными способностями.
    pub fn standard() -> Self {
        Self {
            registered: ALL_ABILITY_KINDS.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Создать экземпляр по строковому id.
    pub fn instantiate(&self, id: &str) -> Option<Ability> {
        self.registered
            .iter()
            .copied()
            .find(|k| k.spec().id == id)
            .map(Ability::new)
    }

    /// Выбрать `count` способностей равномерно случайно.
    ///
    /// Без повторов (по умолчанию) запрос больше размера каталога
    /// срезается до доступного количества — это предупреждение,
    /// а не ошибка.
    pub fn draw<R: RandomSource>(
        &self,
        rng: &mut R,
        count: usize,
        with_replacement: bool,
    ) -> Vec<Ability> {
        if self.registered.is_empty() {
            return Vec::new();
        }

        if with_replacement {
            return (0..count)
                .map(|_| {
                    let idx = rng.pick(self.registered.len());
                    Ability::new(self.registered[idx])
                })
                .collect();
        }

        let capped = if count > self.registered.len() {
            warn!(
                requested = count,
                available = self.registered.len(),
                "запрошено больше способностей, чем зарегистрировано; срезаем"
            );
            self.registered.len()
        } else {
            count
        };

        // Несмещённая выборка без повторов: тасуем копию и берём префикс.
        let mut pool = self.registered.clone();
        rng.shuffle(&mut pool);
        pool.truncate(capped);
        pool.into_iter().map(Ability::new).collect()
    }
}
