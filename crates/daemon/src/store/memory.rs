use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use habit_core::model::{Habit, HabitCompletion, NewCompletion};

use crate::tracker;

use super::{sort_completions, sort_habits, Counts, Store, StoreError, UserRecord};

/// In-memory store. Not durable; used by tests and `--in-memory`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    habits: HashMap<String, Habit>,
    completions: Vec<HabitCompletion>,
    next_completion_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {}", user.id)));
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    fn insert_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.habits.contains_key(&habit.id) {
            return Err(StoreError::Conflict(format!("habit {}", habit.id)));
        }
        inner.habits.insert(habit.id.clone(), habit.clone());
        Ok(())
    }

    fn get_habit(&self, id: &str) -> Result<Option<Habit>, StoreError> {
        Ok(self.lock()?.habits.get(id).cloned())
    }

    fn list_habits(&self, user_id: Option<&str>) -> Result<Vec<Habit>, StoreError> {
        let inner = self.lock()?;
        let mut habits: Vec<Habit> = inner
            .habits
            .values()
            .filter(|h| user_id.map_or(true, |u| h.user_id.as_deref() == Some(u)))
            .cloned()
            .collect();
        sort_habits(&mut habits);
        Ok(habits)
    }

    fn deactivate_habit(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        match inner.habits.get_mut(id) {
            Some(h) => {
                h.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn record_completion(
        &self,
        completion: &NewCompletion,
    ) -> Result<(HabitCompletion, Habit), StoreError> {
        let mut inner = self.lock()?;
        let habit = inner
            .habits
            .get(&completion.habit_id)
            .ok_or_else(|| StoreError::NotFound(format!("habit {}", completion.habit_id)))?;
        if !habit.is_active {
            return Err(StoreError::Inactive(format!("habit {}", habit.id)));
        }
        let mut habit = habit.clone();

        inner.next_completion_id += 1;
        let stored = HabitCompletion::from_new(inner.next_completion_id, completion.clone());
        inner.completions.push(stored.clone());
        let total = inner
            .completions
            .iter()
            .filter(|c| c.habit_id == habit.id)
            .count();

        tracker::apply_completion(&mut habit, stored.completed_at, total);
        inner.habits.insert(habit.id.clone(), habit.clone());
        Ok((stored, habit))
    }

    fn list_completions(&self, habit_id: &str) -> Result<Vec<HabitCompletion>, StoreError> {
        let inner = self.lock()?;
        let mut out: Vec<HabitCompletion> = inner
            .completions
            .iter()
            .filter(|c| c.habit_id == habit_id)
            .cloned()
            .collect();
        sort_completions(&mut out);
        Ok(out)
    }

    fn counts(&self) -> Result<Counts, StoreError> {
        let inner = self.lock()?;
        Ok(Counts {
            users: inner.users.len() as u64,
            habits: inner.habits.len() as u64,
            completions: inner.completions.len() as u64,
        })
    }
}
