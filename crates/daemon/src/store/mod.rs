//! Persistence for users, habits and completions.

use chrono::{DateTime, NaiveTime, Utc};
use habit_core::model::{Habit, HabitCompletion, NewCompletion, NewUser};
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} is inactive")]
    Inactive(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// A stored user, without the habits attached to them.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub preferred_notification_time: NaiveTime,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl From<NewUser> for UserRecord {
    fn from(value: NewUser) -> Self {
        Self {
            id: value.id,
            name: value.name,
            preferred_notification_time: value.preferred_notification_time,
            timezone: value.timezone,
            created_at: value.created_at,
        }
    }
}

/// Row counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub users: u64,
    pub habits: u64,
    pub completions: u64,
}

/// Activity store backend.
///
/// Listing methods return habits ordered by creation time and completions
/// ordered by completion time, ties broken by id.
pub trait Store: Send + Sync {
    fn insert_user(&self, user: &UserRecord) -> Result<(), StoreError>;
    fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    fn insert_habit(&self, habit: &Habit) -> Result<(), StoreError>;
    fn get_habit(&self, id: &str) -> Result<Option<Habit>, StoreError>;
    fn list_habits(&self, user_id: Option<&str>) -> Result<Vec<Habit>, StoreError>;
    /// Soft delete. Returns false if the habit does not exist.
    fn deactivate_habit(&self, id: &str) -> Result<bool, StoreError>;

    /// Store a completion and apply it to the habit's streak, `last_completed`
    /// and success rate as one atomic step. Returns the stored completion and
    /// the updated habit.
    ///
    /// Fails with [`StoreError::NotFound`] for an unknown habit and
    /// [`StoreError::Inactive`] for a deactivated one; nothing is written then.
    fn record_completion(
        &self,
        completion: &NewCompletion,
    ) -> Result<(HabitCompletion, Habit), StoreError>;
    fn list_completions(&self, habit_id: &str) -> Result<Vec<HabitCompletion>, StoreError>;

    fn counts(&self) -> Result<Counts, StoreError>;
}

fn sort_habits(habits: &mut [Habit]) {
    habits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

fn sort_completions(completions: &mut [HabitCompletion]) {
    completions.sort_by(|a, b| {
        a.completed_at
            .cmp(&b.completed_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{TimeZone, Utc};
    use habit_core::model::{Frequency, Habit, NewCompletion};

    use super::*;

    pub fn user(id: &str) -> UserRecord {
        UserRecord {
            id: id.into(),
            name: "Test User".into(),
            preferred_notification_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            timezone: "UTC".into(),
            created_at: Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap(),
        }
    }

    pub fn habit(id: &str, user_id: Option<&str>, day: u32) -> Habit {
        Habit {
            id: id.into(),
            name: format!("Habit {id}"),
            description: "desc".into(),
            frequency: Frequency::Daily,
            target_time: NaiveTime::from_hms_opt(7, 0, 0),
            created_at: Utc.with_ymd_and_hms(2024, 4, day, 8, 0, 0).unwrap(),
            last_completed: None,
            streak: 0,
            success_rate: 0.0,
            difficulty: 3,
            category: "health".into(),
            user_id: user_id.map(String::from),
            is_active: true,
        }
    }

    pub fn completion(habit_id: &str, day: u32) -> NewCompletion {
        NewCompletion {
            habit_id: habit_id.into(),
            completed_at: Utc.with_ymd_and_hms(2024, 4, day, 18, 0, 0).unwrap(),
            notes: Some("done".into()),
            mood: Some(4),
            difficulty: Some(2),
        }
    }

    /// Behaviour every backend must share.
    pub fn exercise_store(store: &dyn Store) {
        store.insert_user(&user("u1")).unwrap();
        assert!(matches!(
            store.insert_user(&user("u1")),
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.get_user("u1").unwrap(), Some(user("u1")));
        assert!(store.get_user("nobody").unwrap().is_none());

        store.insert_habit(&habit("h2", Some("u1"), 3)).unwrap();
        store.insert_habit(&habit("h1", Some("u1"), 2)).unwrap();
        store.insert_habit(&habit("h3", None, 1)).unwrap();
        assert!(matches!(
            store.insert_habit(&habit("h1", None, 1)),
            Err(StoreError::Conflict(_))
        ));

        let mine: Vec<_> = store
            .list_habits(Some("u1"))
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(mine, vec!["h1", "h2"]);
        assert_eq!(store.list_habits(None).unwrap().len(), 3);

        let (second, h1) = store.record_completion(&completion("h1", 4)).unwrap();
        assert_eq!(h1.streak, 1);
        assert_eq!(h1.last_completed, Some(second.completed_at));
        // Backfilled completion: stored, but streak and last_completed stay put.
        let (first, h1) = store.record_completion(&completion("h1", 3)).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(h1.streak, 1);
        assert_eq!(h1.last_completed, Some(second.completed_at));
        assert_eq!(store.get_habit("h1").unwrap(), Some(h1));
        assert!(matches!(
            store.record_completion(&completion("ghost", 3)),
            Err(StoreError::NotFound(_))
        ));
        let listed = store.list_completions("h1").unwrap();
        assert_eq!(listed, vec![first.clone(), second.clone()]);
        assert!(store.list_completions("h2").unwrap().is_empty());

        assert!(store.deactivate_habit("h2").unwrap());
        assert!(!store.deactivate_habit("missing").unwrap());
        assert!(!store.get_habit("h2").unwrap().unwrap().is_active);
        assert!(matches!(
            store.record_completion(&completion("h2", 5)),
            Err(StoreError::Inactive(_))
        ));

        assert_eq!(
            store.counts().unwrap(),
            Counts {
                users: 1,
                habits: 3,
                completions: 2
            }
        );
    }
}
