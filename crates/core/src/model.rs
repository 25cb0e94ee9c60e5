use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// How often a habit is meant to be performed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Once per day.
    #[default]
    Daily,
    /// Once per 7 days.
    Weekly,
    /// Once per 30 days.
    Monthly,
}

impl Frequency {
    /// Length of one period in days.
    pub fn period_days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
        }
    }

    /// Stable string form used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Inverse of [`Frequency::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Habit creation payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewHabit {
    /// Client-chosen unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Defaults to daily.
    #[serde(default)]
    pub frequency: Frequency,
    /// Preferred time of day, `HH:MM:SS`.
    #[serde(default)]
    pub target_time: Option<NaiveTime>,
    /// Creation time; periods are counted from here.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    /// 1-5 scale.
    pub difficulty: u8,
    /// health, learning, work, ...
    pub category: String,
}

/// A stored habit with its tracking statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Habit {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Determines the streak period.
    pub frequency: Frequency,
    /// `HH:MM:SS`.
    #[serde(default)]
    pub target_time: Option<NaiveTime>,
    /// Creation time.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    /// Most recent completion time, if any.
    #[serde(default, with = "crate::timestamp::option")]
    pub last_completed: Option<DateTime<Utc>>,
    /// Consecutive periods with a completion.
    #[serde(default)]
    pub streak: u32,
    /// Completions per elapsed period, in `0.0..=1.0`.
    #[serde(default)]
    pub success_rate: f64,
    /// 1-5 scale.
    pub difficulty: u8,
    /// Grouping label, e.g. `health`.
    pub category: String,
    /// Owning user, if the habit was created for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// False once the habit is deleted.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Habit {
    /// Materialise a fresh habit from its creation payload.
    pub fn from_new(new: NewHabit, user_id: Option<String>) -> Self {
        Self {
            id: new.id,
            name: new.name,
            description: new.description,
            frequency: new.frequency,
            target_time: new.target_time,
            created_at: new.created_at,
            last_completed: None,
            streak: 0,
            success_rate: 0.0,
            difficulty: new.difficulty,
            category: new.category,
            user_id,
            is_active: true,
        }
    }
}

/// Completion recording payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCompletion {
    /// Habit being completed.
    pub habit_id: String,
    /// When it was done.
    #[serde(with = "crate::timestamp")]
    pub completed_at: DateTime<Utc>,
    /// Optional free text.
    #[serde(default)]
    pub notes: Option<String>,
    /// 1-5 scale.
    #[serde(default)]
    pub mood: Option<u8>,
    /// 1-5 scale.
    #[serde(default)]
    pub difficulty: Option<u8>,
}

/// A recorded completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HabitCompletion {
    /// Store-assigned, increasing.
    pub id: i64,
    /// Completed habit.
    pub habit_id: String,
    /// When it was done.
    #[serde(with = "crate::timestamp")]
    pub completed_at: DateTime<Utc>,
    /// Optional free text.
    #[serde(default)]
    pub notes: Option<String>,
    /// 1-5 scale.
    #[serde(default)]
    pub mood: Option<u8>,
    /// 1-5 scale.
    #[serde(default)]
    pub difficulty: Option<u8>,
}

impl HabitCompletion {
    /// Attach the store-assigned id to a payload.
    pub fn from_new(id: i64, new: NewCompletion) -> Self {
        Self {
            id,
            habit_id: new.habit_id,
            completed_at: new.completed_at,
            notes: new.notes,
            mood: new.mood,
            difficulty: new.difficulty,
        }
    }
}

/// User creation payload. `habits` is accepted for compatibility and ignored;
/// habits are attached through `POST /habits?user_id=`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUser {
    /// Client-chosen unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Ignored on input.
    #[serde(default)]
    pub habits: Vec<serde_json::Value>,
    /// Daily reminder time, `HH:MM:SS`.
    pub preferred_notification_time: NaiveTime,
    /// IANA name, e.g. `Europe/Berlin`.
    pub timezone: String,
    /// Registration time.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A user and the habits attached to them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Habits owned by the user, oldest first.
    pub habits: Vec<Habit>,
    /// Daily reminder time, `HH:MM:SS`.
    pub preferred_notification_time: NaiveTime,
    /// IANA zone name.
    pub timezone: String,
    /// Registration time.
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Aggregate statistics over a user's active habits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Analytics {
    /// User the figures belong to.
    pub user_id: String,
    /// Number of active habits.
    pub total_habits: usize,
    /// Mean success rate; 0 with no habits.
    pub average_success_rate: f64,
    /// Sum of current streaks.
    pub total_streaks: u64,
    /// Active habit count per category.
    pub habits_by_category: BTreeMap<String, usize>,
}
