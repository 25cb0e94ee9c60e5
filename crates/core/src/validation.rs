use thiserror::Error;

use crate::model::{NewCompletion, NewHabit, NewUser};

/// Lowest value on the 1-5 rating scales (difficulty, mood).
pub const RATING_MIN: u8 = 1;
/// Highest value on the 1-5 rating scales (difficulty, mood).
pub const RATING_MAX: u8 = 5;

/// Reason a payload was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace.
    #[error("{0} must not be empty")]
    Blank(&'static str),
    /// A rating is outside the 1-5 scale.
    #[error("{field} must be between 1 and 5, got {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: u8,
    },
}

/// Returns true if `value` is on the 1-5 scale.
pub fn is_rating(value: u8) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&value)
}

fn non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(())
}

fn rating(field: &'static str, value: u8) -> Result<(), ValidationError> {
    if !is_rating(value) {
        return Err(ValidationError::OutOfRange { field, value });
    }
    Ok(())
}

/// Validate a habit creation payload.
pub fn validate_new_habit(habit: &NewHabit) -> Result<(), ValidationError> {
    non_blank("id", &habit.id)?;
    non_blank("name", &habit.name)?;
    rating("difficulty", habit.difficulty)
}

/// Validate a completion payload. Ratings are optional but bounded when present.
pub fn validate_new_completion(completion: &NewCompletion) -> Result<(), ValidationError> {
    non_blank("habit_id", &completion.habit_id)?;
    if let Some(mood) = completion.mood {
        rating("mood", mood)?;
    }
    if let Some(difficulty) = completion.difficulty {
        rating("difficulty", difficulty)?;
    }
    Ok(())
}

/// Validate a user creation payload.
pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationError> {
    non_blank("id", &user.id)?;
    non_blank("name", &user.name)?;
    non_blank("timezone", &user.timezone)
}
