use chrono::{NaiveTime, Utc};
use habit_core::model::{Frequency, NewCompletion, NewHabit, NewUser};
use habit_core::validation::{
    validate_new_completion, validate_new_habit, validate_new_user, ValidationError,
};

fn habit(difficulty: u8) -> NewHabit {
    NewHabit {
        id: "h1".into(),
        name: "Read".into(),
        description: "Read 10 pages".into(),
        frequency: Frequency::Daily,
        target_time: None,
        created_at: Utc::now(),
        difficulty,
        category: "learning".into(),
    }
}

#[test]
fn accepts_difficulty_scale_bounds() {
    assert!(validate_new_habit(&habit(1)).is_ok());
    assert!(validate_new_habit(&habit(5)).is_ok());
}

#[test]
fn rejects_difficulty_outside_scale() {
    for value in [0, 6, 200] {
        let err = validate_new_habit(&habit(value)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "difficulty",
                value
            }
        );
    }
}

#[test]
fn rejects_blank_name() {
    let mut h = habit(3);
    h.name = "   ".into();
    assert_eq!(validate_new_habit(&h), Err(ValidationError::Blank("name")));
}

#[test]
fn completion_ratings_are_optional_but_bounded() {
    let mut c = NewCompletion {
        habit_id: "h1".into(),
        completed_at: Utc::now(),
        notes: None,
        mood: None,
        difficulty: None,
    };
    assert!(validate_new_completion(&c).is_ok());

    c.mood = Some(0);
    assert!(matches!(
        validate_new_completion(&c),
        Err(ValidationError::OutOfRange { field: "mood", .. })
    ));

    c.mood = Some(4);
    c.difficulty = Some(9);
    assert!(matches!(
        validate_new_completion(&c),
        Err(ValidationError::OutOfRange { field: "difficulty", .. })
    ));
}

#[test]
fn user_requires_timezone() {
    let user = NewUser {
        id: "u1".into(),
        name: "Test User".into(),
        habits: vec![],
        preferred_notification_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        timezone: "".into(),
        created_at: Utc::now(),
    };
    assert_eq!(validate_new_user(&user), Err(ValidationError::Blank("timezone")));
}
