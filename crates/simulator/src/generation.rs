//! The generation loop: pick an active template, create a habit from it,
//! then record a completion for that habit.

use std::sync::Arc;

use chrono::NaiveTime;
use habit_core::model::{Frequency, NewCompletion, NewHabit};
use habit_core::{new_ulid, now_utc};
use rand::Rng;
use tracing::debug;

use crate::catalog::TaskTemplate;
use crate::controller::Shared;
use crate::store_client::ActivityStore;

/// Target time attached to generated habits.
pub const TARGET_TIME: (u32, u32, u32) = (9, 0, 0);

/// Deregisters the loop if it is dropped before reaching a stopping
/// checkpoint.
struct Registration<S> {
    shared: Arc<Shared<S>>,
    armed: bool,
}

impl<S> Drop for Registration<S> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.abandon();
        }
    }
}

pub(crate) async fn run<S: ActivityStore>(shared: Arc<Shared<S>>) {
    debug!("generation loop started");
    let mut registration = Registration {
        shared,
        armed: true,
    };
    let shared = Arc::clone(&registration.shared);
    loop {
        let Some(interval) = shared.checkpoint() else { break };
        shared.idle(interval).await;
        if shared.checkpoint().is_none() {
            break;
        }
        let Some(task) = shared.pick_active() else {
            continue;
        };
        run_cycle(&shared, &task).await;
        shared.record_event(now_utc());
    }
    // Both exits above went through a checkpoint that already deregistered.
    registration.armed = false;
    debug!("generation loop exited");
}

async fn run_cycle<S: ActivityStore>(shared: &Shared<S>, task: &TaskTemplate) {
    shared.push_log(&format!("Creating habit '{}' ({})", task.name, task.id));

    let habit = habit_payload(task);
    let habit_id = match shared.store.create_habit(&habit).await {
        Ok(id) => id,
        Err(e) => {
            shared.push_log(&format!("Failed to create habit '{}': {e}", task.name));
            return;
        }
    };

    let completion = completion_payload(task, &habit_id);
    match shared.store.record_completion(&completion).await {
        Ok(()) => shared.push_log(&format!(
            "Successfully completed habit '{}' ({habit_id})",
            task.name
        )),
        Err(e) => shared.push_log(&format!(
            "Failed to record completion for '{}': {e}",
            task.name
        )),
    }
}

/// New habit built from a template. Template fields are copied verbatim.
pub fn habit_payload(task: &TaskTemplate) -> NewHabit {
    let (h, m, s) = TARGET_TIME;
    NewHabit {
        id: format!("habit_{}", new_ulid()),
        name: task.name.clone(),
        description: task.description.clone(),
        frequency: Frequency::Daily,
        target_time: NaiveTime::from_hms_opt(h, m, s),
        created_at: now_utc(),
        difficulty: task.difficulty,
        category: task.category.clone(),
    }
}

/// Completion for a freshly created habit, with random mood and difficulty.
pub fn completion_payload(task: &TaskTemplate, habit_id: &str) -> NewCompletion {
    let mut rng = rand::thread_rng();
    NewCompletion {
        habit_id: habit_id.to_string(),
        completed_at: now_utc(),
        notes: Some(format!("Automated completion for {}", task.name)),
        mood: Some(rng.gen_range(1..=5)),
        difficulty: Some(rng.gen_range(1..=5)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habit_core::validation::{validate_new_completion, validate_new_habit};

    fn template() -> TaskTemplate {
        TaskTemplate {
            id: "task_3".into(),
            name: "Task 3".into(),
            description: "Description for task 3".into(),
            category: "learning".into(),
            difficulty: 4,
        }
    }

    #[test]
    fn habit_payload_copies_template() {
        let habit = habit_payload(&template());
        assert!(habit.id.starts_with("habit_"));
        assert_eq!(habit.name, "Task 3");
        assert_eq!(habit.description, "Description for task 3");
        assert_eq!(habit.category, "learning");
        assert_eq!(habit.difficulty, 4);
        assert_eq!(habit.frequency, Frequency::Daily);
        assert_eq!(habit.target_time, NaiveTime::from_hms_opt(9, 0, 0));
        validate_new_habit(&habit).unwrap();
    }

    #[test]
    fn habit_ids_are_unique() {
        let a = habit_payload(&template());
        let b = habit_payload(&template());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn completion_payload_ratings_in_range() {
        for _ in 0..50 {
            let c = completion_payload(&template(), "habit_x");
            assert_eq!(c.habit_id, "habit_x");
            assert_eq!(c.notes.as_deref(), Some("Automated completion for Task 3"));
            assert!((1..=5).contains(&c.mood.unwrap()));
            assert!((1..=5).contains(&c.difficulty.unwrap()));
            validate_new_completion(&c).unwrap();
        }
    }
}
