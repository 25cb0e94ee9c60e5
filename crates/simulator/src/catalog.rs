//! Fixed set of habit templates the simulator draws from.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Categories a template can be drawn from.
pub const CATEGORIES: [&str; 4] = ["health", "work", "personal", "learning"];

/// Default number of templates.
pub const DEFAULT_CATALOG_SIZE: usize = 20;

/// A candidate habit definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// 1-5 scale.
    pub difficulty: u8,
}

/// Immutable catalog, generated once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: Vec<TaskTemplate>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Generate `size` templates `task_1..task_<size>` with random category
    /// and difficulty.
    pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let templates = (1..=size)
            .map(|i| TaskTemplate {
                id: format!("task_{i}"),
                name: format!("Task {i}"),
                description: format!("Description for task {i}"),
                category: CATEGORIES
                    .choose(rng)
                    .copied()
                    .unwrap_or(CATEGORIES[0])
                    .to_string(),
                difficulty: rng.gen_range(1..=5),
            })
            .collect();
        Self::from_templates(templates)
    }

    /// Generate from a fixed seed, or from OS entropy when `seed` is `None`.
    pub fn seeded(size: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::generate(size, &mut rng)
    }

    /// Build a catalog from explicit templates. Later duplicates of an id are ignored.
    pub fn from_templates(templates: Vec<TaskTemplate>) -> Self {
        let mut by_id = HashMap::with_capacity(templates.len());
        let mut kept = Vec::with_capacity(templates.len());
        for t in templates {
            if by_id.contains_key(&t.id) {
                continue;
            }
            by_id.insert(t.id.clone(), kept.len());
            kept.push(t);
        }
        Self {
            templates: kept,
            by_id,
        }
    }

    pub fn get(&self, id: &str) -> Option<&TaskTemplate> {
        self.by_id.get(id).map(|&i| &self.templates[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Templates in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use habit_core::validation::is_rating;

    use super::*;

    #[test]
    fn generates_numbered_templates() {
        let catalog = Catalog::seeded(DEFAULT_CATALOG_SIZE, Some(7));
        assert_eq!(catalog.len(), 20);

        let first = catalog.iter().next().unwrap();
        assert_eq!(first.id, "task_1");
        assert_eq!(first.name, "Task 1");
        assert_eq!(first.description, "Description for task 1");
        assert!(catalog.contains("task_20"));
        assert!(!catalog.contains("task_21"));

        for t in catalog.iter() {
            assert!(CATEGORIES.contains(&t.category.as_str()));
            assert!(is_rating(t.difficulty));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a: Vec<_> = Catalog::seeded(20, Some(42)).iter().cloned().collect();
        let b: Vec<_> = Catalog::seeded(20, Some(42)).iter().cloned().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn lookup_by_id() {
        let catalog = Catalog::seeded(3, Some(1));
        assert_eq!(catalog.get("task_2").map(|t| t.name.as_str()), Some("Task 2"));
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let t = |name: &str| TaskTemplate {
            id: "x".into(),
            name: name.into(),
            description: String::new(),
            category: "work".into(),
            difficulty: 2,
        };
        let catalog = Catalog::from_templates(vec![t("first"), t("second")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("x").unwrap().name, "first");
    }
}
