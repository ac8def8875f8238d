//! Wire types for the wger REST API and the derived name view.

use serde::{Deserialize, Serialize};

/// Category label used when an exercise has no category upstream.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Token pair returned by `POST /token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Body returned by `POST /token/refresh/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedAccess {
    pub access: String,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: u64,
    /// Absolute URL of the next page; `None` on the last page.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseCategory {
    pub id: u64,
    pub name: String,
}

/// Exercise record as served by `GET /exercise/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category: Option<ExerciseCategory>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub muscles: Vec<u64>,
    #[serde(default)]
    pub muscles_secondary: Vec<u64>,
    #[serde(default)]
    pub equipment: Vec<u64>,
    #[serde(default)]
    pub language: Option<u64>,
    #[serde(default)]
    pub license: Option<u64>,
    #[serde(default)]
    pub license_author: Option<String>,
    #[serde(default)]
    pub variations: Vec<u64>,
}

/// Simplified `{id, name, category}` projection served to our own callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseName {
    pub id: u64,
    pub name: String,
    pub category: String,
}

impl From<Exercise> for ExerciseName {
    fn from(exercise: Exercise) -> Self {
        Self {
            id: exercise.id,
            name: exercise.name,
            category: exercise
                .category
                .map(|c| c.name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserialization() {
        let body = r#"{
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{"id": 7, "name": "Squat", "category": {"id": 1, "name": "Legs"}}]
        }"#;

        let page: Paginated<Exercise> = serde_json::from_str(body).unwrap();
        assert_eq!(page.count, 1);
        assert!(page.next.is_none());
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].name, "Squat");
        assert!(page.results[0].muscles.is_empty());
    }

    #[test]
    fn test_projection_keeps_category_name() {
        let exercise: Exercise = serde_json::from_str(
            r#"{"id": 7, "name": "Squat", "category": {"id": 1, "name": "Legs"}}"#,
        )
        .unwrap();

        assert_eq!(
            ExerciseName::from(exercise),
            ExerciseName {
                id: 7,
                name: "Squat".to_string(),
                category: "Legs".to_string(),
            }
        );
    }

    #[test]
    fn test_projection_defaults_missing_category() {
        let exercise: Exercise =
            serde_json::from_str(r#"{"id": 7, "name": "Squat", "category": null}"#).unwrap();

        let name = ExerciseName::from(exercise);
        assert_eq!(name.category, UNCATEGORIZED);
    }

    #[test]
    fn test_projection_serializes_flat() {
        let name = ExerciseName {
            id: 3,
            name: "Bench Press".to_string(),
            category: "Chest".to_string(),
        };
        let json = serde_json::to_value(&name).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "name": "Bench Press", "category": "Chest"})
        );
    }
}
