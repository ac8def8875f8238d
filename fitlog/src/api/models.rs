//! API request and response bodies.

use serde::{Deserialize, Serialize};
use wger_client::DEFAULT_LANGUAGE;

/// `?language=` query parameter.
///
/// Kept as a raw string so that malformed values fall back to the default
/// language instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageQuery {
    pub language: Option<String>,
}

impl LanguageQuery {
    /// The requested language, or the default when absent, malformed or zero.
    pub fn resolve(&self) -> u32 {
        self.language
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|&language| language != 0)
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// Body of `POST /api/exercise-names`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub components: Vec<ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: Option<&str>) -> LanguageQuery {
        LanguageQuery {
            language: raw.map(str::to_string),
        }
    }

    #[test]
    fn test_language_resolution() {
        assert_eq!(query(None).resolve(), 2);
        assert_eq!(query(Some("1")).resolve(), 1);
        assert_eq!(query(Some(" 12 ")).resolve(), 12);
        assert_eq!(query(Some("0")).resolve(), 2);
        assert_eq!(query(Some("english")).resolve(), 2);
        assert_eq!(query(Some("-3")).resolve(), 2);
    }

    #[test]
    fn test_component_message_omitted_when_absent() {
        let component = ComponentHealth {
            name: "exercise_cache".to_string(),
            status: "healthy".to_string(),
            message: None,
        };
        let json = serde_json::to_string(&component).unwrap();
        assert!(!json.contains("message"));
    }
}
