use async_trait::async_trait;
use wger_client::{ExerciseName, WgerClient, WgerError};

/// Producer of the projected exercise-name list for one language.
#[async_trait]
pub trait ExerciseSource: Send + Sync {
    async fn exercise_names(&self, language: u32) -> Result<Vec<ExerciseName>, WgerError>;
}

#[async_trait]
impl ExerciseSource for WgerClient {
    async fn exercise_names(&self, language: u32) -> Result<Vec<ExerciseName>, WgerError> {
        self.get_exercise_names(language).await
    }
}
