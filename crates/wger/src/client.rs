//! Paginated fetcher for the wger listing endpoints.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::auth::TokenAuthenticator;
use crate::error::{Result, WgerError};
use crate::models::{Exercise, ExerciseName, Paginated};

/// Public wger instance.
pub const DEFAULT_BASE_URL: &str = "https://wger.de/api/v2";

/// wger language id for English.
pub const DEFAULT_LANGUAGE: u32 = 2;

const EXERCISE_RESOURCE: &str = "exercise";

/// Walks paginated upstream resources using the shared credential session.
#[derive(Clone)]
pub struct WgerClient {
    client: Client,
    auth: Arc<TokenAuthenticator>,
}

impl WgerClient {
    pub fn new(client: Client, auth: Arc<TokenAuthenticator>) -> Self {
        Self { client, auth }
    }

    /// Fetch every record of `resource` matching `params`, across all pages.
    ///
    /// Records keep upstream page order. A 401 triggers one refresh and one
    /// retry of the same page; a second 401 on that page, or any other
    /// non-success status, fails the whole call and drops what was collected.
    #[instrument(skip(self, params))]
    pub async fn fetch_all<T>(&self, resource: &str, params: &[(&str, String)]) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        if !self.auth.has_access_token() {
            self.auth.initialize_authentication().await?;
        }

        let mut records: Vec<T> = Vec::new();
        let mut next_url = Some(self.first_page_url(resource, params)?.to_string());
        let mut retried_page = false;
        let mut pages = 0usize;

        while let Some(url) = next_url.take() {
            let response = self.send_page(&url).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !retried_page {
                retried_page = true;
                drop(response);
                let outcome = self.auth.refresh_token_if_needed().await?;
                debug!(%url, ?outcome, "Access token rejected; retrying page");
                // Retry the same page.
                next_url = Some(url);
                continue;
            }

            if !status.is_success() {
                warn!(%status, %url, pages, "Upstream page request failed");
                return Err(WgerError::Upstream { status, url });
            }

            let page: Paginated<T> = response
                .json()
                .await
                .map_err(|e| WgerError::Parse(e.to_string()))?;

            pages += 1;
            records.extend(page.results);
            next_url = page.next;
            retried_page = false;
        }

        info!(pages, records = records.len(), "Fetched paginated resource");
        Ok(records)
    }

    pub async fn get_all_exercises(&self, params: &[(&str, String)]) -> Result<Vec<Exercise>> {
        self.fetch_all(EXERCISE_RESOURCE, params).await
    }

    /// All exercises in `language`, projected to the `{id, name, category}` view.
    pub async fn get_exercise_names(&self, language: u32) -> Result<Vec<ExerciseName>> {
        let exercises = self
            .get_all_exercises(&[("language", language.to_string())])
            .await?;

        Ok(exercises.into_iter().map(ExerciseName::from).collect())
    }

    fn first_page_url(&self, resource: &str, params: &[(&str, String)]) -> Result<Url> {
        let base = format!(
            "{}/{}/",
            self.auth.base_url(),
            resource.trim_matches('/')
        );
        let url = Url::parse_with_params(&base, params.iter().map(|(k, v)| (*k, v.as_str())))?;
        Ok(url)
    }

    async fn send_page(&self, url: &str) -> Result<Response> {
        let mut request = self.client.get(url);
        if let Some(token) = self.auth.access_token() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(request.send().await?)
    }
}
