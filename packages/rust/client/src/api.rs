//! Typed calls against the content API.
//!
//! All requests go through the session's shared client, so the auth headers
//! and the connection pool are reused across the whole walk.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use bookmirror_shared::{BookEdition, ExerciseDetail, MirrorError, Result};

/// Client for the book edition and exercise endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    content_base: String,
}

impl ApiClient {
    /// Wrap an authenticated client with the content API base URL.
    pub fn new(http: Client, content_base_url: impl Into<String>) -> Self {
        let content_base = content_base_url
            .into()
            .trim_end_matches('/')
            .to_string();
        Self { http, content_base }
    }

    /// Root resolver: fetch the book-level payload with the output root name
    /// and the chapter tree.
    pub async fn fetch_book_edition(&self, book_id: u64) -> Result<BookEdition> {
        let url = format!("{}/api/v2/books/bookEdition/{book_id}", self.content_base);
        self.get_json(&url).await
    }

    /// Fetch the detail payload for one question's exercise.
    pub async fn fetch_exercise(&self, exercise_id: u64) -> Result<ExerciseDetail> {
        let url = format!("{}/api/v2/books/bookExercise/{exercise_id}", self.content_base);
        self.get_json(&url).await
    }

    /// GET a URL and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "fetching");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MirrorError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| MirrorError::Decode(format!("{url}: {e}")))
    }
}
