//! HTTP implementation of [`RequestGateway`] backed by `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{RequestError, Result};
use crate::types::{AnalysisStatus, ErrorBody, GeneratedLesson, LessonRequest};
use crate::RequestGateway;

/// Gateway that talks to the lesson service over HTTP.
///
/// Each operation issues exactly one request; failures are classified and
/// returned, never retried.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Creates a gateway for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Creates a gateway using an existing `reqwest` client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Downloads the PDF the service rendered for `user_id`.
    ///
    /// Returns the raw document bytes. The id is percent-encoded as a single
    /// path segment.
    pub async fn download_lesson(&self, user_id: &str) -> Result<Vec<u8>> {
        let url = self.segment_endpoint("download_lesson", user_id)?;
        debug!(%url, "Downloading rendered lesson");

        let response = self.client.get(url).send().await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;

        info!(user_id, bytes = bytes.len(), "Downloaded rendered lesson");
        Ok(bytes.to_vec())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Builds `{base_url}/{route}/{segment}` with `segment` escaped.
    fn segment_endpoint(&self, route: &str, segment: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            RequestError::network(format!("invalid service URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                RequestError::network(format!(
                    "service URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(route)
            .push(segment);
        Ok(url)
    }
}

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn generate_lesson(
        &self,
        user_id: &str,
        issue_description: &str,
    ) -> Result<GeneratedLesson> {
        let url = self.endpoint("generate_lesson");
        let payload = LessonRequest::new(user_id, issue_description);
        debug!(%url, user_id, "Requesting lesson");

        let response = self.client.post(url).json(&payload).send().await?;
        let lesson: GeneratedLesson = decode_json(check_status(response).await?).await?;

        if lesson.lesson.trim().is_empty() {
            return Err(RequestError::decode("response contained an empty lesson"));
        }
        Ok(lesson)
    }

    async fn start_analysis(&self) -> Result<AnalysisStatus> {
        let url = self.endpoint("start-analysis");
        debug!(%url, "Requesting analysis start");

        let response = self.client.post(url).send().await?;
        decode_json(check_status(response).await?).await
    }
}

/// Turns a non-success response into a `Server` error.
///
/// The service's `{"error": ...}` body is used as the message when present.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reason = status.canonical_reason().unwrap_or("unexpected status");
    let message = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorBody>(&body)
            .map_or_else(|_| reason.to_string(), |body| body.error),
        Err(_) => reason.to_string(),
    };
    Err(RequestError::server(status.as_u16(), message))
}

/// Reads the full body and decodes it as JSON.
///
/// Read failures are network errors; parse failures are decode errors.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| RequestError::decode(e.to_string()))
}
