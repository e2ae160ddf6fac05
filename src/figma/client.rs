//! Figma API client for fetching document graphs.

use crate::error::DsyncError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::api_types::{FigmaFileResponse, FigmaNodesResponse};
use super::conversion::parse_json;

pub const DEFAULT_BASE_URL: &str = "https://api.figma.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FigmaError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Figma API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Missing access token")]
    MissingToken,
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

pub fn map_figma_error(e: FigmaError) -> DsyncError {
    match e {
        FigmaError::Request(req_err) => DsyncError::Network(req_err),
        FigmaError::Url(url_err) => DsyncError::InvalidUrl(url_err),
        FigmaError::Api { status, message } => DsyncError::FigmaApi {
            status: Some(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)),
            message,
        },
        FigmaError::MissingToken => DsyncError::Config(
            "Missing Figma token; set FIGMA_TOKEN or FIGMA_OAUTH_TOKEN".to_string(),
        ),
        FigmaError::Decode(err) => DsyncError::Serialization(err),
        FigmaError::RateLimited(secs) => DsyncError::FigmaApi {
            status: Some(StatusCode::TOO_MANY_REQUESTS),
            message: format!("Rate limited, retry after {} seconds", secs),
        },
    }
}

#[derive(Debug, Clone)]
pub enum FigmaAuth {
    PersonalAccessToken(String),
    OAuthToken(String),
}

impl FigmaAuth {
    pub fn from_env() -> Option<Self> {
        if let Ok(token) = std::env::var("FIGMA_TOKEN") {
            if !token.is_empty() {
                return Some(Self::PersonalAccessToken(token));
            }
        }

        if let Ok(token) = std::env::var("FIGMA_OAUTH_TOKEN") {
            if !token.is_empty() {
                return Some(Self::OAuthToken(token));
            }
        }

        None
    }

    fn token(&self) -> &str {
        match self {
            FigmaAuth::PersonalAccessToken(token) | FigmaAuth::OAuthToken(token) => token,
        }
    }

    fn headers(&self) -> Result<HeaderMap, FigmaError> {
        let mut headers = HeaderMap::new();
        match self {
            FigmaAuth::PersonalAccessToken(token) => {
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-figma-token"),
                    HeaderValue::from_str(token).map_err(|_| FigmaError::MissingToken)?,
                );
            }
            FigmaAuth::OAuthToken(token) => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", token))
                        .map_err(|_| FigmaError::MissingToken)?,
                );
            }
        }
        Ok(headers)
    }
}

#[derive(Debug, Clone)]
pub struct FigmaClient {
    http: Client,
    base_url: Url,
}

impl FigmaClient {
    pub fn new(auth: FigmaAuth) -> Result<Self, FigmaError> {
        Self::with_base_url_and_timeout(auth, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url_and_timeout(
        auth: FigmaAuth,
        base_url: impl AsRef<str>,
        timeout: Duration,
    ) -> Result<Self, FigmaError> {
        if auth.token().is_empty() {
            return Err(FigmaError::MissingToken);
        }
        let base_url = Url::parse(base_url.as_ref())?;

        let http = Client::builder()
            .default_headers(auth.headers()?)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub async fn fetch_file(&self, file_key: &str) -> Result<FigmaFileResponse, FigmaError> {
        let url = self.endpoint(&format!("/v1/files/{file_key}"))?;
        self.get_json(url).await
    }

    pub async fn fetch_nodes(
        &self,
        file_key: &str,
        node_ids: &[String],
    ) -> Result<FigmaNodesResponse, FigmaError> {
        let mut url = self.endpoint(&format!("/v1/files/{file_key}/nodes"))?;
        url.query_pairs_mut().append_pair("ids", &node_ids.join(","));
        self.get_json(url).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, FigmaError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FigmaError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let secs = retry_after
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(FigmaError::RateLimited(secs));
        }

        let body = response.text().await?;
        if status.is_success() {
            return Ok(parse_json(&body)?);
        }

        Err(FigmaError::Api {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    let fallback = format!("Figma API returned status {}", status.as_u16());
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("err").or_else(|| value.get("error")))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or(fallback)
}
