//! Implements the `RemoteStore` trait with the GitHub repository contents API.

use crate::api::{Fetched, RemoteStore, VersionToken};
use crate::config::Repository;
use crate::error::{IntoResult, Res};
use crate::{Error, ErrorType, Result};
use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

const API_URL: &str = "https://api.github.com";
const GITHUB_JSON: &str = "application/vnd.github.v3+json";
const AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Stores documents as files in a GitHub repository. The blob `sha` of a file is its version
/// token.
pub(crate) struct GitHubStore {
    client: reqwest::Client,
    repository: Repository,
    token: Option<String>,
}

impl GitHubStore {
    pub(crate) fn new(repository: &Repository, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Unable to create the HTTP client")
            .pub_result(ErrorType::Internal)?;
        Ok(Self {
            client,
            repository: repository.clone(),
            token,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{API_URL}/repos/{}/{}/contents/{}",
            self.repository.owner,
            self.repository.repo,
            path.trim_start_matches('/')
        )
    }

    /// Adds the headers every request needs, failing with `ErrorType::Auth` if there is no token.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or_else(|| {
            Error::msg(
                ErrorType::Auth,
                "No GitHub token is configured, see `paytrack init --help`",
            )
        })?;
        Ok(request
            .bearer_auth(token)
            .header(ACCEPT, GITHUB_JSON)
            .header(USER_AGENT, AGENT))
    }
}

/// The parts of a contents API file response that we use.
#[derive(Debug, Deserialize)]
struct ContentsFile {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: String,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutResponseContent,
}

#[derive(Debug, Deserialize)]
struct PutResponseContent {
    sha: String,
}

#[async_trait::async_trait]
impl RemoteStore for GitHubStore {
    async fn fetch(&mut self, path: &str) -> Result<Fetched> {
        let url = self.contents_url(path);
        trace!("GET {url}");
        let request = self
            .client
            .get(&url)
            .query(&[("ref", self.repository.branch.as_str())]);
        let response = self
            .authorize(request)?
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))
            .pub_result(ErrorType::Request)?;
        let response = check_status(response, "fetch", path).await?;

        let file: ContentsFile = response
            .json()
            .await
            .context("Failed to parse the GitHub contents response")
            .pub_result(ErrorType::Request)?;
        let content = decode_content(&file.content)
            .with_context(|| format!("The content of '{path}' is not a valid JSON document"))
            .pub_result(ErrorType::Request)?;
        debug!("Fetched '{path}' at version {}", file.sha);
        Ok(Fetched {
            content,
            version_token: VersionToken::new(file.sha),
        })
    }

    async fn write(
        &mut self,
        path: &str,
        content: &Value,
        expected: &VersionToken,
    ) -> Result<VersionToken> {
        let url = self.contents_url(path);
        let body = PutContents {
            message: format!(
                "Update payments data - {}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            content: encode_content(content).pub_result(ErrorType::Internal)?,
            sha: expected.as_str(),
            branch: &self.repository.branch,
        };
        trace!("PUT {url}");
        let response = self
            .authorize(self.client.put(&url))?
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))
            .pub_result(ErrorType::Request)?;
        let response = check_status(response, "write", path).await?;

        let put: PutResponse = response
            .json()
            .await
            .context("Failed to parse the GitHub contents response")
            .pub_result(ErrorType::Request)?;
        debug!("Wrote '{path}', new version {}", put.content.sha);
        Ok(VersionToken::new(put.content.sha))
    }
}

/// Maps an unsuccessful response onto an error of the right type.
async fn check_status(response: Response, action: &str, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let error_type = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorType::Auth,
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => ErrorType::Conflict,
        _ => ErrorType::Request,
    };
    Err(Error::msg(
        error_type,
        format!("GitHub refused to {action} '{path}' with status {status}: {body}"),
    ))
}

/// The API wraps base64 content in lines.
fn decode_content(encoded: &str) -> Res<Value> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .context("Failed to decode base64 content")?;
    serde_json::from_slice(&bytes).context("Failed to parse JSON content")
}

fn encode_content(content: &Value) -> Res<String> {
    let json = serde_json::to_string_pretty(content).context("Failed to serialize the document")?;
    Ok(STANDARD.encode(json))
}
