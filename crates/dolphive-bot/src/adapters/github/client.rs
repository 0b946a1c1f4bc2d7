//! GitHub Contents API client
//!
//! Implements [`ContentStore`] over the REST v3 contents endpoints. File
//! bodies travel base64-encoded; the blob `sha` is the revision token.
//! Reads go through the [`RevisionCache`], every call through the retry
//! policy.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, ETAG, IF_NONE_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use dolphive::{CommitInfo, ContentStore, EntryKind, FileInfo, StoreError, StoredFile};

use super::error::{self, ApiErrorBody};
use super::retry::{with_retry, RetryOptions};
use super::revision_cache::RevisionCache;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("dolphive-bot/", env!("CARGO_PKG_VERSION"));

/// Repository a missing store repository is generated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTemplate {
    pub owner: String,
    pub repo: String,
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// Target branch; the repository default when unset
    pub branch: Option<String>,
    pub template: Option<RepositoryTemplate>,
    /// Visibility of a repository generated from the template
    pub private: bool,
    pub api_base: String,
}

impl GitHubConfig {
    pub fn new(token: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: None,
            template: None,
            private: true,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch.filter(|b| !b.is_empty());
        self
    }

    pub fn with_template(mut self, template: Option<RepositoryTemplate>) -> Self {
        self.template = template;
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }
}

/// Number of GitHub requests sent by this process
#[derive(Debug, Default)]
pub struct ApiCallCounter(AtomicU64);

impl ApiCallCounter {
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Reset to zero, returning the previous count
    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

#[derive(Deserialize)]
struct FileContentResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct DirEntryResponse {
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    size: u64,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct WriteResponse {
    content: WrittenContent,
    commit: WrittenCommit,
}

#[derive(Deserialize)]
struct WrittenContent {
    path: String,
    sha: String,
}

#[derive(Deserialize)]
struct WrittenCommit {
    sha: String,
    html_url: Option<String>,
}

#[derive(Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    owner: &'a str,
    name: &'a str,
    private: bool,
    include_all_branches: bool,
}

/// GitHub-backed content store
pub struct GitHubContentStore {
    client: Client,
    config: GitHubConfig,
    retry: RetryOptions,
    files: RevisionCache<StoredFile>,
    dirs: RevisionCache<Vec<FileInfo>>,
    api_calls: Arc<ApiCallCounter>,
}

impl GitHubContentStore {
    pub fn new(config: GitHubConfig, api_calls: Arc<ApiCallCounter>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StoreError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            retry: RetryOptions::default(),
            files: RevisionCache::default(),
            dirs: RevisionCache::default(),
            api_calls,
        })
    }

    pub fn with_retry_options(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Make sure the configured repository exists, generating it from the
    /// template when it does not. Returns whether a repository was created.
    pub async fn ensure_repository(&self) -> Result<bool, StoreError> {
        let url = format!(
            "{}/repos/{}/{}",
            self.config.api_base, self.config.owner, self.config.repo
        );
        let url = &url;

        let exists = with_retry("get_repository", &self.retry, move || async move {
            let response = self.request(Method::GET, url).send().await.map_err(error::transport)?;
            match response.status() {
                s if s.is_success() => Ok(true),
                StatusCode::NOT_FOUND => Ok(false),
                _ => Err(self.failure(response, url).await),
            }
        })
        .await?;

        if exists {
            return Ok(false);
        }

        let template = self.config.template.as_ref().ok_or_else(|| {
            StoreError::NotFound(format!("{}/{}", self.config.owner, self.config.repo))
        })?;

        tracing::info!(
            "Repository {}/{} not found, generating from template {}/{}",
            self.config.owner,
            self.config.repo,
            template.owner,
            template.repo
        );

        let generate_url = format!(
            "{}/repos/{}/{}/generate",
            self.config.api_base, template.owner, template.repo
        );
        let generate_url = &generate_url;
        let body = GenerateRequest {
            owner: &self.config.owner,
            name: &self.config.repo,
            private: self.config.private,
            include_all_branches: false,
        };
        let body = &body;

        with_retry("generate_repository", &self.retry, move || async move {
            let response = self
                .request(Method::POST, generate_url)
                .json(body)
                .send()
                .await
                .map_err(error::transport)?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(self.failure(response, generate_url).await)
            }
        })
        .await?;

        tracing::info!(
            private = self.config.private,
            "Repository {}/{} created",
            self.config.owner,
            self.config.repo
        );
        Ok(true)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.api_calls.record();
        self.client
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base,
            self.config.owner,
            self.config.repo,
            encode_path(path)
        )
    }

    /// Contents URL pinned to the configured branch, for reads
    fn contents_read_url(&self, path: &str) -> String {
        let url = self.contents_url(path);
        match &self.config.branch {
            Some(branch) => format!("{}?ref={}", url, urlencoding::encode(branch)),
            None => url,
        }
    }

    async fn failure(&self, response: Response, path: &str) -> StoreError {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        error::classify(
            status,
            &headers,
            ApiErrorBody::parse(&body),
            path,
            chrono::Utc::now().timestamp(),
        )
    }

    /// Drop cached reads a write to `path` makes stale
    fn purge(&self, path: &str) {
        self.files.purge(path);
        self.dirs.purge(parent_dir(path));
    }

    async fn get_file_once(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let mut request = self.request(Method::GET, &self.contents_read_url(path));
        if let Some(etag) = self.files.validator(path) {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await.map_err(error::transport)?;
        match response.status() {
            StatusCode::NOT_MODIFIED => {
                return self.files.confirm(path).map(Some).ok_or_else(|| {
                    StoreError::Network(format!("Cache entry for {} evicted mid-request", path))
                });
            }
            StatusCode::NOT_FOUND => {
                self.files.purge(path);
                return Ok(None);
            }
            s if s.is_success() => {}
            _ => return Err(self.failure(response, path).await),
        }

        let etag = header_string(&response, ETAG);
        let body: FileContentResponse = response.json().await.map_err(error::transport)?;
        let file = StoredFile {
            content: decode_content(&body.content)?,
            sha: body.sha,
        };

        if let Some(etag) = etag {
            self.files.store(path, etag, file.clone());
        }
        Ok(Some(file))
    }

    async fn list_contents_once(&self, dir: &str) -> Result<Vec<FileInfo>, StoreError> {
        let mut request = self.request(Method::GET, &self.contents_read_url(dir));
        if let Some(etag) = self.dirs.validator(dir) {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await.map_err(error::transport)?;
        match response.status() {
            StatusCode::NOT_MODIFIED => {
                return self.dirs.confirm(dir).ok_or_else(|| {
                    StoreError::Network(format!("Cache entry for {} evicted mid-request", dir))
                });
            }
            StatusCode::NOT_FOUND => {
                self.dirs.purge(dir);
                return Ok(Vec::new());
            }
            s if s.is_success() => {}
            _ => return Err(self.failure(response, dir).await),
        }

        let etag = header_string(&response, ETAG);
        let body: serde_json::Value = response.json().await.map_err(error::transport)?;

        // A file path answers with an object rather than a listing
        if !body.is_array() {
            return Ok(Vec::new());
        }

        let entries: Vec<DirEntryResponse> =
            serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))?;
        let listing: Vec<FileInfo> = entries
            .into_iter()
            .filter_map(|e| {
                let kind = match e.kind.as_str() {
                    "file" => EntryKind::File,
                    "dir" => EntryKind::Dir,
                    _ => return None,
                };
                Some(FileInfo {
                    name: e.name,
                    path: e.path,
                    sha: e.sha,
                    size: e.size,
                    kind,
                })
            })
            .collect();

        if let Some(etag) = etag {
            self.dirs.store(dir, etag, listing.clone());
        }
        Ok(listing)
    }

    async fn put_once(
        &self,
        path: &str,
        encoded: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<CommitInfo, StoreError> {
        let body = WriteRequest {
            message,
            content: encoded.to_string(),
            sha,
            branch: self.config.branch.as_deref(),
        };

        let response = self
            .request(Method::PUT, &self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(error::transport)?;
        self.purge(path);

        if !response.status().is_success() {
            return Err(self.failure(response, path).await);
        }

        let written: WriteResponse = response.json().await.map_err(error::transport)?;
        Ok(CommitInfo {
            path: written.content.path,
            sha: written.content.sha,
            commit_sha: written.commit.sha,
            commit_url: written.commit.html_url,
        })
    }

    /// Read `path` back after an ambiguous create. Identical content means
    /// the create went through; other content is a collision.
    async fn committed_copy(
        &self,
        path: &str,
        content: &str,
    ) -> Result<Option<CommitInfo>, StoreError> {
        match self.get_file_once(path).await? {
            Some(file) if file.content == content => Ok(Some(CommitInfo {
                path: path.to_string(),
                sha: file.sha,
                commit_sha: String::new(),
                commit_url: None,
            })),
            Some(_) => Err(StoreError::Conflict {
                path: path.to_string(),
                message: "File already exists".to_string(),
            }),
            None => Ok(None),
        }
    }

    async fn delete_once(&self, path: &str, message: &str, sha: &str) -> Result<(), StoreError> {
        let body = DeleteRequest {
            message,
            sha,
            branch: self.config.branch.as_deref(),
        };

        let response = self
            .request(Method::DELETE, &self.contents_url(path))
            .json(&body)
            .send()
            .await
            .map_err(error::transport)?;
        self.purge(path);

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.failure(response, path).await)
        }
    }
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    async fn get_file(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        with_retry("get_file", &self.retry, move || self.get_file_once(path)).await
    }

    async fn create_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<CommitInfo, StoreError> {
        // Never overwrite: an occupied path is a collision
        if self.get_file(path).await?.is_some() {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                message: "File already exists".to_string(),
            });
        }

        let encoded = STANDARD.encode(content);
        let encoded = encoded.as_str();
        let unsure = AtomicBool::new(false);
        let unsure = &unsure;
        let commit = with_retry("create_file", &self.retry, move || async move {
            let err = match self.put_once(path, encoded, message, None).await {
                Ok(commit) => return Ok(commit),
                Err(err) => err,
            };

            // A failed response may still have committed the file; a later
            // "already exists" can then be our own earlier attempt
            let ambiguous = err.is_retryable() && !err.is_rate_limited();
            if ambiguous || (err.is_path_collision() && unsure.load(Ordering::Relaxed)) {
                unsure.store(true, Ordering::Relaxed);
                if let Some(commit) = self.committed_copy(path, content).await? {
                    tracing::warn!(path = %path, "Create failed after committing: {}", err);
                    return Ok(commit);
                }
            }
            Err(err)
        })
        .await?;

        tracing::debug!(path = %commit.path, sha = %commit.sha, "Created file");
        Ok(commit)
    }

    async fn update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: &str,
    ) -> Result<CommitInfo, StoreError> {
        let encoded = STANDARD.encode(content);
        let encoded = encoded.as_str();
        let commit = with_retry("update_file", &self.retry, move || {
            self.put_once(path, encoded, message, Some(sha))
        })
        .await?;

        tracing::debug!(path = %commit.path, sha = %commit.sha, "Updated file");
        Ok(commit)
    }

    async fn delete_file(&self, path: &str, message: &str, sha: &str) -> Result<(), StoreError> {
        with_retry("delete_file", &self.retry, move || {
            self.delete_once(path, message, sha)
        })
        .await?;

        tracing::debug!(path = %path, "Deleted file");
        Ok(())
    }

    async fn list_contents(&self, dir: &str) -> Result<Vec<FileInfo>, StoreError> {
        with_retry("list_contents", &self.retry, move || self.list_contents_once(dir)).await
    }
}

fn header_string(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Percent-encode each path segment, keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// The API wraps base64 bodies at 60 columns
fn decode_content(encoded: &str) -> Result<String, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Decode(format!("Invalid base64 content: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode(format!("Content is not UTF-8: {}", e)))
}
