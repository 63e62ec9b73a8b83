use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::foundation::error::{PinError, PinResult};

pub const API_BASE: &str = "https://api.pinterest.com/v5";
pub const OAUTH_AUTHORIZE_URL: &str = "https://www.pinterest.com/oauth/";
pub const OAUTH_SCOPES: &str = "boards:read,boards:write,pins:read,pins:write";

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Overrides the token file used by [`FileCredentialStore::from_env`].
pub const TOKEN_FILE_ENV: &str = "PINFORGE_TOKEN_FILE";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Somewhere an OAuth access token is kept between runs.
pub trait CredentialStore {
    fn get(&self) -> Option<String>;
    fn set(&mut self, token: &str) -> PinResult<()>;
    fn clear(&mut self) -> PinResult<()>;
}

/// A stored token only counts once it is longer than 10 characters.
pub fn is_connected(store: &dyn CredentialStore) -> bool {
    store.get().is_some_and(|t| t.len() > 10)
}

/// In-process store. Clones share the same slot, so another thread can complete a login.
#[derive(Clone, Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.slot().clone()
    }

    fn set(&mut self, token: &str) -> PinResult<()> {
        *self.slot() = Some(token.to_owned());
        Ok(())
    }

    fn clear(&mut self) -> PinResult<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// Token kept in a plain file; re-read on every `get`.
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$PINFORGE_TOKEN_FILE`, else `$HOME/.config/pinforge/token`.
    pub fn from_env() -> PinResult<Self> {
        if let Some(p) = std::env::var_os(TOKEN_FILE_ENV) {
            return Ok(Self::new(p));
        }
        let home = std::env::var_os("HOME").ok_or_else(|| {
            PinError::validation(format!("set {TOKEN_FILE_ENV} or HOME to locate the token file"))
        })?;
        Ok(Self::new(
            Path::new(&home).join(".config").join("pinforge").join("token"),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        let s = std::fs::read_to_string(&self.path).ok()?;
        let t = s.trim();
        (!t.is_empty()).then(|| t.to_owned())
    }

    fn set(&mut self, token: &str) -> PinResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create token dir '{}'", parent.display()))?;
        }
        std::fs::write(&self.path, token.trim())
            .with_context(|| format!("write token file '{}'", self.path.display()))?;
        Ok(())
    }

    fn clear(&mut self) -> PinResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove token file '{}'", self.path.display()))
                .into()),
        }
    }
}

/// Poll `store` until it holds a usable token or `timeout` elapses.
pub fn wait_for_connection(
    store: &dyn CredentialStore,
    interval: Duration,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if is_connected(store) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "gave up waiting for login");
            return false;
        }
        std::thread::sleep(interval.min(deadline - now));
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    pub client_id: String,
    pub redirect_uri: String,
}

impl OAuthConfig {
    /// Authorization-code URL the user opens to grant access.
    pub fn authorize_url(&self, state: &str) -> PinResult<Url> {
        if self.client_id.trim().is_empty() {
            return Err(PinError::validation("oauth client_id must be non-empty"));
        }
        Url::parse(&self.redirect_uri).map_err(|e| {
            PinError::validation(format!("invalid redirect uri '{}': {e}", self.redirect_uri))
        })?;

        let url = Url::parse_with_params(
            OAUTH_AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", OAUTH_SCOPES),
                ("state", state),
            ],
        )
        .context("build oauth url")?;
        Ok(url)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinterestUser {
    pub username: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSection {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// A pin to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatePin {
    pub board_id: String,
    pub board_section_id: Option<String>,
    pub title: String,
    pub description: String,
    /// PNG bytes as base64, optionally wrapped in a `data:` URI.
    pub image_base64: String,
    /// ISO-8601 timestamp for scheduled publishing.
    pub publish_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CreatedPin {
    pub id: String,
}

#[derive(Serialize)]
struct MediaSource<'a> {
    source_type: &'static str,
    content_type: &'static str,
    data: &'a str,
}

#[derive(Serialize)]
struct PinBody<'a> {
    board_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    board_section_id: Option<&'a str>,
    title: String,
    description: String,
    media_source: MediaSource<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_at: Option<&'a str>,
}

impl CreatePin {
    fn body(&self) -> PinResult<PinBody<'_>> {
        if self.board_id.trim().is_empty() {
            return Err(PinError::validation("a board must be selected"));
        }
        let data = match self.image_base64.split_once(',') {
            Some((_, d)) => d,
            None => self.image_base64.as_str(),
        };
        if data.is_empty() {
            return Err(PinError::validation("pin image is empty"));
        }
        Ok(PinBody {
            board_id: &self.board_id,
            board_section_id: self
                .board_section_id
                .as_deref()
                .filter(|s| !s.is_empty()),
            title: truncate_chars(&self.title, TITLE_MAX_CHARS),
            description: truncate_chars(&self.description, DESCRIPTION_MAX_CHARS),
            media_source: MediaSource {
                source_type: "image_base64",
                content_type: "image/png",
                data,
            },
            publish_at: self.publish_at.as_deref().filter(|s| !s.is_empty()),
        })
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Blocking Pinterest v5 client authenticated with a bearer token.
pub struct PinterestClient {
    http: reqwest::blocking::Client,
    base: Url,
    token: String,
}

impl PinterestClient {
    pub fn new(token: impl Into<String>) -> PinResult<Self> {
        Self::with_base(token, API_BASE)
    }

    pub fn with_base(token: impl Into<String>, base: &str) -> PinResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| PinError::validation(format!("invalid api base '{base}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(PinError::validation(format!("api base '{base}' cannot hold paths")));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base,
            token: token.into(),
        })
    }

    /// Client for the token held by `store`; `Unauthorized` when not connected.
    pub fn from_store(store: &dyn CredentialStore, base: &str) -> PinResult<Self> {
        match store.get() {
            Some(t) if t.len() > 10 => Self::with_base(t, base),
            _ => Err(PinError::unauthorized("not connected to Pinterest")),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> PinResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| PinError::validation("api base cannot hold paths"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn fetch_user(&self) -> PinResult<PinterestUser> {
        let url = self.endpoint(&["user_account"])?;
        let resp = self.http.get(url).bearer_auth(&self.token).send();
        read_json(resp, "Failed to fetch user")
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn list_boards(&self) -> PinResult<Vec<Board>> {
        let url = self.endpoint(&["boards"])?;
        let resp = self.http.get(url).bearer_auth(&self.token).send();
        let page: Page<Board> = read_json(resp, "Failed to fetch boards")?;
        Ok(page.items)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn list_sections(&self, board_id: &str) -> PinResult<Vec<BoardSection>> {
        let url = self.endpoint(&["boards", board_id, "sections"])?;
        let resp = self.http.get(url).bearer_auth(&self.token).send();
        let page: Page<BoardSection> = read_json(resp, "Failed to fetch sections")?;
        Ok(page.items)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(board = %pin.board_id))]
    pub fn create_pin(&self, pin: &CreatePin) -> PinResult<CreatedPin> {
        let body = pin.body()?;
        let url = self.endpoint(&["pins"])?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send();
        let created: CreatedPin = read_json(resp, "Failed to create pin")?;
        tracing::info!(pin_id = %created.id, "pin created");
        Ok(created)
    }
}

fn read_json<T: DeserializeOwned>(
    resp: reqwest::Result<reqwest::blocking::Response>,
    fallback: &str,
) -> PinResult<T> {
    let resp = resp.map_err(|e| PinError::publish(format!("{fallback}: {e}")))?;
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|e| PinError::publish(format!("{fallback}: {e}")))?;

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(PinError::unauthorized(
            api_message(&body).unwrap_or_else(|| "access token rejected".to_owned()),
        ));
    }
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "pinterest request failed");
        return Err(PinError::publish(
            api_message(&body).unwrap_or_else(|| fallback.to_owned()),
        ));
    }
    serde_json::from_str(&body)
        .map_err(|e| PinError::publish(format!("{fallback}: unexpected response: {e}")))
}

fn api_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("message")?.as_str().map(str::to_owned)
}

#[cfg(test)]
#[path = "../../tests/unit/services/publish.rs"]
mod tests;
