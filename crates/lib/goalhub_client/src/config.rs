//! Client configuration.

use std::path::PathBuf;

use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1/";
/// Cookie the backend sets with the CSRF double-submit token.
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
/// Header the backend expects the CSRF token in.
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";
/// Path fetched to obtain a CSRF cookie when none is held. The API root.
pub const DEFAULT_CSRF_PATH: &str = "";

/// Configuration for the API client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL every request path is resolved against. Always ends with `/`.
    pub api_url: Url,
    pub csrf_cookie: String,
    pub csrf_header: String,
    /// Path, relative to `api_url`, whose response sets the CSRF cookie.
    pub csrf_path: String,
    /// Directory holding the persisted session token and CSRF cookie.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Build a config for `api_url` with the default CSRF names and data dir.
    pub fn new(api_url: &str) -> ClientResult<Self> {
        Ok(Self {
            api_url: parse_base_url(api_url)?,
            csrf_cookie: DEFAULT_CSRF_COOKIE.into(),
            csrf_header: DEFAULT_CSRF_HEADER.into(),
            csrf_path: DEFAULT_CSRF_PATH.into(),
            data_dir: goalhub_core::storage::default_data_dir(),
        })
    }

    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable              | Default                           |
    /// |-----------------------|-----------------------------------|
    /// | `GOALHUB_API_URL`     | `http://localhost:8000/api/v1/`   |
    /// | `GOALHUB_CSRF_COOKIE` | `csrftoken`                       |
    /// | `GOALHUB_CSRF_HEADER` | `X-CSRFToken`                     |
    /// | `GOALHUB_CSRF_PATH`   | empty (the API root)              |
    /// | `GOALHUB_DATA_DIR`    | `<platform data dir>/goalhub`     |
    pub fn from_env() -> ClientResult<Self> {
        let api_url = std::env::var("GOALHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Ok(Self {
            api_url: parse_base_url(&api_url)?,
            csrf_cookie: std::env::var("GOALHUB_CSRF_COOKIE")
                .unwrap_or_else(|_| DEFAULT_CSRF_COOKIE.into()),
            csrf_header: std::env::var("GOALHUB_CSRF_HEADER")
                .unwrap_or_else(|_| DEFAULT_CSRF_HEADER.into()),
            csrf_path: std::env::var("GOALHUB_CSRF_PATH")
                .unwrap_or_else(|_| DEFAULT_CSRF_PATH.into()),
            data_dir: std::env::var_os("GOALHUB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(goalhub_core::storage::default_data_dir),
        })
    }
}

/// Parse a base URL, appending a trailing `/` so relative paths join under it.
pub fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let mut url = Url::parse(raw).map_err(|e| ClientError::Url(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::Url(format!("{raw}: not a base URL")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
