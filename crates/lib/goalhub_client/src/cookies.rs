//! Cookie lookup for the CSRF stage, and persistence of the CSRF cookie
//! between processes.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use goalhub_core::storage::{StorageError, TokenStorage};
use reqwest::cookie::{CookieStore, Jar};
use tracing::debug;
use url::Url;

/// Storage key holding the persisted CSRF cookie value.
pub const CSRF_COOKIE_KEY: &str = "csrf_cookie";

/// Read-only view of the cookies that would be sent to a URL.
pub trait CookieSource: Send + Sync {
    /// Value of cookie `name` for `url`, if set and non-empty.
    fn cookie(&self, url: &Url, name: &str) -> Option<String>;
}

impl CookieSource for Jar {
    fn cookie(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.cookies(url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, name)
    }
}

/// Find `name` in a `Cookie` header value (`a=1; b=2`).
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The CSRF cookie of a [`Jar`], mirrored into [`TokenStorage`].
///
/// Each process starts with an empty jar. Restoring from storage lets a later
/// process send the cookie an earlier one received.
#[derive(Clone)]
pub struct PersistedCsrfCookie {
    jar: Arc<Jar>,
    storage: Arc<dyn TokenStorage>,
    url: Url,
    name: String,
}

impl PersistedCsrfCookie {
    /// Cookie `name` as sent to `url` (the API base URL).
    pub fn new(jar: Arc<Jar>, storage: Arc<dyn TokenStorage>, url: Url, name: &str) -> Self {
        Self {
            jar,
            storage,
            url,
            name: name.to_string(),
        }
    }

    /// Current value in the jar.
    pub fn value(&self) -> Option<String> {
        self.jar.cookie(&self.url, &self.name)
    }

    /// Load the stored value into the jar. Returns whether one was stored.
    pub fn restore(&self) -> Result<bool, StorageError> {
        let Some(value) = self.storage.get(CSRF_COOKIE_KEY)? else {
            return Ok(false);
        };
        self.jar
            .add_cookie_str(&format!("{}={value}; Path=/", self.name), &self.url);
        debug!(cookie = %self.name, "restored persisted cookie");
        Ok(true)
    }

    /// Store the jar's current value. Returns whether the jar had one.
    pub fn save(&self) -> Result<bool, StorageError> {
        let Some(value) = self.value() else {
            return Ok(false);
        };
        self.storage.set(CSRF_COOKIE_KEY, &value)?;
        Ok(true)
    }
}

/// Fixed cookie values, independent of URL.
#[derive(Debug, Default)]
pub struct StaticCookies {
    values: RwLock<HashMap<String, String>>,
}

impl StaticCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str, value: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove(&self, name: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

impl CookieSource for StaticCookies {
    fn cookie(&self, _url: &Url, name: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }
}
