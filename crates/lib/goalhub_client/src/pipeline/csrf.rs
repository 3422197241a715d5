//! CSRF stage: double-submit token attachment.
//!
//! Every request is marked to carry ambient cookie credentials. Mutating
//! requests additionally get the CSRF cookie mirrored into a header. A missing
//! cookie is logged and the request proceeds; the backend rejects it.

use std::sync::Arc;

use http::{HeaderName, HeaderValue, Method};
use tracing::{debug, warn};

use super::{ApiRequest, RequestStage, StageError};
use crate::config::DEFAULT_CSRF_COOKIE;
use crate::cookies::CookieSource;

/// Methods that carry the CSRF header.
pub const MUTATING_METHODS: [Method; 4] = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

/// Mirrors the CSRF cookie into a request header on mutating requests.
pub struct CsrfStage {
    cookies: Arc<dyn CookieSource>,
    cookie_name: String,
    header_name: HeaderName,
}

impl CsrfStage {
    /// Stage using the default cookie (`csrftoken`) and header (`X-CSRFToken`).
    pub fn new(cookies: Arc<dyn CookieSource>) -> Self {
        Self {
            cookies,
            cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            header_name: HeaderName::from_static("x-csrftoken"),
        }
    }

    /// Stage with custom cookie and header names.
    pub fn with_names(
        cookies: Arc<dyn CookieSource>,
        cookie_name: &str,
        header_name: &str,
    ) -> Result<Self, StageError> {
        let header_name =
            HeaderName::try_from(header_name).map_err(|e| StageError::Rejected {
                stage: "CsrfStage".into(),
                message: format!("invalid header name {header_name:?}: {e}"),
            })?;
        Ok(Self {
            cookies,
            cookie_name: cookie_name.to_string(),
            header_name,
        })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }
}

impl RequestStage for CsrfStage {
    fn on_request(&self, request: &mut ApiRequest) -> Result<(), StageError> {
        request.with_credentials = true;

        if !MUTATING_METHODS.contains(&request.method) {
            return Ok(());
        }

        let Some(token) = self.cookies.cookie(&request.url, &self.cookie_name) else {
            warn!(
                method = %request.method,
                url = %request.url,
                cookie = %self.cookie_name,
                "no CSRF token found for mutating request"
            );
            return Ok(());
        };

        match HeaderValue::from_str(&token) {
            Ok(value) => {
                request.headers.insert(self.header_name.clone(), value);
                debug!(method = %request.method, url = %request.url, "CSRF token attached");
            }
            Err(_) => {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    "CSRF cookie is not a valid header value, sending without it"
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "CsrfStage"
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::config::DEFAULT_CSRF_HEADER;
    use crate::cookies::StaticCookies;

    fn stage_with_cookie(value: Option<&str>) -> CsrfStage {
        let cookies = StaticCookies::new();
        if let Some(value) = value {
            cookies.set("csrftoken", value);
        }
        CsrfStage::new(Arc::new(cookies))
    }

    fn request(method: Method) -> ApiRequest {
        ApiRequest::new(method, Url::parse("http://localhost:8000/api/v1/goals/").unwrap())
    }

    #[test]
    fn default_header_name_matches_config() {
        assert_eq!(
            stage_with_cookie(None).header_name(),
            &HeaderName::try_from(DEFAULT_CSRF_HEADER).unwrap()
        );
    }

    #[test]
    fn mutating_methods_get_header() {
        let stage = stage_with_cookie(Some("tok"));
        for method in MUTATING_METHODS {
            let mut req = request(method.clone());
            stage.on_request(&mut req).unwrap();
            assert_eq!(req.headers["x-csrftoken"], "tok", "{method}");
            assert!(req.with_credentials);
        }
    }

    #[test]
    fn get_never_gets_header() {
        let stage = stage_with_cookie(Some("tok"));
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            let mut req = request(method);
            stage.on_request(&mut req).unwrap();
            assert!(req.headers.get("x-csrftoken").is_none());
            assert!(req.with_credentials);
        }
    }

    #[test]
    fn missing_cookie_proceeds_without_header() {
        let stage = stage_with_cookie(None);
        let mut req = request(Method::POST);
        stage.on_request(&mut req).unwrap();
        assert!(req.headers.is_empty());
        assert!(req.with_credentials);
    }

    #[test]
    fn invalid_cookie_value_is_skipped() {
        let stage = stage_with_cookie(Some("bad\nvalue"));
        let mut req = request(Method::DELETE);
        stage.on_request(&mut req).unwrap();
        assert!(req.headers.is_empty());
    }

    #[test]
    fn custom_names() {
        let cookies = StaticCookies::new();
        cookies.set("XSRF-TOKEN", "abc");
        let stage = CsrfStage::with_names(Arc::new(cookies), "XSRF-TOKEN", "X-XSRF-Token").unwrap();
        let mut req = request(Method::PATCH);
        stage.on_request(&mut req).unwrap();
        assert_eq!(req.headers["x-xsrf-token"], "abc");

        assert!(CsrfStage::with_names(Arc::new(StaticCookies::new()), "a", "bad header").is_err());
    }
}
