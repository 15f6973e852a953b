//! Request boundary helpers
//!
//! The transport owns sockets and routing; this module models the small
//! slice of a request the gate needs (headers, cookies, route name) and the
//! error body rendered back to clients.

use crate::error::{GateError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error};

/// Header and cookie carrying the bearer token
pub const AUTHORIZATION: &str = "Authorization";

/// The parts of an incoming request seen by the gate
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    route: Option<String>,
}

impl RequestHead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header; names are case-insensitive
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Set the route name, `app.blueprint.handler`
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Copy the `Authorization` cookie into the header of the same name
    ///
    /// One pair of surrounding double quotes is stripped, so the quoted
    /// value set by the login flow comes back as `Bearer <token>`. An
    /// existing header is never overwritten. Returns true when promoted.
    pub fn promote_cookie_token(&mut self) -> bool {
        let key = AUTHORIZATION.to_ascii_lowercase();
        if self.headers.contains_key(&key) {
            return false;
        }
        match self.cookies.get(AUTHORIZATION) {
            Some(cookie) => {
                self.headers.insert(key, unquote_cookie(cookie).to_string());
                debug!("Promoted authorization cookie to header");
                true
            }
            None => false,
        }
    }

    /// Bearer token from the `Authorization` header
    pub fn token(&self) -> Option<&str> {
        self.header(AUTHORIZATION).and_then(bearer_token)
    }
}

fn unquote_cookie(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Strip a `Bearer ` or `Token ` prefix
///
/// Returns `None` for any other scheme or an empty token.
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    let (scheme, token) = header.split_once(' ')?;
    if !(scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token")) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Dotted route name: `app.blueprint.handler`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteName {
    pub app: String,
    pub blueprint: String,
    pub handler: String,
}

impl RouteName {
    pub fn parse(route: &str) -> Result<Self> {
        let mut parts = route.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(app), Some(blueprint), Some(handler), None)
                if !app.is_empty() && !blueprint.is_empty() && !handler.is_empty() =>
            {
                Ok(RouteName {
                    app: app.to_string(),
                    blueprint: blueprint.to_string(),
                    handler: handler.to_string(),
                })
            }
            _ => Err(GateError::Configuration(format!(
                "route name `{route}` is not app.blueprint.handler"
            ))),
        }
    }

    /// The action checked against restrictions
    pub fn action(&self) -> &str {
        &self.blueprint
    }
}

/// Pre-handler hook run on protected routes
pub trait Interceptor {
    /// Let the request through, or fail with the reason it is refused
    fn intercept(&self, head: &RequestHead, resource: &str) -> Result<()>;
}

/// JSON error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub reasons: String,
}

impl From<&GateError> for ErrorBody {
    fn from(err: &GateError) -> Self {
        ErrorBody {
            status: err.status(),
            reasons: err.to_string(),
        }
    }
}

/// Log a failed request and build the body returned to the client
///
/// Taxonomy errors get one line; internal faults also log their debug form.
pub fn report_failure(err: &GateError, elapsed: Duration) -> ErrorBody {
    let body = ErrorBody::from(err);
    error!(
        kind = %err.kind(),
        status = body.status,
        "{} [{}][{}b][{:.5}s]",
        body.reasons,
        body.status,
        body.reasons.len(),
        elapsed.as_secs_f64()
    );
    if err.is_internal() {
        error!("Unhandled fault: {:?}", err);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_case_insensitive() {
        let head = RequestHead::new().with_header("AUTHORIZATION", "Bearer abc");
        assert_eq!(head.header("authorization"), Some("Bearer abc"));
        assert_eq!(head.token(), Some("abc"));
    }

    #[test]
    fn test_cookie_promotion() {
        let mut head = RequestHead::new().with_cookie(AUTHORIZATION, "Bearer from-cookie");
        assert_eq!(head.token(), None);
        assert!(head.promote_cookie_token());
        assert_eq!(head.token(), Some("from-cookie"));
    }

    #[test]
    fn test_quoted_cookie_promotion() {
        let mut head = RequestHead::new().with_cookie(AUTHORIZATION, "\"Bearer abc.def.ghi\"");
        assert!(head.promote_cookie_token());
        assert_eq!(head.header(AUTHORIZATION), Some("Bearer abc.def.ghi"));
        assert_eq!(head.token(), Some("abc.def.ghi"));

        // a lone quote is left alone
        let mut head = RequestHead::new().with_cookie(AUTHORIZATION, "\"Bearer abc");
        assert!(head.promote_cookie_token());
        assert_eq!(head.header(AUTHORIZATION), Some("\"Bearer abc"));
    }

    #[test]
    fn test_cookie_never_overrides_header() {
        let mut head = RequestHead::new()
            .with_header(AUTHORIZATION, "Bearer from-header")
            .with_cookie(AUTHORIZATION, "Bearer from-cookie");
        assert!(!head.promote_cookie_token());
        assert_eq!(head.token(), Some("from-header"));

        let mut bare = RequestHead::new();
        assert!(!bare.promote_cookie_token());
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Token abc"), Some("abc"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_route_name() {
        let route = RouteName::parse("weetags.records.nodes_where").unwrap();
        assert_eq!(route.action(), "records");
        assert_eq!(route.handler, "nodes_where");

        for bad in ["records.node", "a.b.c.d", "a..c", ""] {
            assert!(matches!(
                RouteName::parse(bad),
                Err(GateError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_error_body() {
        let body = report_failure(&GateError::AccessDenied, Duration::from_millis(3));
        assert_eq!(body.status, 403);
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"status":403,"reasons":"Access denied"}"#
        );

        let body = report_failure(&GateError::Internal("boom".into()), Duration::ZERO);
        assert_eq!(body.status, 500);
    }
}
