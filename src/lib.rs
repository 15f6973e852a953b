//! # Weetags Gate - Authorization and Parameter Coercion
//!
//! `weetags-gate` sits at the boundary of a hierarchical-data service and
//! provides:
//!
//! - **Credential storage** with salted SHA-256 digests, persisted in SQLite
//! - **Signed tokens** (HS256) carrying permission levels and an expiry
//! - **Ordered authorization** of (resource, action) pairs against
//!   restriction policies
//! - **Parameter coercion** of loosely typed wire input into typed records
//! - **Condition compilation** of a nested boolean filter language
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weetags_gate::{GatekeeperBuilder, Restriction, Result, UserSettings};
//!
//! # fn main() -> Result<()> {
//! let gate = GatekeeperBuilder::new()
//!     .secret("change-me")
//!     .users(vec![UserSettings::new("admin", "admin", &["admin"], 600)])
//!     .restrictions(vec![Restriction::new("topics", "records", &["admin"])])
//!     .build()?;
//!
//! let issued = gate.login(Some("admin"), Some("admin"))?;
//! assert!(gate.authorize(Some(&issued.token), "topics", "records")?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Parameters and conditions
//!
//! ```rust,no_run
//! use weetags_gate::{EngineOperation, ParameterRecord, RawParams, Result};
//!
//! # fn main() -> Result<()> {
//! let raw = RawParams::merge(
//!     vec![("nid", "oak")],
//!     None,
//!     vec![
//!         ("fields", vec!["name,depth"]),
//!         ("conditions", vec!["[[['depth', '>', 1]]]"]),
//!     ],
//! );
//! let record = ParameterRecord::from_raw(&raw)?;
//! let kwargs = record.get_kwargs(&EngineOperation::NodesWhere);
//! println!("{}", kwargs.to_value());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    boundary::{bearer_token, report_failure, ErrorBody, Interceptor, RequestHead, RouteName},
    clock::{Clock, ManualClock, SystemClock},
    conditions::{
        Clause, ConditionCompiler, ConditionExpr, ConditionValue, Connector, Group, Operator,
        Triplet,
    },
    config::{AuthSettings, GateConfig},
    credentials::{CredentialStore, Database, Restriction, StoreOptions, User, UserSettings},
    gate::AuthorizationGate,
    params::{
        EngineOperation, Kwargs, Operation, ParamName, ParamValue, ParameterRecord, RawParams,
        Relation, Style,
    },
    token::{Claims, IssuedToken, TokenIssuer, TokenSigner},
};
pub use crate::error::{ErrorKind, GateError, Result};

use crate::core::boundary::AUTHORIZATION;
use std::sync::Arc;
use tracing::{debug, info};

/// Cookie set by the cookie login flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCookie {
    pub name: &'static str,
    /// `Bearer <token>`
    pub value: String,
    /// Cookie lifetime, seconds
    pub max_age: i64,
}

impl LoginCookie {
    /// `Set-Cookie` header value
    pub fn to_header_value(&self) -> String {
        format!(
            "{}=\"{}\"; Max-Age={}; Path=/; Secure",
            self.name, self.value, self.max_age
        )
    }
}

struct Enabled {
    store: Arc<CredentialStore>,
    issuer: TokenIssuer,
    gate: AuthorizationGate,
}

/// Authorization front door: login, token checks and request interception
///
/// A disabled gatekeeper (no credential store configured) lets every
/// request through and refuses logins.
pub struct Gatekeeper {
    enabled: Option<Enabled>,
}

impl Gatekeeper {
    /// Gatekeeper without an authorization subsystem
    pub fn disabled() -> Self {
        info!("Authorization disabled");
        Gatekeeper { enabled: None }
    }

    pub fn builder() -> GatekeeperBuilder {
        GatekeeperBuilder::new()
    }

    /// Build from parsed configuration; no `[auth]` table means disabled
    pub fn from_config(config: GateConfig) -> Result<Self> {
        let GateConfig { secret, auth } = config;
        let Some(auth) = auth else {
            return Ok(Self::disabled());
        };
        let secret = secret.ok_or_else(|| {
            GateError::Configuration("a secret is required when [auth] is configured".into())
        })?;

        let store = CredentialStore::initialize(auth.store_options())?;
        let signer = TokenSigner::from_secret(secret)?;
        Ok(Self::assemble(store, signer, Arc::new(SystemClock)))
    }

    fn assemble(store: CredentialStore, signer: TokenSigner, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(store);
        let signer = Arc::new(signer);
        info!(
            "Authorization enabled: {} users, {} restrictions",
            store.users_len(),
            store.restrictions_len()
        );
        Gatekeeper {
            enabled: Some(Enabled {
                issuer: TokenIssuer::new(Arc::clone(&store), Arc::clone(&signer), Arc::clone(&clock)),
                gate: AuthorizationGate::new(Arc::clone(&store), signer, clock),
                store,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.is_some()
    }

    /// Backing credential store, when enabled
    pub fn store(&self) -> Option<&Arc<CredentialStore>> {
        self.enabled.as_ref().map(|e| &e.store)
    }

    /// Authenticate and mint a token
    ///
    /// # Errors
    ///
    /// - `MissingLogin` when username or password is absent or empty
    /// - `InvalidLogin` for unknown users and wrong passwords alike
    /// - `Configuration` when authorization is disabled
    pub fn login(&self, username: Option<&str>, password: Option<&str>) -> Result<IssuedToken> {
        let (Some(username), Some(password)) = (
            username.filter(|u| !u.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(GateError::MissingLogin);
        };
        let enabled = self.enabled.as_ref().ok_or_else(|| {
            GateError::Configuration("authorization is disabled".to_string())
        })?;
        enabled.issuer.authenticate(username, password)
    }

    /// Login flow returning the `Authorization` cookie
    pub fn login_cookie(&self, username: Option<&str>, password: Option<&str>) -> Result<LoginCookie> {
        let issued = self.login(username, password)?;
        Ok(LoginCookie {
            name: AUTHORIZATION,
            value: issued.bearer(),
            max_age: issued.max_age,
        })
    }

    /// Authorize `token` for `action` on `resource`; always true when disabled
    pub fn authorize(&self, token: Option<&str>, resource: &str, action: &str) -> Result<bool> {
        match &self.enabled {
            Some(enabled) => enabled.gate.authorize(token, resource, action),
            None => {
                debug!("Authorization disabled, allowing '{}'/'{}'", resource, action);
                Ok(true)
            }
        }
    }

    /// Authorize `token` for an engine operation, using its blueprint as the action
    pub fn authorize_operation(
        &self,
        token: Option<&str>,
        resource: &str,
        operation: EngineOperation,
    ) -> Result<bool> {
        debug!("Authorizing operation '{}' on '{}'", operation, resource);
        self.authorize(token, resource, operation.blueprint())
    }
}

impl Interceptor for Gatekeeper {
    /// Checks the bearer token against the route's blueprint
    ///
    /// Call [`RequestHead::promote_cookie_token`] first to accept cookies.
    fn intercept(&self, head: &RequestHead, resource: &str) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let token = head.token().ok_or(GateError::TokenMissing)?;
        let route = head
            .route()
            .ok_or_else(|| GateError::Configuration("route name not available".to_string()))?;
        let route = RouteName::parse(route)?;
        self.authorize(Some(token), resource, route.action())?;
        Ok(())
    }
}

impl std::fmt::Debug for Gatekeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatekeeper")
            .field("enabled", &self.is_enabled())
            .field("store", &self.store())
            .finish()
    }
}

/// Builder for an enabled [`Gatekeeper`]
///
/// # Examples
///
/// ```rust,no_run
/// use weetags_gate::{GatekeeperBuilder, UserSettings};
///
/// let gate = GatekeeperBuilder::new()
///     .secret("change-me")
///     .database("credentials.db")
///     .users(vec![UserSettings::new("reader", "reader", &["user"], 60)])
///     .build()
///     .unwrap();
/// ```
pub struct GatekeeperBuilder {
    secret: Option<String>,
    options: StoreOptions,
    clock: Option<Arc<dyn Clock>>,
}

impl GatekeeperBuilder {
    pub fn new() -> Self {
        GatekeeperBuilder {
            secret: None,
            options: StoreOptions::default(),
            clock: None,
        }
    }

    /// Set the token signing secret (required)
    pub fn secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Backing database, `":memory:"` or a file path
    pub fn database<D: Into<Database>>(mut self, database: D) -> Self {
        self.options.database = database.into();
        self
    }

    /// Drop existing credential tables before loading
    pub fn replace(mut self, replace: bool) -> Self {
        self.options.replace = replace;
        self
    }

    pub fn users(mut self, users: Vec<UserSettings>) -> Self {
        self.options.users = Some(users);
        self
    }

    pub fn restrictions(mut self, restrictions: Vec<Restriction>) -> Self {
        self.options.restrictions = Some(restrictions);
        self
    }

    /// Override the wall clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Gatekeeper> {
        let secret = self
            .secret
            .ok_or_else(|| GateError::Configuration("secret must be set".to_string()))?;
        let signer = TokenSigner::new(secret)?;
        let store = CredentialStore::initialize(self.options)?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(Gatekeeper::assemble(store, signer, clock))
    }
}

impl Default for GatekeeperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gatekeeper(clock: Arc<ManualClock>) -> Gatekeeper {
        GatekeeperBuilder::new()
            .secret("xxx")
            .users(vec![
                UserSettings::new("admin", "admin", &["admin"], 600),
                UserSettings::new("guest", "guest", &["guest"], 600),
            ])
            .restrictions(vec![Restriction::new("topics", "writer", &["admin"])])
            .clock(clock)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_secret() {
        let err = GatekeeperBuilder::new()
            .users(vec![UserSettings::new("a", "a", &["x"], 1)])
            .build()
            .unwrap_err();
        assert!(matches!(err, GateError::Configuration(_)));
    }

    #[test]
    fn test_missing_login() {
        let gate = gatekeeper(Arc::new(ManualClock::new(0)));
        for (user, pass) in [(None, Some("a")), (Some("admin"), None), (Some(""), Some("admin"))] {
            assert!(matches!(gate.login(user, pass), Err(GateError::MissingLogin)));
        }
        assert!(matches!(
            gate.login(Some("admin"), Some("nope")),
            Err(GateError::InvalidLogin)
        ));
    }

    #[test]
    fn test_login_cookie() {
        let gate = gatekeeper(Arc::new(ManualClock::new(0)));
        let cookie = gate.login_cookie(Some("admin"), Some("admin")).unwrap();
        assert_eq!(cookie.name, "Authorization");
        assert_eq!(cookie.max_age, 600);
        assert!(cookie.value.starts_with("Bearer "));
        assert!(cookie
            .to_header_value()
            .starts_with("Authorization=\"Bearer "));
    }

    #[test]
    fn test_interceptor_uses_blueprint() {
        let gate = gatekeeper(Arc::new(ManualClock::new(0)));
        let guest = gate.login(Some("guest"), Some("guest")).unwrap();

        let reader = RequestHead::new()
            .with_header("Authorization", guest.bearer())
            .with_route("weetags.records.node");
        assert!(gate.intercept(&reader, "topics").is_ok());

        let writer = reader.clone().with_route("weetags.writer.add_node");
        assert!(matches!(
            gate.intercept(&writer, "topics"),
            Err(GateError::AccessDenied)
        ));
        assert!(gate.intercept(&writer, "other").is_ok());
    }

    #[test]
    fn test_interceptor_cookie_flow() {
        let gate = gatekeeper(Arc::new(ManualClock::new(0)));
        let cookie = gate.login_cookie(Some("admin"), Some("admin")).unwrap();

        let mut head = RequestHead::new()
            .with_cookie(cookie.name, cookie.value)
            .with_route("weetags.writer.add_node");
        assert!(matches!(
            gate.intercept(&head, "topics"),
            Err(GateError::TokenMissing)
        ));

        head.promote_cookie_token();
        assert!(gate.intercept(&head, "topics").is_ok());
    }

    #[test]
    fn test_interceptor_set_cookie_header() {
        let gate = gatekeeper(Arc::new(ManualClock::new(0)));
        let cookie = gate.login_cookie(Some("admin"), Some("admin")).unwrap();
        let header = cookie.to_header_value();

        // what a client sends back: the name=value pair, quotes included
        let pair = header.split(';').next().unwrap();
        let (name, value) = pair.split_once('=').unwrap();
        assert!(value.starts_with('"'));

        let mut head = RequestHead::new()
            .with_cookie(name, value)
            .with_route("weetags.writer.add_node");
        assert!(head.promote_cookie_token());
        assert!(gate.intercept(&head, "topics").is_ok());
    }

    #[test]
    fn test_authorize_operation() {
        let gate = gatekeeper(Arc::new(ManualClock::new(0)));
        let admin = gate.login(Some("admin"), Some("admin")).unwrap();
        let guest = gate.login(Some("guest"), Some("guest")).unwrap();

        assert!(gate
            .authorize_operation(Some(&admin.token), "topics", EngineOperation::AddNode)
            .is_ok());
        assert!(gate
            .authorize_operation(Some(&guest.token), "topics", EngineOperation::NodesWhere)
            .is_ok());
        assert!(matches!(
            gate.authorize_operation(Some(&guest.token), "topics", EngineOperation::DeleteNode),
            Err(GateError::AccessDenied)
        ));
    }

    #[test]
    fn test_interceptor_needs_route() {
        let gate = gatekeeper(Arc::new(ManualClock::new(0)));
        let token = gate.login(Some("admin"), Some("admin")).unwrap();
        let head = RequestHead::new().with_header("Authorization", token.bearer());
        assert!(matches!(
            gate.intercept(&head, "topics"),
            Err(GateError::Configuration(_))
        ));
    }

    #[test]
    fn test_disabled_passes_everything() {
        let gate = Gatekeeper::disabled();
        assert!(!gate.is_enabled());
        assert!(gate.authorize(None, "topics", "writer").unwrap());
        assert!(gate.intercept(&RequestHead::new(), "topics").is_ok());
        assert!(matches!(
            gate.login(Some("admin"), Some("admin")),
            Err(GateError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let disabled = Gatekeeper::from_config(GateConfig::default()).unwrap();
        assert!(!disabled.is_enabled());

        let config = GateConfig::from_toml_str(
            r#"
            secret = "xxx"
            [auth]
            [[auth.users]]
            username = "admin"
            password = "admin"
            auth_level = ["admin"]
            max_age = 60
            "#,
        )
        .unwrap();
        let gate = Gatekeeper::from_config(config).unwrap();
        assert_eq!(gate.store().unwrap().users_len(), 1);
        assert!(gate.login(Some("admin"), Some("admin")).is_ok());
    }
}
