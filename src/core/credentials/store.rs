//! SQLite-backed credential store
//!
//! Users and restrictions are persisted in two tables and mirrored in an
//! immutable in-memory snapshot. Lookups read the snapshot only; writes go
//! through a transaction and publish a fresh snapshot once committed.

use super::user::{Restriction, User, UserSettings};
use crate::error::{GateError, Result};
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, Transaction};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

const USERS_TABLE: &str = "weetags__users";
const RESTRICTIONS_TABLE: &str = "weetags__restrictions";

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS weetags__users (
    username TEXT PRIMARY KEY,
    password_sha256 TEXT NOT NULL,
    auth_level TEXT NOT NULL,
    salt TEXT NOT NULL,
    max_age INTEGER NOT NULL
)";

const CREATE_RESTRICTIONS: &str = "CREATE TABLE IF NOT EXISTS weetags__restrictions (
    tree TEXT NOT NULL,
    blueprint TEXT NOT NULL,
    auth_level TEXT NOT NULL
)";

/// Location of the backing database
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Database {
    /// Private in-memory database (lost on drop)
    #[default]
    Memory,
    /// SQLite file on disk
    File(PathBuf),
}

impl From<String> for Database {
    fn from(value: String) -> Self {
        if value == ":memory:" {
            Database::Memory
        } else {
            Database::File(PathBuf::from(value))
        }
    }
}

impl From<&str> for Database {
    fn from(value: &str) -> Self {
        Database::from(value.to_string())
    }
}

/// Options for [`CredentialStore::initialize`]
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub database: Database,
    /// Drop existing tables before loading
    pub replace: bool,
    pub users: Option<Vec<UserSettings>>,
    pub restrictions: Option<Vec<Restriction>>,
}

#[derive(Debug, Default)]
struct Snapshot {
    users: HashMap<String, User>,
    /// resource -> action -> first stored restriction
    restrictions: HashMap<String, HashMap<String, Restriction>>,
    restriction_rows: usize,
}

/// Process-wide credential and restriction store
pub struct CredentialStore {
    conn: Mutex<Connection>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl CredentialStore {
    /// Open the backing database and load the configured credentials
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the store would start without users:
    /// either no tables exist yet, or `replace` is set, and no user list is
    /// supplied.
    pub fn initialize(options: StoreOptions) -> Result<Self> {
        let mut conn = match &options.database {
            Database::Memory => Connection::open_in_memory()?,
            Database::File(path) => Connection::open(path)?,
        };

        let tables = existing_tables(&conn)?;
        let fresh = tables.is_empty();

        if (fresh || options.replace) && options.users.is_none() {
            return Err(GateError::Configuration(
                "users must be defined when authorization is enabled".to_string(),
            ));
        }

        let users = options
            .users
            .as_deref()
            .map(hash_batch)
            .transpose()?
            .unwrap_or_default();
        let restrictions = options.restrictions.unwrap_or_default();
        for restriction in &restrictions {
            restriction.check()?;
        }

        {
            let tx = conn.transaction()?;
            if !fresh && options.replace {
                debug!("Dropping existing credential tables");
                tx.execute_batch(&format!(
                    "DROP TABLE IF EXISTS {RESTRICTIONS_TABLE}; DROP TABLE IF EXISTS {USERS_TABLE};"
                ))?;
            }
            tx.execute(CREATE_USERS, [])?;
            tx.execute(CREATE_RESTRICTIONS, [])?;
            insert_users(&tx, &users)?;
            insert_restrictions(&tx, &restrictions)?;
            tx.commit()?;
        }

        let snapshot = load_snapshot(&conn)?;
        info!(
            "Credential store ready: {} users, {} restrictions ({:?})",
            snapshot.users.len(),
            snapshot.restriction_rows,
            options.database
        );

        Ok(CredentialStore {
            conn: Mutex::new(conn),
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Insert a batch of users
    ///
    /// The whole batch is rejected if a username repeats within it or is
    /// already stored.
    pub fn add_users(&self, users: &[UserSettings]) -> Result<()> {
        let users = hash_batch(users)?;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        insert_users(&tx, &users)?;
        tx.commit()?;
        self.publish(&conn)?;
        info!("Added {} users", users.len());
        Ok(())
    }

    /// Insert a batch of restrictions
    ///
    /// Duplicate (resource, action) pairs are stored; lookups resolve to the
    /// first one inserted.
    pub fn add_restrictions(&self, restrictions: &[Restriction]) -> Result<()> {
        for restriction in restrictions {
            restriction.check()?;
        }
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        insert_restrictions(&tx, restrictions)?;
        tx.commit()?;
        self.publish(&conn)?;
        info!("Added {} restrictions", restrictions.len());
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Option<User> {
        self.snapshot().users.get(username).cloned()
    }

    pub fn get_restriction(&self, resource: &str, action: &str) -> Option<Restriction> {
        self.snapshot()
            .restrictions
            .get(resource)
            .and_then(|actions| actions.get(action))
            .cloned()
    }

    pub fn users_len(&self) -> usize {
        self.snapshot().users.len()
    }

    /// Number of stored restriction rows, duplicates included
    pub fn restrictions_len(&self) -> usize {
        self.snapshot().restriction_rows
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    fn publish(&self, conn: &Connection) -> Result<()> {
        let snapshot = load_snapshot(conn)?;
        *self.snapshot.write() = Arc::new(snapshot);
        Ok(())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("users", &self.users_len())
            .field("restrictions", &self.restrictions_len())
            .finish()
    }
}

fn existing_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2)",
    )?;
    let names = stmt
        .query_map(params![USERS_TABLE, RESTRICTIONS_TABLE], |row| {
            row.get::<_, String>(0)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Validate and digest a batch, rejecting repeated usernames
fn hash_batch(settings: &[UserSettings]) -> Result<Vec<User>> {
    let mut seen = HashSet::new();
    for user in settings {
        if !seen.insert(user.username.as_str()) {
            return Err(GateError::Configuration(format!(
                "duplicate username '{}' in user batch",
                user.username
            )));
        }
    }
    settings.iter().map(User::from_settings).collect()
}

fn insert_users(tx: &Transaction<'_>, users: &[User]) -> Result<()> {
    for user in users {
        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM weetags__users WHERE username = ?1",
            params![user.username],
            |row| row.get(0),
        )?;
        if exists > 0 {
            return Err(GateError::Configuration(format!(
                "user '{}' already exists",
                user.username
            )));
        }

        tx.execute(
            "INSERT INTO weetags__users (username, password_sha256, auth_level, salt, max_age)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.username,
                user.password_sha256,
                serde_json::to_string(&user.auth_level)?,
                user.salt,
                user.max_age
            ],
        )?;
    }
    Ok(())
}

fn insert_restrictions(tx: &Transaction<'_>, restrictions: &[Restriction]) -> Result<()> {
    for restriction in restrictions {
        tx.execute(
            "INSERT INTO weetags__restrictions (tree, blueprint, auth_level) VALUES (?1, ?2, ?3)",
            params![
                restriction.resource,
                restriction.action,
                serde_json::to_string(&restriction.auth_level)?
            ],
        )?;
    }
    Ok(())
}

fn load_snapshot(conn: &Connection) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();

    let mut stmt = conn.prepare(
        "SELECT username, password_sha256, auth_level, salt, max_age FROM weetags__users",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;
    for row in rows {
        let (username, password_sha256, auth_level, salt, max_age) = row?;
        let user = User {
            username: username.clone(),
            password_sha256,
            auth_level: serde_json::from_str(&auth_level)?,
            salt,
            max_age,
        };
        snapshot.users.insert(username, user);
    }

    let mut stmt = conn
        .prepare("SELECT tree, blueprint, auth_level FROM weetags__restrictions ORDER BY rowid")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (resource, action, auth_level) = row?;
        snapshot.restriction_rows += 1;
        let restriction = Restriction {
            resource: resource.clone(),
            action: action.clone(),
            auth_level: serde_json::from_str(&auth_level)?,
        };
        snapshot
            .restrictions
            .entry(resource)
            .or_default()
            .entry(action)
            .or_insert(restriction);
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admins() -> Vec<UserSettings> {
        vec![
            UserSettings::new("admin", "admin", &["super user"], 600),
            UserSettings::new("admin2", "admin2", &["user"], 600),
        ]
    }

    fn options(users: Option<Vec<UserSettings>>) -> StoreOptions {
        StoreOptions {
            users,
            restrictions: Some(vec![Restriction::new(
                "topics",
                "reader",
                &["admin", "super admin"],
            )]),
            ..StoreOptions::default()
        }
    }

    #[test]
    fn test_initialize_and_lookup() {
        let store = CredentialStore::initialize(options(Some(admins()))).unwrap();

        let user = store.get_user("admin").unwrap();
        assert_eq!(user.auth_level, vec!["super user".to_string()]);
        assert_eq!(user.max_age, 600);
        assert!(user.verify_password("admin"));

        assert!(store.get_user("admin3").is_none());

        let restriction = store.get_restriction("topics", "reader").unwrap();
        assert_eq!(
            restriction.auth_level,
            vec!["admin".to_string(), "super admin".to_string()]
        );
        assert!(store.get_restriction("topics", "writer").is_none());
        assert!(store.get_restriction("other", "reader").is_none());
    }

    #[test]
    fn test_initialize_without_users_fails() {
        let err = CredentialStore::initialize(options(None)).unwrap_err();
        assert!(matches!(err, GateError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_usernames_in_batch() {
        let users = vec![
            UserSettings::new("admin", "a", &["x"], 10),
            UserSettings::new("admin", "b", &["y"], 10),
        ];
        let err = CredentialStore::initialize(options(Some(users))).unwrap_err();
        assert!(matches!(err, GateError::Configuration(_)));
    }

    #[test]
    fn test_add_users_after_init() {
        let store = CredentialStore::initialize(options(Some(admins()))).unwrap();
        store
            .add_users(&[UserSettings::new("bbb", "aaa", &["user"], 1000)])
            .unwrap();

        let user = store.get_user("bbb").unwrap();
        assert_eq!(user.max_age, 1000);
        assert!(user.verify_password("aaa"));
        assert_eq!(store.users_len(), 3);
    }

    #[test]
    fn test_add_existing_user_leaves_store_unchanged() {
        let store = CredentialStore::initialize(options(Some(admins()))).unwrap();
        let before = store.get_user("admin").unwrap();

        let err = store
            .add_users(&[
                UserSettings::new("fresh", "pw", &["user"], 60),
                UserSettings::new("admin", "other", &["user"], 60),
            ])
            .unwrap_err();
        assert!(matches!(err, GateError::Configuration(_)));

        // Whole batch rolled back
        assert!(store.get_user("fresh").is_none());
        assert_eq!(store.get_user("admin").unwrap(), before);
        assert_eq!(store.users_len(), 2);
    }

    #[test]
    fn test_duplicate_restrictions_first_wins() {
        let store = CredentialStore::initialize(options(Some(admins()))).unwrap();
        store
            .add_restrictions(&[Restriction::new("topics", "reader", &["nobody"])])
            .unwrap();

        assert_eq!(store.restrictions_len(), 2);
        let restriction = store.get_restriction("topics", "reader").unwrap();
        assert!(restriction.auth_level.contains(&"admin".to_string()));
    }

    #[test]
    fn test_database_from_string() {
        assert_eq!(Database::from(":memory:"), Database::Memory);
        assert_eq!(
            Database::from("/tmp/auth.db"),
            Database::File(PathBuf::from("/tmp/auth.db"))
        );
    }
}
