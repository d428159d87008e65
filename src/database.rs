//! Database initialization and table definitions
//!
//! All records are stored as JSON strings in redb tables keyed by id.
//! Secondary tables map unique keys (email, slug) to ids, and the two index
//! tables use composite string keys so that a prefix range yields one
//! owner's apps or one app's records in creation order.

use std::sync::Arc;

use redb::{Database, TableDefinition};

use crate::ai::AiService;
use crate::config::Config;

/// Users by id
///
/// Key: user id (uuid)
/// Value: JSON-serialized [`crate::model::User`]
pub const TABLE_USERS: TableDefinition<&str, &str> = TableDefinition::new("users_v1");

/// Unique email lookup
///
/// Key: normalized email
/// Value: user id
pub const TABLE_USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails_v1");

/// Apps by id
///
/// Key: app id (uuid)
/// Value: JSON-serialized [`crate::model::App`]
pub const TABLE_APPS: TableDefinition<&str, &str> = TableDefinition::new("apps_v1");

/// Unique slug lookup
///
/// Key: slug
/// Value: app id
pub const TABLE_APP_SLUGS: TableDefinition<&str, &str> = TableDefinition::new("app_slugs_v1");

/// Apps of one owner
///
/// Key: `"{owner_id}:{created_micros:020}:{app_id}"`
/// Value: app id
pub const TABLE_APP_OWNER_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("app_owner_index_v1");

/// Data records by id
///
/// Key: record id (uuid)
/// Value: JSON-serialized [`crate::model::AppDataRecord`]
pub const TABLE_APP_DATA: TableDefinition<&str, &str> = TableDefinition::new("app_data_v1");

/// Records of one app, grouped by collection
///
/// Key: `"{app_id}:{collection}:{created_micros:020}:{record_id}"`
/// Value: record id
///
/// The zero-padded timestamp keeps keys in chronological order.
pub const TABLE_APP_DATA_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("app_data_index_v1");

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub ai: AiService,
}

impl AppState {
    pub fn new(db: Database, config: Config, ai: AiService) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
            ai,
        }
    }
}

/// Creates or opens the database file and makes sure every table exists
///
/// # Example
///
/// ```no_run
/// # use appbuilder::database::init_db;
/// let db = init_db("appbuilder.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_USERS)?;
        write_txn.open_table(TABLE_USER_EMAILS)?;
        write_txn.open_table(TABLE_APPS)?;
        write_txn.open_table(TABLE_APP_SLUGS)?;
        write_txn.open_table(TABLE_APP_OWNER_INDEX)?;
        write_txn.open_table(TABLE_APP_DATA)?;
        write_txn.open_table(TABLE_APP_DATA_INDEX)?;
    }
    write_txn.commit()?;

    Ok(db)
}
