//! User accounts

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable};
use uuid::Uuid;

use super::{decode, encode};
use crate::database::{TABLE_USERS, TABLE_USER_EMAILS};
use crate::error::{AppError, AppResult};
use crate::model::{
    normalize_email, subdomain_for, ApiUsage, Plan, UpdateProfileRequest, User, Workspace,
};

/// Inserts a new user; fails with 400 when the email is already registered
pub fn create_user(db: &Database, email: &str, password_hash: String, name: &str) -> AppResult<User> {
    let email = normalize_email(email);
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.clone(),
        password_hash,
        name: name.trim().to_string(),
        plan: Plan::Free,
        workspace: Workspace {
            subdomain: subdomain_for(name, now.timestamp_millis()),
            ..Workspace::default()
        },
        api_usage: ApiUsage::new(now),
        created_at: now,
        updated_at: now,
    };
    let user_json = encode(&user)?;

    let write_txn = db.begin_write()?;
    {
        let mut emails = write_txn.open_table(TABLE_USER_EMAILS)?;
        if emails.get(email.as_str())?.is_some() {
            return Err(AppError::BadRequest("User already exists".into()));
        }
        emails.insert(email.as_str(), user.id.as_str())?;

        let mut users = write_txn.open_table(TABLE_USERS)?;
        users.insert(user.id.as_str(), user_json.as_str())?;
    }
    write_txn.commit()?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub fn get_user(db: &Database, id: &str) -> AppResult<Option<User>> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(TABLE_USERS)?;
    let raw = users.get(id)?.map(|guard| guard.value().to_string());
    raw.as_deref().map(decode).transpose()
}

pub fn find_by_email(db: &Database, email: &str) -> AppResult<Option<User>> {
    let email = normalize_email(email);
    let read_txn = db.begin_read()?;
    let emails = read_txn.open_table(TABLE_USER_EMAILS)?;
    let Some(id) = emails.get(email.as_str())?.map(|guard| guard.value().to_string()) else {
        return Ok(None);
    };

    let users = read_txn.open_table(TABLE_USERS)?;
    let raw = users.get(id.as_str())?.map(|guard| guard.value().to_string());
    raw.as_deref().map(decode).transpose()
}

/// Loads, modifies and stores one user inside a single write transaction
fn modify_user<T>(
    db: &Database,
    id: &str,
    change: impl FnOnce(&mut User) -> T,
) -> AppResult<(User, T)> {
    let write_txn = db.begin_write()?;
    let result = {
        let mut users = write_txn.open_table(TABLE_USERS)?;
        let raw = users
            .get(id)?
            .map(|guard| guard.value().to_string())
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let mut user: User = decode(&raw)?;
        let output = change(&mut user);
        users.insert(id, encode(&user)?.as_str())?;
        (user, output)
    };
    write_txn.commit()?;
    Ok(result)
}

/// Applies a profile update; workspace fields present in the request overwrite stored ones
pub fn update_profile(db: &Database, id: &str, update: UpdateProfileRequest) -> AppResult<User> {
    let (user, ()) = modify_user(db, id, |user| {
        if let Some(name) = update.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            user.name = name;
        }
        if let Some(patch) = update.workspace {
            if let Some(subdomain) = patch.subdomain {
                user.workspace.subdomain = subdomain;
            }
            if let Some(custom_domain) = patch.custom_domain {
                user.workspace.custom_domain = Some(custom_domain);
            }
            if let Some(branding) = patch.branding {
                user.workspace.branding = branding;
            }
        }
        user.updated_at = Utc::now();
    })?;
    Ok(user)
}

/// Counts one AI call against the user's monthly usage
pub fn record_api_usage(db: &Database, id: &str) -> AppResult<ApiUsage> {
    let (user, ()) = modify_user(db, id, |user| user.api_usage.record_call(Utc::now()))?;
    Ok(user.api_usage)
}
