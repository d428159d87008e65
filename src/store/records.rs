//! Data records of apps, grouped by collection

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use serde_json::Value;
use uuid::Uuid;

use super::apps::{get_app, load_owned};
use super::{decode, encode, prefix_end};
use crate::database::{TABLE_APP_DATA, TABLE_APP_DATA_INDEX};
use crate::error::{AppError, AppResult};
use crate::model::{AppDataRecord, ListRecordsParams, Pagination, RecordMetadata, User};

fn index_key(app_id: &str, collection: &str, created_at: DateTime<Utc>, record_id: &str) -> String {
    format!(
        "{}:{}:{:020}:{}",
        app_id,
        collection,
        created_at.timestamp_micros(),
        record_id
    )
}

/// Splits the part after `"{app_id}:"` into `(collection, micros, record_id)`
///
/// The collection may itself contain `':'`, so the key is split from the right.
fn split_index_key(rest: &str) -> Option<(&str, &str, &str)> {
    let mut parts = rest.rsplitn(3, ':');
    let record_id = parts.next()?;
    let micros = parts.next()?;
    let collection = parts.next()?;
    Some((collection, micros, record_id))
}

fn record_not_found() -> AppError {
    AppError::NotFound("Data record not found".into())
}

/// Adds a record to `collection` of an app owned by `user`
pub fn create_record(
    db: &Database,
    app_id: &str,
    user: &User,
    collection: &str,
    data: Value,
) -> AppResult<AppDataRecord> {
    let now = Utc::now();
    let record = AppDataRecord {
        id: Uuid::new_v4().to_string(),
        app_id: app_id.to_string(),
        owner_id: user.id.clone(),
        collection: collection.to_string(),
        data,
        metadata: RecordMetadata {
            created_by: user.name.clone(),
            updated_by: user.name.clone(),
            version: 1,
        },
        created_at: now,
        updated_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        load_owned(&write_txn, app_id, &user.id)?;

        let mut records = write_txn.open_table(TABLE_APP_DATA)?;
        records.insert(record.id.as_str(), encode(&record)?.as_str())?;

        let mut index = write_txn.open_table(TABLE_APP_DATA_INDEX)?;
        let key = index_key(app_id, collection, record.created_at, &record.id);
        index.insert(key.as_str(), record.id.as_str())?;
    }
    write_txn.commit()?;

    tracing::info!(app_id, record_id = %record.id, collection, "record created");
    Ok(record)
}

/// One page of an app's records, newest first
///
/// Private apps are only readable by their owner (`viewer`).
pub fn list_records(
    db: &Database,
    app_id: &str,
    viewer: Option<&str>,
    params: &ListRecordsParams,
) -> AppResult<(Vec<AppDataRecord>, Pagination)> {
    let app = get_app(db, app_id)?.ok_or_else(|| AppError::NotFound("App not found".into()))?;
    if !app.is_public && viewer != Some(app.owner_id.as_str()) {
        return Err(AppError::Forbidden("Access denied".into()));
    }

    let collection = params.collection.as_deref().filter(|c| !c.is_empty());
    let (page, limit) = params.window();

    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(TABLE_APP_DATA_INDEX)?;
    let records = read_txn.open_table(TABLE_APP_DATA)?;

    let start = format!("{}:", app_id);
    let end = prefix_end(&start);

    // (micros, record id) of every matching record
    let mut matches: Vec<(String, String)> = Vec::new();
    for entry in index.range(start.as_str()..end.as_str())? {
        let (key, _) = entry?;
        let key = key.value();
        let Some((entry_collection, micros, record_id)) = split_index_key(&key[start.len()..])
        else {
            continue;
        };
        if collection.is_some_and(|c| c != entry_collection) {
            continue;
        }
        matches.push((micros.to_string(), record_id.to_string()));
    }
    matches.sort_unstable_by(|a, b| b.cmp(a));

    let total = matches.len();
    let mut data = Vec::with_capacity(limit.min(total));
    let offset = (page - 1).saturating_mul(limit);
    for (_, record_id) in matches.iter().skip(offset).take(limit) {
        if let Some(raw) = records.get(record_id.as_str())? {
            data.push(decode::<AppDataRecord>(raw.value())?);
        }
    }

    Ok((data, Pagination::new(page, limit, total)))
}

/// Reads a record of `app_id` owned by `user_id` inside `txn`
fn load_owned_record(
    txn: &WriteTransaction,
    app_id: &str,
    record_id: &str,
    user_id: &str,
) -> AppResult<AppDataRecord> {
    let records = txn.open_table(TABLE_APP_DATA)?;
    let raw = records
        .get(record_id)?
        .map(|guard| guard.value().to_string())
        .ok_or_else(record_not_found)?;
    let record: AppDataRecord = decode(&raw)?;
    if record.app_id != app_id || record.owner_id != user_id {
        return Err(record_not_found());
    }
    Ok(record)
}

/// Replaces a record's data and bumps its version
pub fn update_record(
    db: &Database,
    app_id: &str,
    record_id: &str,
    user: &User,
    data: Value,
) -> AppResult<AppDataRecord> {
    let write_txn = db.begin_write()?;
    let record = {
        let mut record = load_owned_record(&write_txn, app_id, record_id, &user.id)?;
        record.data = data;
        record.metadata.updated_by = user.name.clone();
        record.metadata.version += 1;
        record.updated_at = Utc::now();

        let mut records = write_txn.open_table(TABLE_APP_DATA)?;
        records.insert(record_id, encode(&record)?.as_str())?;
        record
    };
    write_txn.commit()?;

    tracing::info!(app_id, record_id, version = record.metadata.version, "record updated");
    Ok(record)
}

pub fn delete_record(db: &Database, app_id: &str, record_id: &str, user: &User) -> AppResult<()> {
    let write_txn = db.begin_write()?;
    {
        let record = load_owned_record(&write_txn, app_id, record_id, &user.id)?;

        let mut records = write_txn.open_table(TABLE_APP_DATA)?;
        records.remove(record_id)?;

        let mut index = write_txn.open_table(TABLE_APP_DATA_INDEX)?;
        let key = index_key(app_id, &record.collection, record.created_at, record_id);
        index.remove(key.as_str())?;
    }
    write_txn.commit()?;

    tracing::info!(app_id, record_id, "record deleted");
    Ok(())
}

/// Removes every record of `app_id` inside `txn`; returns how many were removed
pub(super) fn delete_all_for_app(txn: &WriteTransaction, app_id: &str) -> AppResult<usize> {
    let start = format!("{}:", app_id);
    let end = prefix_end(&start);

    let mut index = txn.open_table(TABLE_APP_DATA_INDEX)?;
    let mut entries: Vec<(String, String)> = Vec::new();
    for entry in index.range(start.as_str()..end.as_str())? {
        let (key, record_id) = entry?;
        entries.push((key.value().to_string(), record_id.value().to_string()));
    }

    let mut records = txn.open_table(TABLE_APP_DATA)?;
    for (key, record_id) in &entries {
        index.remove(key.as_str())?;
        records.remove(record_id.as_str())?;
    }
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_db;
    use crate::model::CreateAppRequest;
    use crate::store::{apps, users};
    use serde_json::json;
    use tempfile::NamedTempFile;

    struct Fixture {
        db: Database,
        owner: User,
        stranger: User,
        app_id: String,
        _file: NamedTempFile,
    }

    fn fixture() -> Fixture {
        let file = NamedTempFile::new().unwrap();
        let db = init_db(file.path().to_str().unwrap()).unwrap();
        let owner = users::create_user(&db, "owner@example.com", "hash".into(), "Owner").unwrap();
        let stranger = users::create_user(&db, "other@example.com", "hash".into(), "Other").unwrap();
        let app = apps::create_app(
            &db,
            &owner.id,
            CreateAppRequest {
                name: "Tasks".to_string(),
                ..CreateAppRequest::default()
            },
        )
        .unwrap();
        Fixture {
            db,
            owner,
            stranger,
            app_id: app.id,
            _file: file,
        }
    }

    fn params(collection: Option<&str>, page: usize, limit: usize) -> ListRecordsParams {
        ListRecordsParams {
            collection: collection.map(str::to_string),
            page: Some(page),
            limit: Some(limit),
        }
    }

    #[test]
    fn split_key_allows_colons_in_collection() {
        assert_eq!(
            split_index_key("a:b:00000000000000000001:rec"),
            Some(("a:b", "00000000000000000001", "rec"))
        );
        assert_eq!(split_index_key("broken"), None);
    }

    #[test]
    fn only_the_owner_can_write() {
        let f = fixture();
        let err = create_record(&f.db, &f.app_id, &f.stranger, "tasks", json!({})).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let record = create_record(&f.db, &f.app_id, &f.owner, "tasks", json!({"title": "a"})).unwrap();
        assert_eq!(record.metadata.created_by, "Owner");
        assert_eq!(record.metadata.version, 1);

        let err = update_record(&f.db, &f.app_id, &record.id, &f.stranger, json!({})).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = delete_record(&f.db, "other-app", &record.id, &f.owner).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn listing_filters_by_collection_newest_first() {
        let f = fixture();
        for i in 0..3 {
            create_record(&f.db, &f.app_id, &f.owner, "tasks", json!({"n": i})).unwrap();
        }
        create_record(&f.db, &f.app_id, &f.owner, "tasks:archived", json!({"n": 99})).unwrap();

        let (data, pagination) =
            list_records(&f.db, &f.app_id, Some(&f.owner.id), &params(Some("tasks"), 1, 2)).unwrap();
        assert_eq!(pagination, Pagination::new(1, 2, 3));
        assert_eq!(data[0].data["n"], 2);
        assert_eq!(data[1].data["n"], 1);

        let (data, _) =
            list_records(&f.db, &f.app_id, Some(&f.owner.id), &params(Some("tasks"), 2, 2)).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].data["n"], 0);

        let (all, pagination) =
            list_records(&f.db, &f.app_id, Some(&f.owner.id), &params(None, 1, 50)).unwrap();
        assert_eq!(pagination.total, 4);
        assert_eq!(all[0].data["n"], 99);
    }

    #[test]
    fn page_far_past_the_end_is_empty() {
        let f = fixture();
        create_record(&f.db, &f.app_id, &f.owner, "tasks", json!({"n": 1})).unwrap();

        let (data, pagination) =
            list_records(&f.db, &f.app_id, Some(&f.owner.id), &params(None, usize::MAX, 100)).unwrap();
        assert!(data.is_empty());
        assert_eq!(pagination.page, usize::MAX);
        assert_eq!(pagination.total, 1);
    }

    #[test]
    fn private_apps_are_owner_only() {
        let f = fixture();
        let err = list_records(&f.db, &f.app_id, Some(&f.stranger.id), &ListRecordsParams::default()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = list_records(&f.db, &f.app_id, None, &ListRecordsParams::default()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        apps::set_visibility(&f.db, &f.app_id, &f.owner.id, true).unwrap();
        assert!(list_records(&f.db, &f.app_id, None, &ListRecordsParams::default()).is_ok());

        let err = list_records(&f.db, "missing", None, &ListRecordsParams::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn update_bumps_version_and_delete_removes() {
        let f = fixture();
        let record = create_record(&f.db, &f.app_id, &f.owner, "tasks", json!({"done": false})).unwrap();

        let updated = update_record(&f.db, &f.app_id, &record.id, &f.owner, json!({"done": true})).unwrap();
        assert_eq!(updated.metadata.version, 2);
        assert_eq!(updated.data, json!({"done": true}));

        delete_record(&f.db, &f.app_id, &record.id, &f.owner).unwrap();
        let (data, _) = list_records(&f.db, &f.app_id, Some(&f.owner.id), &ListRecordsParams::default()).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn deleting_the_app_removes_its_records() {
        let f = fixture();
        create_record(&f.db, &f.app_id, &f.owner, "tasks", json!({})).unwrap();
        create_record(&f.db, &f.app_id, &f.owner, "notes", json!({})).unwrap();

        let removed = apps::delete_app(&f.db, &f.app_id, &f.owner.id).unwrap();
        assert_eq!(removed, 2);
    }
}
