//! Apps and their owner/slug indexes

use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};
use serde_json::Value;
use uuid::Uuid;

use super::{decode, encode, prefix_end, records};
use crate::database::{TABLE_APPS, TABLE_APP_OWNER_INDEX, TABLE_APP_SLUGS};
use crate::error::{AppError, AppResult};
use crate::layout::LayoutDocument;
use crate::model::{slugify, Analytics, App, CreateAppRequest, UpdateAppRequest};

fn owner_index_key(owner_id: &str, created_at: DateTime<Utc>, app_id: &str) -> String {
    format!("{}:{:020}:{}", owner_id, created_at.timestamp_micros(), app_id)
}

fn not_found() -> AppError {
    AppError::NotFound("App not found".into())
}

/// Creates an app owned by `owner_id`
///
/// A missing layout becomes an empty [`LayoutDocument`]. The slug is derived
/// from the name once; a taken slug gets a random suffix.
pub fn create_app(db: &Database, owner_id: &str, request: CreateAppRequest) -> AppResult<App> {
    let now = Utc::now();
    let layout = match request.layout {
        Some(layout) if !layout.is_null() => layout,
        _ => serde_json::to_value(LayoutDocument::default())?,
    };
    let mut app = App {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        name: request.name.trim().to_string(),
        description: request.description.unwrap_or_default().trim().to_string(),
        app_type: request.app_type.unwrap_or_default(),
        slug: slugify(&request.name, now.timestamp_millis()),
        is_public: false,
        custom_url: None,
        layout,
        settings: request.settings.unwrap_or_default(),
        analytics: Analytics::default(),
        version: 1,
        created_at: now,
        updated_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        let mut slugs = write_txn.open_table(TABLE_APP_SLUGS)?;
        let base = app.slug.clone();
        while slugs.get(app.slug.as_str())?.is_some() {
            let suffix: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(4)
                .map(|c| char::from(c).to_ascii_lowercase())
                .collect();
            app.slug = format!("{}-{}", base, suffix);
        }
        slugs.insert(app.slug.as_str(), app.id.as_str())?;

        let mut apps = write_txn.open_table(TABLE_APPS)?;
        apps.insert(app.id.as_str(), encode(&app)?.as_str())?;

        let mut index = write_txn.open_table(TABLE_APP_OWNER_INDEX)?;
        let key = owner_index_key(owner_id, app.created_at, &app.id);
        index.insert(key.as_str(), app.id.as_str())?;
    }
    write_txn.commit()?;

    tracing::info!(app_id = %app.id, slug = %app.slug, "app created");
    Ok(app)
}

/// Apps of `owner_id`, most recently updated first, without component data
pub fn list_apps(db: &Database, owner_id: &str) -> AppResult<Vec<App>> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(TABLE_APP_OWNER_INDEX)?;
    let apps = read_txn.open_table(TABLE_APPS)?;

    let start = format!("{}:", owner_id);
    let end = prefix_end(&start);

    let mut result = Vec::new();
    for entry in index.range(start.as_str()..end.as_str())? {
        let (_, app_id) = entry?;
        if let Some(raw) = apps.get(app_id.value())? {
            let app: App = decode(raw.value())?;
            result.push(app.without_component_data());
        }
    }
    result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(result)
}

pub fn get_app(db: &Database, id: &str) -> AppResult<Option<App>> {
    let read_txn = db.begin_read()?;
    let apps = read_txn.open_table(TABLE_APPS)?;
    let raw = apps.get(id)?.map(|guard| guard.value().to_string());
    raw.as_deref().map(decode).transpose()
}

/// The app with `id` if `owner_id` owns it; anything else is a 404
pub fn get_owned_app(db: &Database, id: &str, owner_id: &str) -> AppResult<App> {
    get_app(db, id)?
        .filter(|app| app.owner_id == owner_id)
        .ok_or_else(not_found)
}

/// Reads an app owned by `owner_id` inside `txn`
pub(super) fn load_owned(txn: &WriteTransaction, id: &str, owner_id: &str) -> AppResult<App> {
    let apps = txn.open_table(TABLE_APPS)?;
    let raw = apps
        .get(id)?
        .map(|guard| guard.value().to_string())
        .ok_or_else(not_found)?;
    let app: App = decode(&raw)?;
    if app.owner_id != owner_id {
        return Err(not_found());
    }
    Ok(app)
}

fn store(txn: &WriteTransaction, app: &App) -> AppResult<()> {
    let mut apps = txn.open_table(TABLE_APPS)?;
    apps.insert(app.id.as_str(), encode(app)?.as_str())?;
    Ok(())
}

/// Applies a partial update and bumps the version
///
/// The layout is replaced wholesale. With `expected_version` set, the
/// update is refused with 409 unless it matches the stored version.
pub fn update_app(
    db: &Database,
    id: &str,
    owner_id: &str,
    update: UpdateAppRequest,
) -> AppResult<App> {
    let write_txn = db.begin_write()?;
    let app = {
        let mut app = load_owned(&write_txn, id, owner_id)?;

        if let Some(expected) = update.expected_version {
            if expected != app.version {
                return Err(AppError::Conflict(format!(
                    "App was modified elsewhere (expected version {}, found {})",
                    expected, app.version
                )));
            }
        }

        if let Some(name) = update.name.map(|n| n.trim().to_string()) {
            if name.is_empty() {
                return Err(AppError::BadRequest("App name cannot be empty".into()));
            }
            app.name = name;
        }
        if let Some(description) = update.description {
            app.description = description.trim().to_string();
        }
        if let Some(app_type) = update.app_type {
            app.app_type = app_type;
        }
        if let Some(layout) = update.layout.filter(|l| !l.is_null()) {
            app.layout = layout;
        }
        if let Some(settings) = update.settings {
            app.settings = settings;
        }
        if let Some(is_public) = update.is_public {
            app.is_public = is_public;
        }
        if let Some(custom_url) = update.custom_url {
            app.custom_url = Some(custom_url).filter(|u| !u.is_empty());
        }

        app.version += 1;
        app.updated_at = Utc::now();
        store(&write_txn, &app)?;
        app
    };
    write_txn.commit()?;

    tracing::info!(app_id = %app.id, version = app.version, "app updated");
    Ok(app)
}

pub fn set_visibility(db: &Database, id: &str, owner_id: &str, is_public: bool) -> AppResult<App> {
    let write_txn = db.begin_write()?;
    let app = {
        let mut app = load_owned(&write_txn, id, owner_id)?;
        app.is_public = is_public;
        app.updated_at = Utc::now();
        store(&write_txn, &app)?;
        app
    };
    write_txn.commit()?;

    tracing::info!(app_id = %app.id, is_public, "app visibility changed");
    Ok(app)
}

/// Deletes an app together with its indexes and data records
///
/// Returns the number of records removed.
pub fn delete_app(db: &Database, id: &str, owner_id: &str) -> AppResult<usize> {
    let write_txn = db.begin_write()?;
    let removed = {
        let app = load_owned(&write_txn, id, owner_id)?;

        let mut apps = write_txn.open_table(TABLE_APPS)?;
        apps.remove(id)?;

        let mut slugs = write_txn.open_table(TABLE_APP_SLUGS)?;
        slugs.remove(app.slug.as_str())?;

        let mut index = write_txn.open_table(TABLE_APP_OWNER_INDEX)?;
        let key = owner_index_key(&app.owner_id, app.created_at, &app.id);
        index.remove(key.as_str())?;

        records::delete_all_for_app(&write_txn, id)?
    };
    write_txn.commit()?;

    tracing::info!(app_id = %id, records = removed, "app deleted");
    Ok(removed)
}

/// Looks up a published app by slug and counts the view
///
/// Unpublished and unknown slugs both yield `None`.
pub fn view_public_app(db: &Database, slug: &str) -> AppResult<Option<App>> {
    let write_txn = db.begin_write()?;
    let app = {
        let slugs = write_txn.open_table(TABLE_APP_SLUGS)?;
        let Some(id) = slugs.get(slug)?.map(|guard| guard.value().to_string()) else {
            return Ok(None);
        };

        let mut apps = write_txn.open_table(TABLE_APPS)?;
        let Some(raw) = apps.get(id.as_str())?.map(|guard| guard.value().to_string()) else {
            return Ok(None);
        };
        let mut app: App = decode(&raw)?;
        if !app.is_public {
            return Ok(None);
        }

        app.analytics.views += 1;
        app.analytics.last_viewed = Some(Utc::now());
        apps.insert(id.as_str(), encode(&app)?.as_str())?;
        app
    };
    write_txn.commit()?;
    Ok(Some(app))
}

/// Number of components in a stored layout
pub fn component_count(layout: &Value) -> usize {
    layout
        .get("components")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_db;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn temp_db() -> (Database, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let db = init_db(file.path().to_str().unwrap()).unwrap();
        (db, file)
    }

    fn named(name: &str) -> CreateAppRequest {
        CreateAppRequest {
            name: name.to_string(),
            ..CreateAppRequest::default()
        }
    }

    #[test]
    fn create_fills_defaults() {
        let (db, _file) = temp_db();
        let app = create_app(&db, "owner-1", named("My Tasks")).unwrap();

        assert_eq!(app.version, 1);
        assert!(app.slug.starts_with("my-tasks-"));
        assert!(!app.is_public);
        assert!(app.settings.collect_analytics);
        let layout = app.layout_document().unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.grid().get(), 20);
    }

    #[test]
    fn colliding_slug_gets_suffix() {
        let (db, _file) = temp_db();
        let mut slugs = std::collections::HashSet::new();
        for _ in 0..5 {
            let app = create_app(&db, "owner-1", named("Same Name")).unwrap();
            assert!(slugs.insert(app.slug));
        }
    }

    #[test]
    fn owners_only_see_their_apps() {
        let (db, _file) = temp_db();
        let mine = create_app(&db, "owner-1", named("Mine")).unwrap();
        create_app(&db, "owner-2", named("Theirs")).unwrap();

        let listed = list_apps(&db, "owner-1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);

        assert!(matches!(get_owned_app(&db, &mine.id, "owner-2"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn update_bumps_version_and_checks_expected_version() {
        let (db, _file) = temp_db();
        let app = create_app(&db, "owner-1", named("Tasks")).unwrap();

        let layout = json!({"components": [], "gridSize": 10});
        let updated = update_app(
            &db,
            &app.id,
            "owner-1",
            UpdateAppRequest {
                layout: Some(layout.clone()),
                expected_version: Some(1),
                ..UpdateAppRequest::default()
            },
        )
        .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.layout, layout);
        assert_eq!(updated.slug, app.slug);

        let stale = update_app(
            &db,
            &app.id,
            "owner-1",
            UpdateAppRequest {
                name: Some("Renamed".to_string()),
                expected_version: Some(1),
                ..UpdateAppRequest::default()
            },
        );
        assert!(matches!(stale, Err(AppError::Conflict(_))));
        assert_eq!(get_app(&db, &app.id).unwrap().unwrap().name, "Tasks");
    }

    #[test]
    fn public_view_counts_and_respects_visibility() {
        let (db, _file) = temp_db();
        let app = create_app(&db, "owner-1", named("Shop")).unwrap();
        assert!(view_public_app(&db, &app.slug).unwrap().is_none());

        set_visibility(&db, &app.id, "owner-1", true).unwrap();
        view_public_app(&db, &app.slug).unwrap();
        let viewed = view_public_app(&db, &app.slug).unwrap().unwrap();
        assert_eq!(viewed.analytics.views, 2);
        assert!(viewed.analytics.last_viewed.is_some());

        assert!(view_public_app(&db, "no-such-slug").unwrap().is_none());
    }

    #[test]
    fn delete_removes_app_and_indexes() {
        let (db, _file) = temp_db();
        let app = create_app(&db, "owner-1", named("Gone")).unwrap();

        assert!(matches!(delete_app(&db, &app.id, "owner-2"), Err(AppError::NotFound(_))));
        delete_app(&db, &app.id, "owner-1").unwrap();

        assert!(get_app(&db, &app.id).unwrap().is_none());
        assert!(list_apps(&db, "owner-1").unwrap().is_empty());
        assert!(view_public_app(&db, &app.slug).unwrap().is_none());
    }

    #[test]
    fn component_count_reads_layout() {
        assert_eq!(component_count(&json!({"components": [{}, {}]})), 2);
        assert_eq!(component_count(&json!(null)), 0);
    }
}
