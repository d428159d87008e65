//! Data models for the app builder service
//!
//! This module defines the persisted records (users, apps, data records) and
//! the request/response bodies of the HTTP API. Everything is serialized as
//! camelCase JSON, both on the wire and in the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layout::LayoutDocument;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Subscription tier of a user
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
    Enterprise,
}

/// Colors and logo applied to a user's published apps
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Branding {
    pub logo: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            logo: None,
            primary_color: "#3B82F6".to_string(),
            secondary_color: "#10B981".to_string(),
            accent_color: "#F97316".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Workspace {
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub branding: Branding,
}

/// AI calls made by a user in the current calendar month
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiUsage {
    pub monthly: u64,
    pub last_reset: DateTime<Utc>,
}

impl ApiUsage {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            monthly: 0,
            last_reset: now,
        }
    }

    /// Counts one call, starting a fresh count when the month has changed
    pub fn record_call(&mut self, now: DateTime<Utc>) {
        if now.format("%Y-%m").to_string() != self.last_reset.format("%Y-%m").to_string() {
            self.monthly = 0;
            self.last_reset = now;
        }
        self.monthly += 1;
    }
}

/// A registered account as stored in the database
///
/// Carries the password hash, so it is never sent to clients directly; use
/// [`UserProfile`] for responses.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Trimmed and lower-cased; unique across users
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub name: String,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub workspace: Workspace,
    pub api_usage: ApiUsage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a [`User`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub plan: Plan,
    pub workspace: Workspace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_usage: Option<ApiUsage>,
}

impl UserProfile {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            plan: user.plan,
            workspace: user.workspace.clone(),
            api_usage: None,
        }
    }

    /// Profile including the AI usage counter
    pub fn with_usage(user: &User) -> Self {
        Self {
            api_usage: Some(user.api_usage.clone()),
            ..Self::from_user(user)
        }
    }
}

/// Normalized form of an email address used for lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Workspace subdomain: lower-cased alphanumerics of `name` (at most 20),
/// then `-` and the last 4 digits of `millis`
pub fn subdomain_for(name: &str, millis: i64) -> String {
    let base: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(20)
        .collect();
    format!("{}-{:04}", base, millis.rem_euclid(10_000))
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Workspace fields present in a profile update overwrite the stored ones
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspacePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding: Option<Branding>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspacePatch>,
}

/// Returned by register and login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

// ---------------------------------------------------------------------------
// Apps
// ---------------------------------------------------------------------------

/// Category an app was created for
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    Todo,
    Crm,
    Budget,
    Project,
    Event,
    #[default]
    Custom,
}

impl AppType {
    pub fn as_str(self) -> &'static str {
        match self {
            AppType::Todo => "todo",
            AppType::Crm => "crm",
            AppType::Budget => "budget",
            AppType::Project => "project",
            AppType::Event => "event",
            AppType::Custom => "custom",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub allow_comments: bool,
    pub require_auth: bool,
    pub collect_analytics: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            allow_comments: false,
            require_auth: false,
            collect_analytics: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Analytics {
    pub views: u64,
    pub unique_visitors: u64,
    pub last_viewed: Option<DateTime<Utc>>,
}

/// A user's app
///
/// The server stores `layout` as an opaque JSON document and overwrites it
/// wholesale on every update; the editor decodes it with
/// [`App::layout_document`].
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub app_type: AppType,
    pub slug: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub custom_url: Option<String>,
    pub layout: Value,
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default)]
    pub analytics: Analytics,
    /// Starts at 1 and grows by one per update
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl App {
    pub fn layout_document(&self) -> Result<LayoutDocument, serde_json::Error> {
        serde_json::from_value(self.layout.clone())
    }

    /// Copy without per-component runtime `data`, as used in app listings
    pub fn without_component_data(mut self) -> Self {
        if let Some(components) = self
            .layout
            .get_mut("components")
            .and_then(Value::as_array_mut)
        {
            for component in components.iter_mut().filter_map(Value::as_object_mut) {
                component.remove("data");
            }
        }
        self
    }
}

/// URL-safe slug: lower-cased `name` with runs of other characters turned
/// into single dashes, then `-` and the last 6 digits of `millis`
pub fn slugify(name: &str, millis: i64) -> String {
    let mut base = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            base.push(c);
        } else if !base.ends_with('-') {
            base.push('-');
        }
    }
    let base = base.trim_matches('-');
    let base = if base.is_empty() { "app" } else { base };
    format!("{}-{:06}", base, millis.rem_euclid(1_000_000))
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAppRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub app_type: Option<AppType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<AppSettings>,
}

/// Partial update of an app; absent fields are left unchanged
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAppRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub app_type: Option<AppType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<AppSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    /// When present, the update is refused unless it matches the stored version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub app: App,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppListResponse {
    pub apps: Vec<App>,
}

/// Owner details shown next to a published app
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PublicOwner {
    pub name: String,
    pub workspace: Workspace,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PublicAppResponse {
    pub app: App,
    pub owner: Option<PublicOwner>,
}

// ---------------------------------------------------------------------------
// Data records
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub created_by: String,
    pub updated_by: String,
    pub version: u64,
}

/// One JSON record in a collection of an app
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppDataRecord {
    pub id: String,
    pub app_id: String,
    pub owner_id: String,
    pub collection: String,
    pub data: Value,
    pub metadata: RecordMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CreateRecordRequest {
    pub collection: String,
    pub data: Value,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UpdateRecordRequest {
    pub data: Value,
}

/// Query parameters for listing data records
///
/// # Example
/// Query string: `?collection=form-1&page=2&limit=20`
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListRecordsParams {
    /// Restricts the listing to one collection
    pub collection: Option<String>,
    /// Page number, starts from 1 (default: 1)
    pub page: Option<usize>,
    /// Items per page, 1 to 100 (default: 50)
    pub limit: Option<usize>,
}

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

impl ListRecordsParams {
    /// Effective `(page, limit)` after defaults and clamping
    pub fn window(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        (page, limit)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecordResponse {
    pub message: String,
    pub data: AppDataRecord,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecordListResponse {
    pub data: Vec<AppDataRecord>,
    pub pagination: Pagination,
}
