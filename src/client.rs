//! Editor-side client for the app builder API
//!
//! [`ApiClient`] is what the editor uses to talk to the service: it attaches
//! the bearer token to every authenticated call and maps failures onto
//! [`ClientError`]. AI calls are the exception; they never fail and fall
//! back to empty results instead.

use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::ai::{
    AppIdeaRequest, OptimizeRequest, OptimizeResponse, OptimizedLayout, SuggestionsResponse,
    Template, TemplateResponse, WidgetSuggestion,
};
use crate::layout::{Component, LayoutDocument, LayoutError, WidgetType};
use crate::model::{
    App, AppDataRecord, AppListResponse, AppResponse, AuthResponse, CreateAppRequest,
    CreateRecordRequest, LoginRequest, PublicAppResponse, RecordListResponse, RecordResponse,
    RegisterRequest, UpdateAppRequest, UpdateProfileRequest, UpdateRecordRequest, UserProfile,
    VisibilityRequest, MAX_PAGE_LIMIT,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An authenticated call was attempted without logging in
    #[error("not logged in")]
    MissingToken,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The app changed on the server since it was loaded
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success status
    #[error("request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never got an answer
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The document failed local validation and was not sent
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Failures caused by the transport rather than by the server's answer
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// A layout as loaded from the server, with the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedLayout {
    pub app_id: String,
    pub version: u64,
    pub document: LayoutDocument,
}

/// Records backing a component in preview mode
#[derive(Debug, Clone)]
pub enum ComponentData {
    /// Every record of the collection, newest first (tables)
    Rows(Vec<AppDataRecord>),
    /// The most recent record, if any (everything else)
    Latest(Option<AppDataRecord>),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(base_url: &str) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .or_else(|| v.get("message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(ClientError::from_status(status, message));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        Self::send(self.authed(method, path)?.json(body)).await
    }

    // --- auth ---

    /// Registers and keeps the returned token
    pub async fn register(&mut self, email: &str, password: &str, name: &str) -> ClientResult<AuthResponse> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        let response: AuthResponse =
            Self::send(self.request(Method::POST, "/auth/register").json(&body)).await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    /// Logs in and keeps the returned token
    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse =
            Self::send(self.request(Method::POST, "/auth/login").json(&body)).await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub async fn profile(&self) -> ClientResult<UserProfile> {
        let response: Value = Self::send(self.authed(Method::GET, "/auth/profile")?).await?;
        Ok(serde_json::from_value(response["user"].clone())?)
    }

    pub async fn update_profile(&self, update: &UpdateProfileRequest) -> ClientResult<UserProfile> {
        let response: Value = self.send_json(Method::PUT, "/auth/profile", update).await?;
        Ok(serde_json::from_value(response["user"].clone())?)
    }

    // --- apps ---

    pub async fn list_apps(&self) -> ClientResult<Vec<App>> {
        let response: AppListResponse = Self::send(self.authed(Method::GET, "/apps")?).await?;
        Ok(response.apps)
    }

    pub async fn create_app(&self, request: &CreateAppRequest) -> ClientResult<App> {
        let response: AppResponse = self.send_json(Method::POST, "/apps", request).await?;
        Ok(response.app)
    }

    pub async fn get_app(&self, app_id: &str) -> ClientResult<App> {
        let response: AppResponse =
            Self::send(self.authed(Method::GET, &format!("/apps/{app_id}"))?).await?;
        Ok(response.app)
    }

    pub async fn update_app(&self, app_id: &str, update: &UpdateAppRequest) -> ClientResult<App> {
        let response: AppResponse = self
            .send_json(Method::PUT, &format!("/apps/{app_id}"), update)
            .await?;
        Ok(response.app)
    }

    pub async fn delete_app(&self, app_id: &str) -> ClientResult<()> {
        let _: Value = Self::send(self.authed(Method::DELETE, &format!("/apps/{app_id}"))?).await?;
        Ok(())
    }

    pub async fn set_visibility(&self, app_id: &str, is_public: bool) -> ClientResult<App> {
        let response: AppResponse = self
            .send_json(
                Method::PATCH,
                &format!("/apps/{app_id}/visibility"),
                &VisibilityRequest { is_public },
            )
            .await?;
        Ok(response.app)
    }

    /// Fetches a published app; sends the token when logged in
    pub async fn public_app(&self, slug: &str) -> ClientResult<PublicAppResponse> {
        let path = format!("/apps/{slug}/public");
        let builder = match self.authed(Method::GET, &path) {
            Ok(builder) => builder,
            Err(_) => self.request(Method::GET, &path),
        };
        Self::send(builder).await
    }

    /// Loads an app's layout for editing
    pub async fn load_layout(&self, app_id: &str) -> ClientResult<LoadedLayout> {
        let app = self.get_app(app_id).await?;
        let document = app.layout_document()?;
        Ok(LoadedLayout {
            app_id: app.id,
            version: app.version,
            document,
        })
    }

    /// Saves the whole document, replacing the stored layout
    ///
    /// The document is validated locally first (unique ids, theme colors).
    /// With `expected_version`, the server refuses the save with
    /// [`ClientError::Conflict`] if someone else saved in between.
    pub async fn save_layout(
        &self,
        app_id: &str,
        document: &LayoutDocument,
        expected_version: Option<u64>,
    ) -> ClientResult<App> {
        document.validate()?;
        let update = UpdateAppRequest {
            layout: Some(serde_json::to_value(document)?),
            expected_version,
            ..UpdateAppRequest::default()
        };
        self.update_app(app_id, &update).await
    }

    // --- data records ---

    pub async fn create_record(&self, app_id: &str, collection: &str, data: Value) -> ClientResult<AppDataRecord> {
        let body = CreateRecordRequest {
            collection: collection.to_string(),
            data,
        };
        let response: RecordResponse = self
            .send_json(Method::POST, &format!("/data/{app_id}"), &body)
            .await?;
        Ok(response.data)
    }

    /// One page of records; sends the token when logged in
    pub async fn list_records(
        &self,
        app_id: &str,
        collection: Option<&str>,
        page: usize,
        limit: usize,
    ) -> ClientResult<RecordListResponse> {
        let path = format!("/data/{app_id}");
        let builder = match self.authed(Method::GET, &path) {
            Ok(builder) => builder,
            Err(_) => self.request(Method::GET, &path),
        };

        let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(collection) = collection {
            query.push(("collection", collection.to_string()));
        }
        Self::send(builder.query(&query)).await
    }

    pub async fn update_record(&self, app_id: &str, record_id: &str, data: Value) -> ClientResult<AppDataRecord> {
        let response: RecordResponse = self
            .send_json(
                Method::PUT,
                &format!("/data/{app_id}/{record_id}"),
                &UpdateRecordRequest { data },
            )
            .await?;
        Ok(response.data)
    }

    pub async fn delete_record(&self, app_id: &str, record_id: &str) -> ClientResult<()> {
        let _: Value = Self::send(
            self.authed(Method::DELETE, &format!("/data/{app_id}/{record_id}"))?,
        )
        .await?;
        Ok(())
    }

    /// Stores a filled-in form as a record of the form's collection
    ///
    /// Adds `timestamp` (RFC 3339) and `formId` to the submitted fields.
    pub async fn submit_form_data(
        &self,
        app_id: &str,
        form: &Component,
        mut fields: Map<String, Value>,
    ) -> ClientResult<AppDataRecord> {
        fields.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
        fields.insert("formId".to_string(), json!(form.id));
        self.create_record(app_id, form.data_collection(), Value::Object(fields))
            .await
    }

    /// Records shown by `component` in preview mode
    ///
    /// Tables get every row of their collection, fetched page by page.
    pub async fn fetch_component_data(&self, app_id: &str, component: &Component) -> ClientResult<ComponentData> {
        let collection = component.data_collection();
        if component.widget_type() == WidgetType::Table {
            let mut rows = Vec::new();
            let mut page = 1;
            loop {
                let batch = self
                    .list_records(app_id, Some(collection), page, MAX_PAGE_LIMIT)
                    .await?;
                let done = batch.data.is_empty() || page >= batch.pagination.pages;
                rows.extend(batch.data);
                if done {
                    break;
                }
                page += 1;
            }
            Ok(ComponentData::Rows(rows))
        } else {
            let page = self.list_records(app_id, Some(collection), 1, 1).await?;
            Ok(ComponentData::Latest(page.data.into_iter().next()))
        }
    }

    // --- AI ---

    /// Widget ideas; empty on any failure
    pub async fn suggest_widgets(&self, app_type: &str, description: &str) -> Vec<WidgetSuggestion> {
        let body = idea(app_type, description);
        match self
            .send_json::<_, SuggestionsResponse>(Method::POST, "/ai/suggest-widgets", &body)
            .await
        {
            Ok(response) => response.suggestions,
            Err(err) => {
                tracing::warn!(error = %err, "widget suggestions failed");
                Vec::new()
            }
        }
    }

    /// A starter template; `None` on any failure
    pub async fn generate_template(&self, app_type: &str, description: &str) -> Option<Template> {
        let body = idea(app_type, description);
        match self
            .send_json::<_, TemplateResponse>(Method::POST, "/ai/generate-template", &body)
            .await
        {
            Ok(response) => response.template,
            Err(err) => {
                tracing::warn!(error = %err, "template generation failed");
                None
            }
        }
    }

    /// Layout tips; empty on any failure
    pub async fn optimize_layout(&self, components: &[Component]) -> OptimizedLayout {
        let body = match components
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(components) => OptimizeRequest { components },
            Err(err) => {
                tracing::warn!(error = %err, "layout could not be encoded");
                return OptimizedLayout::default();
            }
        };
        match self
            .send_json::<_, OptimizeResponse>(Method::POST, "/ai/optimize-layout", &body)
            .await
        {
            Ok(response) => response.optimized_layout,
            Err(err) => {
                tracing::warn!(error = %err, "layout optimisation failed");
                OptimizedLayout::default()
            }
        }
    }
}

fn idea(app_type: &str, description: &str) -> AppIdeaRequest {
    AppIdeaRequest {
        app_type: Some(app_type.to_string()),
        description: Some(description.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_onto_the_taxonomy() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, "x".into()),
            ClientError::Unauthorized(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::CONFLICT, "x".into()),
            ClientError::Conflict(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_REQUEST, "x".into()),
            ClientError::Api { status: 400, .. }
        ));
    }

    #[tokio::test]
    async fn authenticated_calls_need_a_token() {
        let client = ApiClient::new("http://127.0.0.1:9/api/");
        assert_eq!(client.url("/apps"), "http://127.0.0.1:9/api/apps");
        assert!(matches!(client.list_apps().await, Err(ClientError::MissingToken)));
    }

    #[tokio::test]
    async fn invalid_layout_is_not_sent() {
        let mut client = ApiClient::new("http://127.0.0.1:9/api");
        client.set_token(Some("token".to_string()));

        let mut document = LayoutDocument::default();
        document.theme.primary_color = "blue-ish!".to_string();
        let result = client.save_layout("app", &document, None).await;
        assert!(matches!(result, Err(ClientError::Layout(_))));
    }

    #[tokio::test]
    async fn ai_calls_degrade_to_empty_results() {
        let mut client = ApiClient::new("http://127.0.0.1:9/api");
        client.set_token(Some("token".to_string()));

        assert!(client.suggest_widgets("todo", "").await.is_empty());
        assert!(client.generate_template("todo", "").await.is_none());
        assert_eq!(client.optimize_layout(&[]).await, OptimizedLayout::default());
    }
}
