//! AI suggestions: widget ideas, starter templates and layout tips
//!
//! [`AiService`] answers from an OpenAI-compatible chat endpoint when one is
//! configured and from the built-in [`catalog`] otherwise. Its methods never
//! fail: a broken or malformed upstream answer degrades to an empty result
//! and a `warn` log line.

pub mod catalog;
pub mod llm;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AiConfig;
use crate::layout::{Component, WidgetType};

pub use llm::{AiError, LlmClient};

/// One proposed widget for an app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSuggestion {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl WidgetSuggestion {
    pub fn new(widget_type: WidgetType, name: &str, description: &str) -> Self {
        Self {
            widget_type,
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateLayout {
    #[serde(default)]
    pub components: Vec<Component>,
}

/// A starter layout the editor can apply to a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub layout: TemplateLayout,
}

/// Layout review: human-readable tips and optionally corrected components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizedLayout {
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvements: Option<Vec<Value>>,
}

/// Body of `suggest-widgets` and `generate-template`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppIdeaRequest {
    pub app_type: Option<String>,
    pub description: Option<String>,
}

/// Body of `optimize-layout`; components are taken as raw JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeRequest {
    pub components: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<WidgetSuggestion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateResponse {
    #[serde(default)]
    pub template: Option<Template>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    #[serde(default)]
    pub optimized_layout: OptimizedLayout,
}

#[derive(Debug, Clone, Default)]
enum Source {
    #[default]
    Catalog,
    Llm(LlmClient),
}

/// Suggestion backend shared by the AI handlers
#[derive(Debug, Clone, Default)]
pub struct AiService {
    source: Source,
}

impl AiService {
    /// Built-in catalog only
    pub fn catalog() -> Self {
        Self::default()
    }

    pub fn with_llm(client: LlmClient) -> Self {
        Self {
            source: Source::Llm(client),
        }
    }

    /// Uses the chat endpoint when `AI_API_URL` is configured
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        match &config.api_url {
            Some(url) => {
                tracing::info!(%url, model = %config.model, "AI suggestions use the chat endpoint");
                Ok(Self::with_llm(LlmClient::new(
                    url,
                    config.api_key.clone(),
                    &config.model,
                    config.timeout,
                )?))
            }
            None => {
                tracing::info!("AI suggestions use the built-in catalog");
                Ok(Self::catalog())
            }
        }
    }

    pub fn is_llm(&self) -> bool {
        matches!(self.source, Source::Llm(_))
    }

    pub async fn suggest_widgets(&self, request: &AppIdeaRequest) -> Vec<WidgetSuggestion> {
        match &self.source {
            Source::Catalog => catalog::suggest_widgets(request.app_type.as_deref()),
            Source::Llm(client) => client.suggest_widgets(request).await.unwrap_or_else(|err| {
                tracing::warn!(error = %err, "widget suggestions unavailable");
                Vec::new()
            }),
        }
    }

    pub async fn generate_template(&self, request: &AppIdeaRequest) -> Option<Template> {
        match &self.source {
            Source::Catalog => Some(catalog::generate_template(request.app_type.as_deref())),
            Source::Llm(client) => client.generate_template(request).await.unwrap_or_else(|err| {
                tracing::warn!(error = %err, "template generation unavailable");
                None
            }),
        }
    }

    pub async fn optimize_layout(&self, components: &[Value]) -> OptimizedLayout {
        match &self.source {
            Source::Catalog => catalog::optimize_layout(components),
            Source::Llm(client) => client.optimize_layout(components).await.unwrap_or_else(|err| {
                tracing::warn!(error = %err, "layout optimisation unavailable");
                OptimizedLayout::default()
            }),
        }
    }
}
