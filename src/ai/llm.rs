//! Chat-completions client for AI suggestions
//!
//! Talks to any OpenAI-compatible `chat/completions` endpoint. The model is
//! asked for a bare JSON object; the answer is located inside whatever text
//! comes back (code fences, leading prose) and only loosely validated.

use std::time::Duration;

use serde_json::{json, Value};

use super::{AppIdeaRequest, OptimizedLayout, Template, TemplateLayout, WidgetSuggestion};
use crate::layout::{Component, WidgetType};

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI endpoint answered with status {0}")]
    Status(u16),

    #[error("malformed AI response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(
        url: &str,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            api_key,
            model: model.to_string(),
        })
    }

    pub async fn suggest_widgets(
        &self,
        request: &AppIdeaRequest,
    ) -> Result<Vec<WidgetSuggestion>, AiError> {
        let prompt = format!(
            "Suggest widgets for a {} app. Description: {}. \
             Answer with JSON {{\"suggestions\": [{{\"type\", \"name\", \"description\"}}]}}. \
             Allowed types: {}.",
            request.app_type.as_deref().unwrap_or("custom"),
            request.description.as_deref().unwrap_or("none"),
            allowed_types(),
        );
        let answer = self.complete(&prompt).await?;
        parse_suggestions(&answer)
    }

    pub async fn generate_template(
        &self,
        request: &AppIdeaRequest,
    ) -> Result<Option<Template>, AiError> {
        let prompt = format!(
            "Design a starter layout for a {} app. Description: {}. \
             Answer with JSON {{\"template\": {{\"name\", \"description\", \"layout\": {{\"components\": \
             [{{\"id\", \"type\", \"position\": {{\"x\", \"y\", \"width\", \"height\"}}, \"props\"}}]}}}}}}. \
             Allowed types: {}.",
            request.app_type.as_deref().unwrap_or("custom"),
            request.description.as_deref().unwrap_or("none"),
            allowed_types(),
        );
        let answer = self.complete(&prompt).await?;
        parse_template(&answer)
    }

    pub async fn optimize_layout(&self, components: &[Value]) -> Result<OptimizedLayout, AiError> {
        let prompt = format!(
            "Review this app layout and suggest improvements. Components: {}. \
             Answer with JSON {{\"suggestions\": [string], \"improvements\": [component]}}.",
            Value::from(components.to_vec()),
        );
        let answer = self.complete(&prompt).await?;
        parse_optimized(&answer)
    }

    /// Sends one chat turn and returns the assistant's text
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [
                { "role": "system", "content": "You help people build small web apps from widgets. Reply with a single JSON object and nothing else." },
                { "role": "user", "content": prompt },
            ],
        });

        let mut builder = self.http.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Status(status.as_u16()));
        }

        let payload: Value = response.json().await?;
        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AiError::Malformed("no choices[0].message.content".to_string()))
    }
}

fn allowed_types() -> String {
    WidgetType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Locates a JSON object in model output
///
/// Accepts a bare object, an object inside a code fence, or an object with
/// prose around it.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn object_from(answer: &str) -> Result<Value, AiError> {
    extract_json(answer).ok_or_else(|| AiError::Malformed("no JSON object in answer".to_string()))
}

/// Reads `suggestions`; entries with an unknown widget type are skipped
pub fn parse_suggestions(answer: &str) -> Result<Vec<WidgetSuggestion>, AiError> {
    let value = object_from(answer)?;
    let entries = value
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(|| AiError::Malformed("missing suggestions".to_string()))?;

    Ok(entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<WidgetSuggestion>(entry.clone()).ok())
        .collect())
}

/// Reads `template`; components that do not decode are dropped
pub fn parse_template(answer: &str) -> Result<Option<Template>, AiError> {
    let value = object_from(answer)?;
    let Some(template) = value.get("template") else {
        return Err(AiError::Malformed("missing template".to_string()));
    };
    if template.is_null() {
        return Ok(None);
    }

    let name = template
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| AiError::Malformed("template without name".to_string()))?;
    let description = template
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let components = template
        .pointer("/layout/components")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<Component>(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    Ok(Some(Template {
        name: name.to_string(),
        description: description.to_string(),
        layout: TemplateLayout { components },
    }))
}

/// Reads `suggestions` (strings) and the optional `improvements` list
pub fn parse_optimized(answer: &str) -> Result<OptimizedLayout, AiError> {
    let value = object_from(answer)?;
    let suggestions = value
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(|| AiError::Malformed("missing suggestions".to_string()))?
        .iter()
        .filter_map(|s| s.as_str().map(str::to_string))
        .collect();
    let improvements = value.get("improvements").and_then(Value::as_array).cloned();

    Ok(OptimizedLayout {
        suggestions,
        improvements,
    })
}
