use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use haven_domain::history::{Turn, TurnRole};

use crate::{Error, Result};

/// One stateless chat-completion call.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
	pub model: String,
	/// Extra system context. Never counted as a chat turn.
	pub system: Option<String>,
	pub history: Vec<Turn>,
	pub prompt: String,
	/// JSON schema the answer must satisfy, when the provider supports structured output.
	pub schema: Option<Value>,
}
impl GenerationRequest {
	pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
		Self {
			model: model.into(),
			system: None,
			history: Vec::new(),
			prompt: prompt.into(),
			schema: None,
		}
	}

	pub fn with_system(mut self, system: impl Into<String>) -> Self {
		self.system = Some(system.into());

		self
	}

	pub fn with_history(mut self, history: Vec<Turn>) -> Self {
		self.history = history;

		self
	}

	pub fn with_schema(mut self, schema: Value) -> Self {
		self.schema = Some(schema);

		self
	}
}

pub async fn generate(
	cfg: &haven_config::LlmProviderConfig,
	request: &GenerationRequest,
) -> Result<String> {
	let api_key = cfg.api_key()?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = build_body(cfg, request);
	let res = client
		.post(url)
		.headers(crate::auth_headers(api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	tracing::debug!(model = %request.model, "Generation response received.");

	parse_generation_response(json)
}

pub fn build_messages(request: &GenerationRequest) -> Vec<Value> {
	let mut messages = Vec::with_capacity(request.history.len() + 2);

	if let Some(system) = request.system.as_deref().filter(|system| !system.trim().is_empty()) {
		messages.push(serde_json::json!({ "role": "system", "content": system }));
	}

	for turn in &request.history {
		let role = match turn.role {
			TurnRole::User => "user",
			TurnRole::Model => "assistant",
		};

		messages.push(serde_json::json!({ "role": role, "content": turn.text }));
	}

	messages.push(serde_json::json!({ "role": "user", "content": request.prompt }));

	messages
}

fn build_body(cfg: &haven_config::LlmProviderConfig, request: &GenerationRequest) -> Value {
	let mut body = serde_json::json!({
		"model": request.model,
		"temperature": cfg.temperature,
		"messages": build_messages(request),
	});

	if let Some(schema) = request.schema.as_ref() {
		body["response_format"] = serde_json::json!({
			"type": "json_schema",
			"json_schema": { "name": "response", "schema": schema },
		});
	}

	body
}

fn parse_generation_response(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Generation response is missing message content.".to_string(),
		})?;

	if content.trim().is_empty() {
		return Err(Error::InvalidResponse {
			message: "Generation response content is empty.".to_string(),
		});
	}

	Ok(content.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_first_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "{\"response\": \"hi\"}" } }
			]
		});

		assert_eq!(parse_generation_response(json).expect("parse failed"), "{\"response\": \"hi\"}");
	}

	#[test]
	fn empty_content_is_invalid() {
		let json = serde_json::json!({ "choices": [{ "message": { "content": "  " } }] });

		assert!(matches!(parse_generation_response(json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn history_maps_model_turns_to_assistant() {
		let request = GenerationRequest::new("m", "next")
			.with_system("be kind")
			.with_history(vec![
				Turn { role: TurnRole::User, text: "hello".to_string() },
				Turn { role: TurnRole::Model, text: "hi".to_string() },
			]);
		let messages = build_messages(&request);
		let roles: Vec<&str> =
			messages.iter().filter_map(|message| message["role"].as_str()).collect();

		assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
		assert_eq!(messages[3]["content"], "next");
	}
}
