//! Long-term memory store client. The store applies the similarity
//! threshold itself; this client only carries it on the request.

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use orq_config::MemoryProviderConfig;
use orq_domain::{Message, Role};

pub async fn search(
	cfg: &MemoryProviderConfig,
	query: &str,
	user_id: &str,
	threshold: f32,
) -> Result<Vec<orq_domain::MemoryRecord>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/v1/memories/search", cfg.api_base);
	let body = serde_json::json!({
		"query": query,
		"user_id": user_id,
		"threshold": threshold,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_memory_results(json)
}

pub async fn add(cfg: &MemoryProviderConfig, messages: &[Message], user_id: &str) -> Result<()> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/v1/memories", cfg.api_base);
	let wire_messages = messages
		.iter()
		.map(|message| {
			let role = match message.role {
				Role::User => "user",
				Role::Assistant => "assistant",
				Role::System => "system",
			};

			serde_json::json!({ "role": role, "content": message.content })
		})
		.collect::<Vec<_>>();
	let body = serde_json::json!({ "messages": wire_messages, "user_id": user_id });
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;

	res.error_for_status()?;

	Ok(())
}

fn parse_memory_results(json: Value) -> Result<Vec<orq_domain::MemoryRecord>> {
	let results = json
		.get("results")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Memory response is missing results array."))?;
	let mut records = Vec::with_capacity(results.len());
	for item in results {
		let memory = item
			.get("memory")
			.and_then(|v| v.as_str())
			.ok_or_else(|| eyre::eyre!("Memory result missing memory text."))?
			.to_string();
		let id = item.get("id").and_then(|v| v.as_str()).map(|id| id.to_string());
		let score = item.get("score").and_then(|v| v.as_f64()).map(|score| score as f32);

		records.push(orq_domain::MemoryRecord { id, memory, score });
	}

	Ok(records)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_memory_records() {
		let json = serde_json::json!({
			"results": [
				{ "id": "m-1", "memory": "Prefers short answers.", "score": 0.82 },
				{ "memory": "Asked about travel rules before." }
			]
		});
		let records = parse_memory_results(json).expect("parse failed");
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].id.as_deref(), Some("m-1"));
		assert_eq!(records[1].memory, "Asked about travel rules before.");
		assert_eq!(records[1].score, None);
	}

	#[test]
	fn rejects_missing_results() {
		assert!(parse_memory_results(serde_json::json!({})).is_err());
	}
}
