use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

pub async fn search(cfg: &orq_config::ProviderConfig, query: &str) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"tools": [ { "type": "web_search_preview" } ],
		"input": format!("{query}\nReturn the response to be as concise as possible."),
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

fn parse_search_response(json: Value) -> Result<String> {
	if let Some(text) = json.get("output_text").and_then(|v| v.as_str()) {
		return Ok(text.to_string());
	}

	let output = json
		.get("output")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Web search response is missing output."))?;
	for item in output {
		if item.get("type").and_then(|v| v.as_str()) != Some("message") {
			continue;
		}
		let Some(content) = item.get("content").and_then(|v| v.as_array()) else {
			continue;
		};
		for part in content {
			if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
				return Ok(text.to_string());
			}
		}
	}

	Err(eyre::eyre!("Web search response contains no message text."))
}
