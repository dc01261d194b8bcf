use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

pub async fn embed(cfg: &orq_config::EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": [text],
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json)
}

fn parse_embedding_response(json: Value) -> Result<Vec<f32>> {
	let data = json
		.get("data")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing data array."))?;
	let item = data.first().ok_or_else(|| eyre::eyre!("Embedding response data is empty."))?;
	let embedding = item
		.get("embedding")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding item missing embedding array."))?;
	let mut vec = Vec::with_capacity(embedding.len());
	for value in embedding {
		let number =
			value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;
		vec.push(number as f32);
	}

	Ok(vec)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_single_embedding() {
		let json = serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [0.5, 1.5, -2.0] }
			]
		});
		let parsed = parse_embedding_response(json).expect("parse failed");
		assert_eq!(parsed, vec![0.5, 1.5, -2.0]);
	}

	#[test]
	fn rejects_empty_data() {
		let json = serde_json::json!({ "data": [] });
		assert!(parse_embedding_response(json).is_err());
	}
}
