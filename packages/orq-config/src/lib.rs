mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Conversation, EmbeddingProviderConfig, LlmProviderConfig, MemoryProviderConfig,
	Postgres, ProviderConfig, Providers, Qdrant, Retrieval, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.max_subqueries == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_subqueries must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.max_subqueries > 3 {
		return Err(Error::Validation {
			message: "retrieval.max_subqueries must be 3 or less.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.memory_threshold) {
		return Err(Error::Validation {
			message: "retrieval.memory_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !cfg.retrieval.memory_threshold.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.memory_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.rerank_threshold) {
		return Err(Error::Validation {
			message: "retrieval.rerank_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !cfg.retrieval.rerank_threshold.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.rerank_threshold must be a finite number.".to_string(),
		});
	}
	if cfg.conversation.summarize_after < 2 {
		return Err(Error::Validation {
			message: "conversation.summarize_after must be 2 or greater.".to_string(),
		});
	}

	for (label, key) in [
		("safety", &cfg.providers.safety.api_key),
		("intent", &cfg.providers.intent.api_key),
		("decompose", &cfg.providers.decompose.api_key),
		("summarize", &cfg.providers.summarize.api_key),
		("synthesize", &cfg.providers.synthesize.api_key),
		("embedding", &cfg.providers.embedding.api_key),
		("rerank", &cfg.providers.rerank.api_key),
		("web_search", &cfg.providers.web_search.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_base in [
		&mut cfg.providers.safety.api_base,
		&mut cfg.providers.intent.api_base,
		&mut cfg.providers.decompose.api_base,
		&mut cfg.providers.summarize.api_base,
		&mut cfg.providers.synthesize.api_base,
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.rerank.api_base,
		&mut cfg.providers.web_search.api_base,
		&mut cfg.providers.memory.api_base,
	] {
		while api_base.ends_with('/') {
			api_base.pop();
		}
	}
}
