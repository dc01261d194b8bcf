use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub conversation: Conversation,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub safety: LlmProviderConfig,
	pub intent: LlmProviderConfig,
	pub decompose: LlmProviderConfig,
	pub summarize: LlmProviderConfig,
	pub synthesize: LlmProviderConfig,
	pub embedding: EmbeddingProviderConfig,
	pub rerank: ProviderConfig,
	pub web_search: ProviderConfig,
	pub memory: MemoryProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct MemoryProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	pub memory_threshold: f32,
	pub rerank_threshold: f32,
	pub max_subqueries: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { top_k: 5, memory_threshold: 0.6, rerank_threshold: 0.4, max_subqueries: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Conversation {
	/// Message count at which a turn is routed through the summarizer before
	/// anything else runs.
	pub summarize_after: u32,
}
impl Default for Conversation {
	fn default() -> Self {
		Self { summarize_after: 10 }
	}
}
