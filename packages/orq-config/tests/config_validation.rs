use std::{env, fs, path::PathBuf};

use orq_config::Error;

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:5050"
log_level = "info"

[storage.postgres]
dsn            = "postgresql://localhost:5432/orq"
pool_max_conns = 8

[storage.qdrant]
url        = "http://localhost:6333"
collection = "rulebook"
vector_dim = 1024

[providers.safety]
provider_id = "openai"
api_base    = "https://api.openai.com/"
api_key     = "key"
path        = "/v1/chat/completions"
model       = "gpt-5-nano"
temperature = 0.0
timeout_ms  = 10000

[providers.intent]
provider_id = "openai"
api_base    = "https://api.openai.com"
api_key     = "key"
path        = "/v1/chat/completions"
model       = "gpt-4o-mini"
temperature = 0.0
timeout_ms  = 10000

[providers.decompose]
provider_id = "openai"
api_base    = "https://api.openai.com"
api_key     = "key"
path        = "/v1/chat/completions"
model       = "gpt-4o-mini"
temperature = 0.0
timeout_ms  = 10000

[providers.summarize]
provider_id = "openai"
api_base    = "https://api.openai.com"
api_key     = "key"
path        = "/v1/chat/completions"
model       = "gpt-4o-mini"
temperature = 0.0
timeout_ms  = 10000

[providers.synthesize]
provider_id = "openai"
api_base    = "https://api.openai.com"
api_key     = "key"
path        = "/v1/chat/completions"
model       = "gpt-4o-mini"
temperature = 0.0
timeout_ms  = 30000

[providers.embedding]
provider_id = "local"
api_base    = "http://localhost:8080"
api_key     = "key"
path        = "/v1/embeddings"
model       = "bge-m3"
dimensions  = 1024
timeout_ms  = 10000

[providers.rerank]
provider_id = "local"
api_base    = "http://localhost:8081"
api_key     = "key"
path        = "/v1/rerank"
model       = "bge-reranker-v2-m3"
timeout_ms  = 10000

[providers.web_search]
provider_id = "openai"
api_base    = "https://api.openai.com"
api_key     = "key"
path        = "/v1/responses"
model       = "gpt-4.1-mini"
timeout_ms  = 30000

[providers.memory]
api_base   = "http://localhost:8888"
api_key    = "key"
timeout_ms = 10000

[retrieval]
top_k            = 5
memory_threshold = 0.6
rerank_threshold = 0.4
max_subqueries   = 3

[conversation]
summarize_after = 10
"#;

fn write_temp_config(contents: &str) -> PathBuf {
	let path = env::temp_dir().join(format!("orq_config_{}.toml", uuid_like()));

	fs::write(&path, contents).expect("Failed to write temp config.");

	path
}

fn uuid_like() -> u128 {
	use std::time::{SystemTime, UNIX_EPOCH};

	SystemTime::now().duration_since(UNIX_EPOCH).expect("Clock went backwards.").as_nanos()
}

#[test]
fn loads_and_normalizes_sample_config() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML);
	let cfg = orq_config::load(&path).expect("Sample config must load.");

	// Trailing slash stripped by normalize.
	assert_eq!(cfg.providers.safety.api_base, "https://api.openai.com");
	assert_eq!(cfg.retrieval.top_k, 5);
	assert_eq!(cfg.conversation.summarize_after, 10);

	fs::remove_file(path).ok();
}

#[test]
fn defaults_apply_when_tunables_are_omitted() {
	let trimmed = SAMPLE_CONFIG_TOML
		.split("[retrieval]")
		.next()
		.expect("Sample config must contain [retrieval].");
	let path = write_temp_config(trimmed);
	let cfg = orq_config::load(&path).expect("Config without tunables must load.");

	assert_eq!(cfg.retrieval.top_k, 5);
	assert_eq!(cfg.retrieval.max_subqueries, 3);
	assert!((cfg.retrieval.memory_threshold - 0.6).abs() < f32::EPSILON);
	assert!((cfg.retrieval.rerank_threshold - 0.4).abs() < f32::EPSILON);
	assert_eq!(cfg.conversation.summarize_after, 10);

	fs::remove_file(path).ok();
}

#[test]
fn rejects_mismatched_vector_dim() {
	let mutated = SAMPLE_CONFIG_TOML.replace("vector_dim = 1024", "vector_dim = 768");
	let path = write_temp_config(&mutated);
	let err = orq_config::load(&path).expect_err("Mismatched dimensions must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));

	fs::remove_file(path).ok();
}

#[test]
fn rejects_out_of_range_rerank_threshold() {
	let mutated = SAMPLE_CONFIG_TOML.replace("rerank_threshold = 0.4", "rerank_threshold = 1.4");
	let path = write_temp_config(&mutated);
	let err = orq_config::load(&path).expect_err("Out-of-range threshold must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));

	fs::remove_file(path).ok();
}

#[test]
fn rejects_more_than_three_subqueries() {
	let mutated = SAMPLE_CONFIG_TOML.replace("max_subqueries   = 3", "max_subqueries   = 4");
	let path = write_temp_config(&mutated);
	let err = orq_config::load(&path).expect_err("max_subqueries above 3 must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));

	fs::remove_file(path).ok();
}

#[test]
fn rejects_empty_provider_api_key() {
	let mutated = SAMPLE_CONFIG_TOML.replacen(r#"api_key     = "key""#, r#"api_key     = """#, 1);
	let path = write_temp_config(&mutated);
	let err = orq_config::load(&path).expect_err("Empty api_key must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));

	fs::remove_file(path).ok();
}
