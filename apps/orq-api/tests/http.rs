use std::sync::Arc;

use axum::{
	body::Body,
	http::{Request, StatusCode},
};
use serde_json::{Map, Value, json};
use tower::util::ServiceExt;

use orq_api::{routes, state::AppState};
use orq_config::{
	Config, Conversation, EmbeddingProviderConfig, LlmProviderConfig, MemoryProviderConfig,
	Postgres, ProviderConfig, Qdrant, Retrieval, Service, Storage,
};
use orq_domain::{EvidenceChunk, Message};
use orq_graph::{
	BoxFuture, IntentProvider, Orchestrator, Providers, SafetyProvider, VectorSearchProvider,
	WebSearchProvider,
};
use orq_providers::llm::{IntentDecision, SafetyVerdict};
use orq_storage::checkpoint::MemoryCheckpoints;

fn llm(provider_id: &str) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: provider_id.to_string(),
		api_base: "http://localhost:0".to_string(),
		api_key: "test-key".to_string(),
		path: "/v1/chat/completions".to_string(),
		model: "test-model".to_string(),
		temperature: 0.0,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

fn provider(provider_id: &str) -> ProviderConfig {
	ProviderConfig {
		provider_id: provider_id.to_string(),
		api_base: "http://localhost:0".to_string(),
		api_key: "test-key".to_string(),
		path: "/".to_string(),
		model: "test-model".to_string(),
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: "postgres://localhost/unused".to_string(), pool_max_conns: 1 },
			qdrant: Qdrant {
				url: "http://localhost:0".to_string(),
				collection: "evidence".to_string(),
				vector_dim: 4,
			},
		},
		providers: orq_config::Providers {
			safety: llm("safety"),
			intent: llm("intent"),
			decompose: llm("decompose"),
			summarize: llm("summarize"),
			synthesize: llm("synthesize"),
			embedding: EmbeddingProviderConfig {
				provider_id: "embedding".to_string(),
				api_base: "http://localhost:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embed".to_string(),
				dimensions: 4,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			rerank: provider("rerank"),
			web_search: provider("web-search"),
			memory: MemoryProviderConfig {
				api_base: "http://localhost:0".to_string(),
				api_key: "test-key".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		retrieval: Retrieval {
			top_k: 5,
			memory_threshold: 0.6,
			rerank_threshold: 0.4,
			max_subqueries: 3,
		},
		conversation: Conversation { summarize_after: 10 },
	}
}

struct AlwaysSafe;
impl SafetyProvider for AlwaysSafe {
	fn classify<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<SafetyVerdict>> {
		Box::pin(async { Ok(SafetyVerdict::Safe) })
	}
}

/// Routes to the web when the question asks for it, otherwise answers
/// directly.
struct KeywordIntent;
impl IntentProvider for KeywordIntent {
	fn route<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		query: &'a str,
		_history: &'a [Message],
		_user_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<IntentDecision>> {
		let decision = IntentDecision {
			use_rag: false,
			use_web: query.contains("web"),
			message: "direct answer".to_string(),
		};

		Box::pin(async move { Ok(decision) })
	}
}

struct StubWeb;
impl WebSearchProvider for StubWeb {
	fn search<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async { Ok("web result".to_string()) })
	}
}

struct NoVectors;
impl VectorSearchProvider for NoVectors {
	fn search_nearest<'a>(
		&'a self,
		_vector: Vec<f32>,
		_top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<EvidenceChunk>>> {
		Box::pin(async { Ok(Vec::new()) })
	}
}

fn test_app() -> axum::Router {
	let providers = Providers {
		safety: Arc::new(AlwaysSafe),
		intent: Arc::new(KeywordIntent),
		web_search: Arc::new(StubWeb),
		..Providers::default()
	};
	let orchestrator = Orchestrator::with_providers(
		test_config(),
		Arc::new(MemoryCheckpoints::new()),
		Arc::new(NoVectors),
		providers,
	);

	routes::router(AppState::with_orchestrator(Arc::new(orchestrator)))
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
	let request = Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.unwrap();
	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

	(status, json)
}

#[tokio::test]
async fn health_returns_ok() {
	let app = test_app();
	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn query_completes_a_direct_turn() {
	let app = test_app();
	let (status, body) = post_json(
		&app,
		"/v1/threads/query",
		json!({ "thread_id": "t1", "user_id": "u1", "query": "hello" }),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "completed");
	assert_eq!(body["response"], "direct answer");
}

#[tokio::test]
async fn web_query_suspends_then_resumes() {
	let app = test_app();
	let (status, body) = post_json(
		&app,
		"/v1/threads/query",
		json!({ "thread_id": "t1", "user_id": "u1", "query": "check the web please" }),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "awaiting_approval");

	let (status, body) =
		post_json(&app, "/v1/threads/resume", json!({ "thread_id": "t1", "approved": true }))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "completed");
	assert_eq!(body["response"], "web result");
}

#[tokio::test]
async fn resume_without_a_suspended_turn_conflicts() {
	let app = test_app();
	let (status, body) =
		post_json(&app, "/v1/threads/resume", json!({ "thread_id": "t1", "approved": true }))
			.await;

	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error_code"], "not_suspended");
}
