mod error;

pub mod transitions;

pub mod formatter;
pub mod guardrails;
pub mod merge;
pub mod respond;
pub mod retrieval;
pub mod router;
pub mod run;
pub mod summarizer;
pub mod web;

use std::{future::Future, pin::Pin, sync::Arc};

pub use error::{Error, Result};
use orq_config::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, MemoryProviderConfig, ProviderConfig,
};
use orq_domain::{EvidenceChunk, MemoryRecord, Message};
use orq_providers::{
	embedding,
	llm::{self, IntentDecision, SafetyVerdict, SynthesisInput},
	memory, rerank, web_search,
};
use orq_storage::{CheckpointStore, qdrant::QdrantSearch};
pub use run::TurnOutcome;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait SafetyProvider
where
	Self: Send + Sync,
{
	fn classify<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<SafetyVerdict>>;
}

pub trait IntentProvider
where
	Self: Send + Sync,
{
	fn route<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		history: &'a [Message],
		user_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<IntentDecision>>;
}

pub trait DecomposeProvider
where
	Self: Send + Sync,
{
	fn decompose<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		history: &'a [Message],
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>>;
}

pub trait SummarizeProvider
where
	Self: Send + Sync,
{
	fn summarize<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prior_summary: Option<&'a str>,
		history: &'a [Message],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait SynthesisProvider
where
	Self: Send + Sync,
{
	fn synthesize<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		input: SynthesisInput<'a>,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait VectorSearchProvider
where
	Self: Send + Sync,
{
	fn search_nearest<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<EvidenceChunk>>>;
}

pub trait MemoryProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a MemoryProviderConfig,
		query: &'a str,
		user_id: &'a str,
		threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<MemoryRecord>>>;

	fn add<'a>(
		&'a self,
		cfg: &'a MemoryProviderConfig,
		messages: &'a [Message],
		user_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait WebSearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub safety: Arc<dyn SafetyProvider>,
	pub intent: Arc<dyn IntentProvider>,
	pub decompose: Arc<dyn DecomposeProvider>,
	pub summarize: Arc<dyn SummarizeProvider>,
	pub synthesize: Arc<dyn SynthesisProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub memory: Arc<dyn MemoryProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub web_search: Arc<dyn WebSearchProvider>,
}

/// The orchestration engine for one deployment. Turns run through a fixed
/// stage graph; every successful stage is folded into the thread's
/// [`orq_domain::Checkpoint`] before the next one starts, so a crash mid-turn
/// loses at most the stage in flight.
pub struct Orchestrator {
	pub cfg: Arc<Config>,
	pub checkpoints: Arc<dyn CheckpointStore>,
	pub vector: Arc<dyn VectorSearchProvider>,
	pub providers: Providers,
}

struct DefaultProviders;

impl SafetyProvider for DefaultProviders {
	fn classify<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<SafetyVerdict>> {
		Box::pin(llm::classify_safety(cfg, query))
	}
}

impl IntentProvider for DefaultProviders {
	fn route<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		history: &'a [Message],
		user_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<IntentDecision>> {
		Box::pin(llm::route_intent(cfg, query, history, user_id))
	}
}

impl DecomposeProvider for DefaultProviders {
	fn decompose<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		history: &'a [Message],
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		Box::pin(llm::decompose_query(cfg, query, history))
	}
}

impl SummarizeProvider for DefaultProviders {
	fn summarize<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prior_summary: Option<&'a str>,
		history: &'a [Message],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(llm::summarize_history(cfg, prior_summary, history))
	}
}

impl SynthesisProvider for DefaultProviders {
	fn synthesize<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		input: SynthesisInput<'a>,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(llm::synthesize_answer(cfg, input))
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}

impl MemoryProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a MemoryProviderConfig,
		query: &'a str,
		user_id: &'a str,
		threshold: f32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<MemoryRecord>>> {
		Box::pin(memory::search(cfg, query, user_id, threshold))
	}

	fn add<'a>(
		&'a self,
		cfg: &'a MemoryProviderConfig,
		messages: &'a [Message],
		user_id: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(memory::add(cfg, messages, user_id))
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(rerank::rerank(cfg, query, docs))
	}
}

impl WebSearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(web_search::search(cfg, query))
	}
}

impl VectorSearchProvider for QdrantSearch {
	fn search_nearest<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<EvidenceChunk>>> {
		Box::pin(async move {
			self.search(vector, top_k).await.map_err(|err| color_eyre::eyre::eyre!("{err}"))
		})
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			safety: provider.clone(),
			intent: provider.clone(),
			decompose: provider.clone(),
			summarize: provider.clone(),
			synthesize: provider.clone(),
			embedding: provider.clone(),
			memory: provider.clone(),
			rerank: provider.clone(),
			web_search: provider,
		}
	}
}

impl Orchestrator {
	pub fn new(
		cfg: Config,
		checkpoints: Arc<dyn CheckpointStore>,
		vector: Arc<dyn VectorSearchProvider>,
	) -> Self {
		Self { cfg: Arc::new(cfg), checkpoints, vector, providers: Providers::default() }
	}

	pub fn with_providers(
		cfg: Config,
		checkpoints: Arc<dyn CheckpointStore>,
		vector: Arc<dyn VectorSearchProvider>,
		providers: Providers,
	) -> Self {
		Self { cfg: Arc::new(cfg), checkpoints, vector, providers }
	}
}
