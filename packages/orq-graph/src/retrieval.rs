use std::sync::Arc;

use tokio::task::JoinSet;

use orq_config::Config;
use orq_domain::{ConversationState, QueryResult, RuntimeContext, StageUpdate};

use crate::{Orchestrator, Providers, VectorSearchProvider};

impl Orchestrator {
	/// Fans out across the sub-queries, one task each, and collects the
	/// results back into input order. A failed branch degrades to `None` for
	/// that branch; the stage itself never fails.
	pub(crate) async fn run_retrieval(
		&self,
		state: &ConversationState,
		ctx: &RuntimeContext,
	) -> StageUpdate {
		let subqueries = state.formatted_query.clone().unwrap_or_default();
		let mut slots: Vec<Option<QueryResult>> = Vec::new();
		let mut tasks = JoinSet::new();

		slots.resize_with(subqueries.len(), || None);

		for (index, subquery) in subqueries.iter().enumerate() {
			let cfg = self.cfg.clone();
			let providers = self.providers.clone();
			let vector = self.vector.clone();
			let subquery = subquery.clone();
			let user_id = ctx.user_id.clone();

			tasks.spawn(async move {
				(index, retrieve_one(cfg, providers, vector, subquery, user_id).await)
			});
		}

		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok((index, result)) => slots[index] = Some(result),
				Err(err) => tracing::warn!("Retrieval task failed to join: {err}"),
			}
		}

		// A panicked task leaves its slot empty; fill it so `sub_results`
		// still lines up with `formatted_query` index for index.
		let sub_results = slots
			.into_iter()
			.zip(subqueries)
			.map(|(slot, subquery)| {
				slot.unwrap_or(QueryResult { subquery, search_result: None, memories: None })
			})
			.collect();

		StageUpdate { sub_results: Some(sub_results), ..Default::default() }
	}
}

/// One sub-query's retrieval: the vector branch (embed then nearest
/// neighbour) and the memory branch run concurrently.
async fn retrieve_one(
	cfg: Arc<Config>,
	providers: Providers,
	vector: Arc<dyn VectorSearchProvider>,
	subquery: String,
	user_id: String,
) -> QueryResult {
	let evidence_branch = async {
		let embedded = providers.embedding.embed(&cfg.providers.embedding, &subquery).await?;

		vector.search_nearest(embedded, cfg.retrieval.top_k).await
	};
	let memory_branch = providers.memory.search(
		&cfg.providers.memory,
		&subquery,
		&user_id,
		cfg.retrieval.memory_threshold,
	);
	let (evidence, memories) = tokio::join!(evidence_branch, memory_branch);
	let search_result = match evidence {
		Ok(chunks) => Some(chunks),
		Err(err) => {
			tracing::warn!(%subquery, "Evidence retrieval failed: {err}");

			None
		},
	};
	let memories = match memories {
		Ok(records) => Some(records),
		Err(err) => {
			tracing::warn!(%subquery, "Memory search failed: {err}");

			None
		},
	};

	QueryResult { subquery, search_result, memories }
}
