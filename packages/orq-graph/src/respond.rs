use orq_domain::{ConversationState, Message, MessagesUpdate, StageUpdate};
use orq_providers::llm::SynthesisInput;

use crate::{Error, Orchestrator, Result};

impl Orchestrator {
	/// Answer synthesis over the merged retrieval context. Evidence reaches
	/// the model in merged order, so the indices it cites match what the
	/// caller can reconstruct from `sub_results`.
	pub(crate) async fn respond(&self, state: &ConversationState) -> Result<StageUpdate> {
		let merged = self.merge_context(&state.query, &state.sub_results).await;
		let evidence =
			merged.evidence.iter().map(|chunk| chunk.content.clone()).collect::<Vec<_>>();
		let sub_queries = state.formatted_query.clone().unwrap_or_default();
		let answer = self
			.providers
			.synthesize
			.synthesize(&self.cfg.providers.synthesize, SynthesisInput {
				query: &state.query,
				sub_queries: &sub_queries,
				memories: &merged.memories,
				evidence: &evidence,
				history: &state.messages,
			})
			.await
			.map_err(|err| Error::Synthesis { message: err.to_string() })?;

		Ok(StageUpdate {
			messages: Some(MessagesUpdate::Append(vec![Message::assistant(answer.clone())])),
			final_result: Some(answer),
			..Default::default()
		})
	}
}
