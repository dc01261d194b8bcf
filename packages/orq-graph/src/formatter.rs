use orq_domain::{ConversationState, Message, MessagesUpdate, StageUpdate};

use crate::{Error, Orchestrator, Result};

impl Orchestrator {
	/// Query decomposition. The sub-query list is capped at the configured
	/// maximum, and an empty decomposition falls back to the raw query so
	/// retrieval always has at least one input.
	pub(crate) async fn format_query(&self, state: &ConversationState) -> Result<StageUpdate> {
		let mut subqueries = self
			.providers
			.decompose
			.decompose(&self.cfg.providers.decompose, &state.query, &state.messages)
			.await
			.map_err(|err| Error::Decomposition { message: err.to_string() })?;

		subqueries.retain(|subquery| !subquery.trim().is_empty());
		subqueries.truncate(self.cfg.retrieval.max_subqueries as usize);

		if subqueries.is_empty() {
			subqueries.push(state.query.clone());
		}

		tracing::debug!(count = subqueries.len(), "Decomposed query.");

		let note = Message::assistant(format!("Searching for: {}", subqueries.join("; ")));

		Ok(StageUpdate {
			messages: Some(MessagesUpdate::Append(vec![note])),
			formatted_query: Some(subqueries),
			..Default::default()
		})
	}
}
