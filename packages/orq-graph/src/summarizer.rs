use orq_domain::{ConversationState, Message, MessagesUpdate, StageUpdate};

use crate::{Error, Orchestrator, Result};

impl Orchestrator {
	/// Collapses the accumulated history into a single synthetic system
	/// message. Runs before the turn's user message is appended, so the new
	/// query is never folded into its own summary.
	pub(crate) async fn summarize(&self, state: &ConversationState) -> Result<StageUpdate> {
		let prior = Some(state.chat_summary.as_str()).filter(|prior| !prior.is_empty());
		let summary = self
			.providers
			.summarize
			.summarize(&self.cfg.providers.summarize, prior, &state.messages)
			.await
			.map_err(|err| Error::Summarization { message: err.to_string() })?;

		tracing::debug!(collapsed = state.messages.len(), "Summarized conversation history.");

		Ok(StageUpdate {
			messages: Some(MessagesUpdate::ReplaceWith(Message::system(format!(
				"Summary of the conversation so far: {summary}"
			)))),
			chat_summary: Some(summary),
			..Default::default()
		})
	}
}
