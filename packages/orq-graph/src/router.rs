use orq_domain::{ConversationState, Message, MessagesUpdate, RuntimeContext, StageUpdate};

use crate::{Error, Orchestrator, Result};

impl Orchestrator {
	/// Intent routing. Appends the turn's user message, and when neither
	/// retrieval flag is raised the router's own reply closes the turn.
	pub(crate) async fn route(
		&self,
		state: &ConversationState,
		ctx: &RuntimeContext,
	) -> Result<StageUpdate> {
		let decision = self
			.providers
			.intent
			.route(&self.cfg.providers.intent, &state.query, &state.messages, &ctx.user_id)
			.await
			.map_err(|err| Error::Routing { message: err.to_string() })?;
		let mut messages = vec![Message::user(state.query.clone())];
		let mut final_result = None;

		tracing::debug!(use_rag = decision.use_rag, use_web = decision.use_web, "Routed intent.");

		if !decision.use_rag && !decision.use_web {
			messages.push(Message::assistant(decision.message.clone()));
			final_result = Some(decision.message);
		}

		Ok(StageUpdate {
			messages: Some(MessagesUpdate::Append(messages)),
			use_rag: Some(decision.use_rag),
			use_web: Some(decision.use_web),
			final_result,
			..Default::default()
		})
	}
}
