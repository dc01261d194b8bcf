use orq_domain::{ConversationState, Message, MessagesUpdate, StageUpdate};
use orq_providers::llm::SafetyVerdict;

use crate::{Error, Orchestrator, Result};

pub const REFUSAL_MESSAGE: &str = "Sorry, I can't assist with that.";

impl Orchestrator {
	/// Safety screen. A refused turn still records the user's message so the
	/// history shows what was asked, then answers with the fixed refusal.
	pub(crate) async fn guardrails(&self, state: &ConversationState) -> Result<StageUpdate> {
		let verdict = self
			.providers
			.safety
			.classify(&self.cfg.providers.safety, &state.query)
			.await
			.map_err(|err| Error::Classification { message: err.to_string() })?;

		match verdict {
			SafetyVerdict::Safe => Ok(StageUpdate { input_safe: Some(true), ..Default::default() }),
			SafetyVerdict::Unsafe => {
				tracing::info!("Refusing unsafe input.");

				Ok(StageUpdate {
					input_safe: Some(false),
					messages: Some(MessagesUpdate::Append(vec![
						Message::user(state.query.clone()),
						Message::assistant(REFUSAL_MESSAGE),
					])),
					final_result: Some(REFUSAL_MESSAGE.to_string()),
					..Default::default()
				})
			},
		}
	}
}
