use orq_domain::{ConversationState, Message, MessagesUpdate, StageUpdate};

use crate::{Error, Orchestrator, Result};

pub const DENIAL_MESSAGE: &str = "Understood, I won't search the web for this.";

pub fn approval_prompt(query: &str) -> String {
	format!("This question needs a web search: \"{query}\". Approve the search?")
}

impl Orchestrator {
	/// Runs only after an explicit approval. The tool's answer closes the
	/// turn directly; web results never feed the retrieval pipeline.
	pub(crate) async fn web_search(&self, state: &ConversationState) -> Result<StageUpdate> {
		let answer = self
			.providers
			.web_search
			.search(&self.cfg.providers.web_search, &state.query)
			.await
			.map_err(|err| Error::WebSearch { message: err.to_string() })?;

		Ok(StageUpdate {
			messages: Some(MessagesUpdate::Append(vec![Message::assistant(answer.clone())])),
			final_result: Some(answer),
			..Default::default()
		})
	}

	pub(crate) fn web_denied(&self) -> StageUpdate {
		StageUpdate {
			messages: Some(MessagesUpdate::Append(vec![Message::assistant(DENIAL_MESSAGE)])),
			final_result: Some(DENIAL_MESSAGE.to_string()),
			..Default::default()
		}
	}
}
