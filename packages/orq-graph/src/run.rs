use orq_domain::{ConversationState, Message, PendingApproval, RuntimeContext, StageUpdate};

use crate::{
	Error, Orchestrator, Result,
	transitions::{Stage, Step, entry_stage, next_stage},
	web::approval_prompt,
};

/// How a turn came back to the caller. `Suspended` carries the approval
/// prompt; the thread stays parked until [`Orchestrator::resume`] lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
	Completed(String),
	Suspended(String),
}

impl Orchestrator {
	/// Runs one turn on the thread. The checkpoint is rewritten after every
	/// stage that completes, so a turn that dies mid-flight resumes its
	/// thread from durable state, not from scratch.
	pub async fn invoke(
		&self,
		thread_id: &str,
		ctx: &RuntimeContext,
		query: &str,
	) -> Result<TurnOutcome> {
		let mut checkpoint = self.checkpoints.load(thread_id).await?.unwrap_or_default();

		// A new question on a thread parked at the approval gate abandons
		// the suspended turn.
		if checkpoint.pending.take().is_some() {
			tracing::warn!(thread_id, "Abandoning an unanswered approval request.");
		}

		checkpoint.state.begin_turn(query);

		let mut stage = entry_stage(&checkpoint.state, self.cfg.conversation.summarize_after);

		loop {
			if stage == Stage::Approval {
				let prompt = approval_prompt(&checkpoint.state.query);

				checkpoint.pending = Some(PendingApproval { prompt: prompt.clone() });

				self.checkpoints.save(thread_id, &checkpoint).await?;

				return Ok(TurnOutcome::Suspended(prompt));
			}

			let update = self.run_stage(stage, &checkpoint.state, ctx).await?;

			checkpoint.state.apply(update);

			self.checkpoints.save(thread_id, &checkpoint).await?;

			match next_stage(stage, &checkpoint.state) {
				Step::Next(next) => stage = next,
				Step::End => break,
			}
		}

		self.record_turn(&checkpoint.state, ctx);

		Ok(TurnOutcome::Completed(checkpoint.state.final_result.clone()))
	}

	/// Answers a pending approval. Approval runs the web search and closes
	/// the turn; denial closes it with a fixed notice.
	pub async fn resume(&self, thread_id: &str, approved: bool) -> Result<TurnOutcome> {
		let Some(mut checkpoint) = self.checkpoints.load(thread_id).await? else {
			return Err(Error::NoPendingApproval { thread_id: thread_id.to_string() });
		};

		if checkpoint.pending.take().is_none() {
			return Err(Error::NoPendingApproval { thread_id: thread_id.to_string() });
		}

		checkpoint.state.apply(StageUpdate { approved: Some(approved), ..Default::default() });

		// The approval gate has exactly one outgoing edge, the web search.
		let update = match next_stage(Stage::Approval, &checkpoint.state) {
			Step::Next(_) => self.web_search(&checkpoint.state).await?,
			Step::End => self.web_denied(),
		};

		checkpoint.state.apply(update);

		self.checkpoints.save(thread_id, &checkpoint).await?;

		Ok(TurnOutcome::Completed(checkpoint.state.final_result.clone()))
	}

	async fn run_stage(
		&self,
		stage: Stage,
		state: &ConversationState,
		ctx: &RuntimeContext,
	) -> Result<StageUpdate> {
		match stage {
			Stage::Summarize => self.summarize(state).await,
			Stage::Guardrails => self.guardrails(state).await,
			Stage::Router => self.route(state, ctx).await,
			Stage::Formatter => self.format_query(state).await,
			Stage::Retrieval => Ok(self.run_retrieval(state, ctx).await),
			Stage::Respond => self.respond(state).await,
			Stage::WebSearch => self.web_search(state).await,
			// Suspension is handled by the driver before dispatch.
			Stage::Approval => Ok(StageUpdate::default()),
		}
	}

	/// Fire-and-forget write-back of the completed exchange to the memory
	/// store. Refusals and empty answers are not recorded.
	fn record_turn(&self, state: &ConversationState, ctx: &RuntimeContext) {
		if !state.input_safe || state.final_result.is_empty() {
			return;
		}

		let cfg = self.cfg.clone();
		let memory = self.providers.memory.clone();
		let user_id = ctx.user_id.clone();
		let turn = vec![
			Message::user(state.query.clone()),
			Message::assistant(state.final_result.clone()),
		];

		tokio::spawn(async move {
			if let Err(err) = memory.add(&cfg.providers.memory, &turn, &user_id).await {
				tracing::warn!(user_id, "Memory write-back failed: {err}");
			}
		});
	}
}
