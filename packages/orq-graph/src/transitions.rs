//! The stage graph as data. `entry_stage` picks where a turn starts and
//! `next_stage` reads the routing fields a stage just wrote, so the whole
//! control flow is decided by two pure functions the driver loops over.

use orq_domain::ConversationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Summarize,
	Guardrails,
	Router,
	Formatter,
	Retrieval,
	Respond,
	Approval,
	WebSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	Next(Stage),
	End,
}

/// Where a fresh turn enters the graph. The history length is measured
/// before the turn's own user message lands, so a thread summarizes on the
/// turn after it crosses the limit, not mid-turn.
pub fn entry_stage(state: &ConversationState, summarize_after: u32) -> Stage {
	if state.messages.len() >= summarize_after as usize {
		Stage::Summarize
	} else {
		Stage::Guardrails
	}
}

pub fn next_stage(stage: Stage, state: &ConversationState) -> Step {
	match stage {
		Stage::Summarize => Step::Next(Stage::Guardrails),
		Stage::Guardrails => {
			if state.input_safe { Step::Next(Stage::Router) } else { Step::End }
		},
		Stage::Router => {
			if state.use_rag {
				Step::Next(Stage::Formatter)
			} else if state.use_web {
				Step::Next(Stage::Approval)
			} else {
				Step::End
			}
		},
		Stage::Formatter => Step::Next(Stage::Retrieval),
		Stage::Retrieval => Step::Next(Stage::Respond),
		Stage::Respond => Step::End,
		Stage::Approval => {
			if state.approved == Some(true) { Step::Next(Stage::WebSearch) } else { Step::End }
		},
		Stage::WebSearch => Step::End,
	}
}
