//! Conversation state threaded through the orchestration graph.
//!
//! Stages never mutate the state directly. Each one returns a [`StageUpdate`]
//! and the driver folds it in through [`ConversationState::apply`], so every
//! field has exactly one merge rule: `messages` goes through the
//! [`MessagesUpdate`] reducer, `sub_results` is replaced wholesale each turn,
//! and the scalar routing flags are set once per turn by their owning stage.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	User,
	Assistant,
	System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub content: String,
}
impl Message {
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: Role::User, content: content.into() }
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self { role: Role::Assistant, content: content.into() }
	}

	pub fn system(content: impl Into<String>) -> Self {
		Self { role: Role::System, content: content.into() }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChunk {
	pub id: String,
	pub content: String,
	pub source: Option<String>,
	pub page: Option<i64>,
	pub chunk_index: Option<i64>,
	pub similarity_score: f32,
	pub rerank_score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
	pub id: Option<String>,
	pub memory: String,
	pub score: Option<f32>,
}

/// One sub-query's retrieval outcome. A `None` field means the producing
/// branch failed or never ran, which is distinct from an empty result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
	pub subquery: String,
	pub search_result: Option<Vec<EvidenceChunk>>,
	pub memories: Option<Vec<MemoryRecord>>,
}

/// Per-invocation identity and model-selection input. Never persisted;
/// supplied fresh alongside the thread id on every call.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
	pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
	pub query: String,
	pub messages: Vec<Message>,
	pub formatted_query: Option<Vec<String>>,
	pub input_safe: bool,
	pub use_rag: bool,
	pub use_web: bool,
	pub sub_results: Vec<QueryResult>,
	pub final_result: String,
	pub chat_summary: String,
	pub approved: Option<bool>,
}
impl ConversationState {
	/// Resets per-turn fields and installs the new query. `messages` and
	/// `chat_summary` are the only fields that survive across turns.
	pub fn begin_turn(&mut self, query: impl Into<String>) {
		self.query = query.into();
		self.formatted_query = None;
		self.input_safe = false;
		self.use_rag = false;
		self.use_web = false;
		self.sub_results = Vec::new();
		self.final_result = String::new();
		self.approved = None;
	}

	pub fn apply(&mut self, update: StageUpdate) {
		if let Some(messages) = update.messages {
			apply_messages(&mut self.messages, messages);
		}
		if let Some(formatted_query) = update.formatted_query {
			self.formatted_query = Some(formatted_query);
		}
		if let Some(input_safe) = update.input_safe {
			self.input_safe = input_safe;
		}
		if let Some(use_rag) = update.use_rag {
			self.use_rag = use_rag;
		}
		if let Some(use_web) = update.use_web {
			self.use_web = use_web;
		}
		if let Some(sub_results) = update.sub_results {
			self.sub_results = sub_results;
		}
		if let Some(final_result) = update.final_result {
			self.final_result = final_result;
		}
		if let Some(chat_summary) = update.chat_summary {
			self.chat_summary = chat_summary;
		}
		if let Some(approved) = update.approved {
			self.approved = Some(approved);
		}
	}
}

/// The designated reducer for `messages`. `ReplaceWith` is consumed solely by
/// the summarizer, which collapses the full history into one synthetic entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagesUpdate {
	Append(Vec<Message>),
	ReplaceWith(Message),
}

fn apply_messages(messages: &mut Vec<Message>, update: MessagesUpdate) {
	match update {
		MessagesUpdate::Append(new) => messages.extend(new),
		MessagesUpdate::ReplaceWith(summary) => {
			messages.clear();
			messages.push(summary);
		},
	}
}

/// Partial state write produced by one stage.
#[derive(Debug, Default)]
pub struct StageUpdate {
	pub messages: Option<MessagesUpdate>,
	pub formatted_query: Option<Vec<String>>,
	pub input_safe: Option<bool>,
	pub use_rag: Option<bool>,
	pub use_web: Option<bool>,
	pub sub_results: Option<Vec<QueryResult>>,
	pub final_result: Option<String>,
	pub chat_summary: Option<String>,
	pub approved: Option<bool>,
}

/// Durable snapshot of one thread. `pending` marks a turn suspended at the
/// approval gate; resuming consumes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
	pub state: ConversationState,
	pub pending: Option<PendingApproval>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
	pub prompt: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn begin_turn_keeps_messages_and_summary() {
		let mut state = ConversationState {
			query: "old".to_string(),
			messages: vec![Message::user("hi"), Message::assistant("hello")],
			formatted_query: Some(vec!["old".to_string()]),
			input_safe: true,
			use_rag: true,
			use_web: false,
			sub_results: vec![QueryResult {
				subquery: "old".to_string(),
				search_result: None,
				memories: None,
			}],
			final_result: "answer".to_string(),
			chat_summary: "summary so far".to_string(),
			approved: Some(true),
		};

		state.begin_turn("new question");

		assert_eq!(state.query, "new question");
		assert_eq!(state.messages.len(), 2);
		assert_eq!(state.chat_summary, "summary so far");
		assert_eq!(state.formatted_query, None);
		assert!(!state.input_safe);
		assert!(!state.use_rag);
		assert!(state.sub_results.is_empty());
		assert!(state.final_result.is_empty());
		assert_eq!(state.approved, None);
	}

	#[test]
	fn append_reducer_never_replaces() {
		let mut state = ConversationState::default();

		state.apply(StageUpdate {
			messages: Some(MessagesUpdate::Append(vec![Message::user("one")])),
			..Default::default()
		});
		state.apply(StageUpdate {
			messages: Some(MessagesUpdate::Append(vec![
				Message::assistant("two"),
				Message::user("three"),
			])),
			..Default::default()
		});

		assert_eq!(state.messages.len(), 3);
		assert_eq!(state.messages[0].content, "one");
		assert_eq!(state.messages[2].content, "three");
	}

	#[test]
	fn replace_reducer_collapses_history() {
		let mut state = ConversationState::default();

		state.apply(StageUpdate {
			messages: Some(MessagesUpdate::Append(vec![
				Message::user("a"),
				Message::assistant("b"),
				Message::user("c"),
			])),
			..Default::default()
		});
		state.apply(StageUpdate {
			messages: Some(MessagesUpdate::ReplaceWith(Message::system("summary"))),
			..Default::default()
		});

		assert_eq!(state.messages, vec![Message::system("summary")]);
	}

	#[test]
	fn empty_update_is_a_no_op() {
		let mut state = ConversationState::default();

		state.apply(StageUpdate::default());

		assert_eq!(state, ConversationState::default());
	}

	#[test]
	fn checkpoint_round_trips_through_json() {
		let checkpoint = Checkpoint {
			state: ConversationState {
				query: "q".to_string(),
				messages: vec![Message::user("q")],
				..Default::default()
			},
			pending: Some(PendingApproval { prompt: "approve?".to_string() }),
		};
		let raw = serde_json::to_string(&checkpoint).expect("serialize failed");
		let parsed: Checkpoint = serde_json::from_str(&raw).expect("deserialize failed");

		assert_eq!(parsed, checkpoint);
	}
}
