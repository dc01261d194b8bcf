mod state;

pub use state::{
	Checkpoint, ConversationState, EvidenceChunk, MemoryRecord, Message, MessagesUpdate,
	PendingApproval, QueryResult, Role, RuntimeContext, StageUpdate,
};
