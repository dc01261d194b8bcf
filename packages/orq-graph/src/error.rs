pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Safety classification failed: {message}")]
	Classification { message: String },
	#[error("Intent routing failed: {message}")]
	Routing { message: String },
	#[error("Query decomposition failed: {message}")]
	Decomposition { message: String },
	#[error("Summarization failed: {message}")]
	Summarization { message: String },
	#[error("Answer synthesis failed: {message}")]
	Synthesis { message: String },
	#[error("Web search failed: {message}")]
	WebSearch { message: String },
	#[error("Checkpoint store failed: {message}")]
	Checkpoint { message: String },
	#[error("Thread {thread_id} has no pending approval.")]
	NoPendingApproval { thread_id: String },
}
impl From<orq_storage::Error> for Error {
	fn from(err: orq_storage::Error) -> Self {
		Self::Checkpoint { message: err.to_string() }
	}
}
