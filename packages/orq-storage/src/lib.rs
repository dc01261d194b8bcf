pub mod checkpoint;
pub mod db;
pub mod qdrant;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn Future<Output = T> + Send + 'a>>;

use orq_domain::Checkpoint;

/// Durable, thread-addressable persistence of conversation snapshots.
/// Saves replace the whole row; concurrent turns on one thread resolve
/// last-writer-wins.
pub trait CheckpointStore
where
	Self: Send + Sync,
{
	fn save<'a>(
		&'a self,
		thread_id: &'a str,
		checkpoint: &'a Checkpoint,
	) -> BoxFuture<'a, Result<()>>;

	fn load<'a>(&'a self, thread_id: &'a str) -> BoxFuture<'a, Result<Option<Checkpoint>>>;
}
