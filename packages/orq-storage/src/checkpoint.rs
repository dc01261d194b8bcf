use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use orq_domain::Checkpoint;

use crate::{BoxFuture, CheckpointStore, Result, db::Db};

/// Postgres-backed store: one row per thread, whole-snapshot upsert.
pub struct PgCheckpoints {
	pub db: Arc<Db>,
}
impl PgCheckpoints {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}

	async fn save_inner(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<()> {
		let snapshot = serde_json::to_value(checkpoint)?;

		sqlx::query(
			"\
INSERT INTO conversation_checkpoints (thread_id, snapshot, updated_at)
VALUES ($1, $2, now())
ON CONFLICT (thread_id)
DO UPDATE SET snapshot = EXCLUDED.snapshot, updated_at = now()",
		)
		.bind(thread_id)
		.bind(&snapshot)
		.execute(&self.db.pool)
		.await?;

		Ok(())
	}

	async fn load_inner(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
		let row: Option<(serde_json::Value,)> =
			sqlx::query_as("SELECT snapshot FROM conversation_checkpoints WHERE thread_id = $1")
				.bind(thread_id)
				.fetch_optional(&self.db.pool)
				.await?;
		let Some((snapshot,)) = row else {
			return Ok(None);
		};
		let checkpoint = serde_json::from_value(snapshot)?;

		Ok(Some(checkpoint))
	}
}
impl CheckpointStore for PgCheckpoints {
	fn save<'a>(
		&'a self,
		thread_id: &'a str,
		checkpoint: &'a Checkpoint,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.save_inner(thread_id, checkpoint))
	}

	fn load<'a>(&'a self, thread_id: &'a str) -> BoxFuture<'a, Result<Option<Checkpoint>>> {
		Box::pin(self.load_inner(thread_id))
	}
}

/// Process-local store for tests and ephemeral deployments; snapshots do not
/// survive a restart.
#[derive(Default)]
pub struct MemoryCheckpoints {
	threads: Mutex<HashMap<String, Checkpoint>>,
}
impl MemoryCheckpoints {
	pub fn new() -> Self {
		Self::default()
	}
}
impl CheckpointStore for MemoryCheckpoints {
	fn save<'a>(
		&'a self,
		thread_id: &'a str,
		checkpoint: &'a Checkpoint,
	) -> BoxFuture<'a, Result<()>> {
		let mut threads = self.threads.lock().unwrap_or_else(|err| err.into_inner());

		threads.insert(thread_id.to_string(), checkpoint.clone());

		Box::pin(async { Ok(()) })
	}

	fn load<'a>(&'a self, thread_id: &'a str) -> BoxFuture<'a, Result<Option<Checkpoint>>> {
		let threads = self.threads.lock().unwrap_or_else(|err| err.into_inner());
		let checkpoint = threads.get(thread_id).cloned();

		Box::pin(async { Ok(checkpoint) })
	}
}
