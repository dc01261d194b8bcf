use std::sync::Arc;

use orq_graph::Orchestrator;
use orq_storage::{checkpoint::PgCheckpoints, db::Db, qdrant::QdrantSearch};

#[derive(Clone)]
pub struct AppState {
	pub orchestrator: Arc<Orchestrator>,
}
impl AppState {
	pub async fn new(config: orq_config::Config) -> color_eyre::Result<Self> {
		let db = Arc::new(Db::connect(&config.storage.postgres).await?);

		db.ensure_schema().await?;

		let checkpoints = Arc::new(PgCheckpoints::new(db));
		let vector = Arc::new(QdrantSearch::new(&config.storage.qdrant)?);
		let orchestrator = Orchestrator::new(config, checkpoints, vector);

		Ok(Self::with_orchestrator(Arc::new(orchestrator)))
	}

	pub fn with_orchestrator(orchestrator: Arc<Orchestrator>) -> Self {
		Self { orchestrator }
	}
}
