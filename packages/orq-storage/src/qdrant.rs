use std::collections::HashMap;

use qdrant_client::qdrant::{
	Query, QueryPointsBuilder, ScoredPoint, Value, point_id::PointIdOptions, value::Kind,
};

use orq_domain::EvidenceChunk;

use crate::{Error, Result};

pub struct QdrantSearch {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantSearch {
	pub fn new(cfg: &orq_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Nearest-neighbour query over the evidence collection; results come
	/// back ranked by similarity.
	pub async fn search(&self, vector: Vec<f32>, top_k: u32) -> Result<Vec<EvidenceChunk>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions, collection {} expects {}.",
				vector.len(),
				self.collection,
				self.vector_dim
			)));
		}

		let query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(top_k as u64);
		let response = self.client.query(query).await?;

		Ok(normalize_points(&response.result))
	}
}

pub fn normalize_points(points: &[ScoredPoint]) -> Vec<EvidenceChunk> {
	points
		.iter()
		.filter_map(|point| {
			let id = point.id.as_ref().and_then(point_id_string)?;
			let content = payload_str(&point.payload, "content")?;

			Some(EvidenceChunk {
				id,
				content,
				source: payload_str(&point.payload, "source"),
				page: payload_i64(&point.payload, "page"),
				chunk_index: payload_i64(&point.payload, "chunk_index"),
				similarity_score: point.score,
				rerank_score: None,
			})
		})
		.collect()
}

fn point_id_string(point_id: &qdrant_client::qdrant::PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::IntegerValue(value)) => Some(*value),
		Some(Kind::DoubleValue(value)) if value.fract() == 0.0 => Some(*value as i64),
		_ => None,
	}
}
