use std::collections::HashSet;

use orq_domain::{EvidenceChunk, MemoryRecord, QueryResult};

use crate::Orchestrator;

pub struct MergedContext {
	pub evidence: Vec<EvidenceChunk>,
	pub memories: Vec<MemoryRecord>,
}

impl Orchestrator {
	/// Folds the per-sub-query results into one context: dedup by chunk id,
	/// rerank against the original query, drop everything at or below the
	/// threshold. A failed rerank call scores every chunk 0.0, which the
	/// threshold then filters out, so the turn still completes.
	pub(crate) async fn merge_context(
		&self,
		query: &str,
		sub_results: &[QueryResult],
	) -> MergedContext {
		let mut evidence = dedup_evidence(sub_results);

		if !evidence.is_empty() {
			let docs = evidence.iter().map(|chunk| chunk.content.clone()).collect::<Vec<_>>();
			let scores = match self
				.providers
				.rerank
				.rerank(&self.cfg.providers.rerank, query, &docs)
				.await
			{
				Ok(scores) => scores,
				Err(err) => {
					tracing::warn!("Rerank failed, dropping all evidence: {err}");

					vec![0.0; evidence.len()]
				},
			};

			apply_rerank_scores(&mut evidence, &scores);

			evidence = filter_evidence(evidence, self.cfg.retrieval.rerank_threshold);
		}

		MergedContext { evidence, memories: flatten_memories(sub_results) }
	}
}

/// Concatenates evidence in sub-query order and keeps the first occurrence
/// of each chunk id.
pub fn dedup_evidence(sub_results: &[QueryResult]) -> Vec<EvidenceChunk> {
	let mut seen = HashSet::new();
	let mut evidence = Vec::new();

	for result in sub_results {
		let Some(chunks) = &result.search_result else {
			continue;
		};

		for chunk in chunks {
			if seen.insert(chunk.id.clone()) {
				evidence.push(chunk.clone());
			}
		}
	}

	evidence
}

/// A chunk the reranker skipped keeps score 0.0, which the threshold filter
/// then drops.
pub fn apply_rerank_scores(evidence: &mut [EvidenceChunk], scores: &[f32]) {
	for (index, chunk) in evidence.iter_mut().enumerate() {
		chunk.rerank_score = Some(scores.get(index).copied().unwrap_or(0.0));
	}
}

pub fn filter_evidence(evidence: Vec<EvidenceChunk>, threshold: f32) -> Vec<EvidenceChunk> {
	evidence.into_iter().filter(|chunk| chunk.rerank_score.unwrap_or(0.0) > threshold).collect()
}

/// Memories are concatenated in sub-query order, duplicates included; the
/// memory store already scopes and thresholds them per sub-query.
pub fn flatten_memories(sub_results: &[QueryResult]) -> Vec<MemoryRecord> {
	sub_results
		.iter()
		.filter_map(|result| result.memories.as_deref())
		.flat_map(|records| records.iter().cloned())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chunk(id: &str, similarity: f32) -> EvidenceChunk {
		EvidenceChunk {
			id: id.to_string(),
			content: format!("content of {id}"),
			source: None,
			page: None,
			chunk_index: None,
			similarity_score: similarity,
			rerank_score: None,
		}
	}

	fn result(subquery: &str, chunks: Vec<EvidenceChunk>) -> QueryResult {
		QueryResult {
			subquery: subquery.to_string(),
			search_result: Some(chunks),
			memories: None,
		}
	}

	#[test]
	fn dedup_keeps_first_occurrence() {
		let sub_results = vec![
			result("a", vec![chunk("X123", 0.9), chunk("Y1", 0.8)]),
			result("b", vec![chunk("X123", 0.7), chunk("Z1", 0.6)]),
		];
		let evidence = dedup_evidence(&sub_results);

		assert_eq!(
			evidence.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
			vec!["X123", "Y1", "Z1"],
		);
		// The first occurrence's similarity survives.
		assert_eq!(evidence[0].similarity_score, 0.9);
	}

	#[test]
	fn dedup_is_idempotent() {
		let sub_results = vec![
			result("a", vec![chunk("A", 0.9), chunk("B", 0.8)]),
			result("b", vec![chunk("B", 0.7)]),
		];
		let once = dedup_evidence(&sub_results);
		let again = dedup_evidence(&[result("all", once.clone())]);

		assert_eq!(once, again);
	}

	#[test]
	fn failed_branches_contribute_nothing() {
		let sub_results = vec![
			QueryResult { subquery: "a".to_string(), search_result: None, memories: None },
			result("b", vec![chunk("A", 0.5)]),
		];

		assert_eq!(dedup_evidence(&sub_results).len(), 1);
	}

	#[test]
	fn missing_scores_default_to_zero() {
		let mut evidence = vec![chunk("A", 0.9), chunk("B", 0.8), chunk("C", 0.7)];

		apply_rerank_scores(&mut evidence, &[0.9, 0.3]);

		assert_eq!(evidence[0].rerank_score, Some(0.9));
		assert_eq!(evidence[1].rerank_score, Some(0.3));
		assert_eq!(evidence[2].rerank_score, Some(0.0));
	}

	#[test]
	fn threshold_is_strictly_greater_than() {
		let mut evidence = vec![chunk("A", 0.9), chunk("B", 0.8), chunk("C", 0.7)];

		apply_rerank_scores(&mut evidence, &[0.9, 0.3, 0.5]);

		let kept = filter_evidence(evidence, 0.4);

		assert_eq!(kept.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["A", "C"]);
	}

	#[test]
	fn boundary_score_is_dropped() {
		let mut evidence = vec![chunk("A", 0.9)];

		apply_rerank_scores(&mut evidence, &[0.4]);

		assert!(filter_evidence(evidence, 0.4).is_empty());
	}

	#[test]
	fn memories_flatten_in_subquery_order_without_dedup() {
		let memory = |id: Option<&str>, text: &str| MemoryRecord {
			id: id.map(str::to_string),
			memory: text.to_string(),
			score: None,
		};
		let sub_results = vec![
			QueryResult {
				subquery: "a".to_string(),
				search_result: None,
				memories: Some(vec![memory(Some("m1"), "first"), memory(None, "anon")]),
			},
			QueryResult { subquery: "b".to_string(), search_result: None, memories: None },
			QueryResult {
				subquery: "c".to_string(),
				search_result: None,
				memories: Some(vec![memory(Some("m1"), "first"), memory(Some("m2"), "second")]),
			},
		];
		let memories = flatten_memories(&sub_results);

		assert_eq!(
			memories.iter().map(|m| m.memory.as_str()).collect::<Vec<_>>(),
			vec!["first", "anon", "first", "second"],
		);
	}
}
