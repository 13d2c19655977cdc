/// Ranking Module
///
/// Attaches model scores to candidate themes and orders them best-first.
///
/// # Workflow
/// 1. Zip candidates with their predicted scores (index-aligned)
/// 2. Stable sort by score descending; equal scores keep input order
/// 3. Keep the top K as the recommended list
use crate::models::{ScoredTheme, Theme};
use crate::services::model::{ModelError, Result};
use std::cmp::Ordering;
use tracing::debug;

pub struct RankingLayer {
    top_k: usize,
}

impl Default for RankingLayer {
    fn default() -> Self {
        Self::new(50)
    }
}

impl RankingLayer {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Score and sort every candidate.
    pub fn rank_candidates(&self, candidates: Vec<Theme>, scores: &[f32]) -> Result<Vec<ScoredTheme>> {
        if candidates.len() != scores.len() {
            return Err(ModelError::ShapeMismatch {
                expected: candidates.len(),
                actual: scores.len(),
            });
        }

        let mut ranked: Vec<ScoredTheme> = candidates
            .into_iter()
            .zip(scores.iter().copied())
            .map(|(theme, score)| ScoredTheme { theme, score })
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| compare_scores_desc(a.score, b.score));

        debug!(
            candidate_count = ranked.len(),
            top_score = ranked.first().map(|c| c.score),
            "Ranking complete"
        );

        Ok(ranked)
    }

    /// Rank, then keep at most `top_k`.
    pub fn recommend(&self, candidates: Vec<Theme>, scores: &[f32]) -> Result<Vec<ScoredTheme>> {
        let mut ranked = self.rank_candidates(candidates, scores)?;
        ranked.truncate(self.top_k);
        Ok(ranked)
    }
}

/// Descending order; NaN sorts after every real score.
fn compare_scores_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
