use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::{FeedbackStore, SessionStore},
    error::AppResult,
    models::{FeedbackRecord, Preferences, Recommendation},
    services::{
        aggregator::CandidateAggregator,
        playlist::{pack_playlist, total_minutes, PlaylistEntry},
        scorer::{resolve_limit, HybridScorer},
    },
};

/// Ranked results plus any degradation the caller may want to surface
#[derive(Debug, Default, Serialize)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Playlist {
    pub playlist: Vec<PlaylistEntry>,
    pub total_minutes: u32,
    pub warnings: Vec<String>,
}

/// End-to-end recommendation pipeline: candidates, history, ranking
pub struct RecommendationService {
    aggregator: CandidateAggregator,
    scorer: HybridScorer,
    feedback: Arc<dyn FeedbackStore>,
    sessions: Arc<SessionStore>,
    pool_multiplier: usize,
}

impl RecommendationService {
    pub fn new(
        aggregator: CandidateAggregator,
        scorer: HybridScorer,
        feedback: Arc<dyn FeedbackStore>,
        sessions: Arc<SessionStore>,
        pool_multiplier: usize,
    ) -> Self {
        Self {
            aggregator,
            scorer,
            feedback,
            sessions,
            pool_multiplier: pool_multiplier.max(1),
        }
    }

    async fn liked_history(&self, user_id: &str, warnings: &mut Vec<String>) -> Vec<FeedbackRecord> {
        match self.feedback.load_liked_feedback(user_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Feedback history unavailable, ranking without it");
                warnings.push("feedback history unavailable; results are not personalized".to_string());
                vec![]
            }
        }
    }

    /// Recommends up to `limit` items for `user_id`.
    ///
    /// Upstream failures shrink the result and add a warning; only invalid
    /// input and data errors (dimension mismatch) are returned as errors.
    pub async fn recommend(
        &self,
        preferences: &Preferences,
        user_id: &str,
        limit: i64,
    ) -> AppResult<RecommendationOutcome> {
        let limit_n = resolve_limit(Some(limit))?;
        let mut outcome = RecommendationOutcome::default();
        if limit_n == 0 {
            return Ok(outcome);
        }

        let pool_size = limit_n.saturating_mul(self.pool_multiplier);
        let (pool, history) = tokio::join!(
            self.aggregator.gather(preferences, pool_size),
            self.liked_history(user_id, &mut outcome.warnings)
        );

        for source in &pool.failed_sources {
            outcome
                .warnings
                .push(format!("content source '{}' unavailable", source));
        }
        if pool.skipped_items > 0 {
            outcome.warnings.push(format!(
                "{} candidate(s) skipped: embedding unavailable",
                pool.skipped_items
            ));
        }

        match self
            .scorer
            .score_and_rank(preferences, user_id, pool.items, &history, limit)
            .await
        {
            Ok(recommendations) => outcome.recommendations = recommendations,
            Err(e) if e.is_transient() => {
                tracing::warn!(user_id = %user_id, error = %e, "Preference embedding failed, returning no results");
                outcome
                    .warnings
                    .push("embedding provider unavailable; no results".to_string());
            }
            Err(e) => return Err(e),
        }

        self.sessions
            .set_last_items(
                user_id,
                outcome
                    .recommendations
                    .iter()
                    .map(|r| r.item.clone())
                    .collect(),
            )
            .await;

        tracing::info!(
            user_id = %user_id,
            recommendations = outcome.recommendations.len(),
            warnings = outcome.warnings.len(),
            "Recommendation completed"
        );

        Ok(outcome)
    }

    /// Recommends, then packs the ranked items into a duration-bounded playlist
    pub async fn playlist(
        &self,
        preferences: &Preferences,
        user_id: &str,
        limit: i64,
        target_minutes: u32,
    ) -> AppResult<Playlist> {
        let outcome = self.recommend(preferences, user_id, limit).await?;
        let ranked: Vec<_> = outcome
            .recommendations
            .into_iter()
            .map(|r| r.item)
            .collect();

        let packed = pack_playlist(&ranked, target_minutes);
        let total = total_minutes(&packed);

        Ok(Playlist {
            playlist: packed.into_iter().map(PlaylistEntry::from).collect(),
            total_minutes: total,
            warnings: outcome.warnings,
        })
    }
}
