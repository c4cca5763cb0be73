/// Hybrid ranking
///
/// Final score for a candidate:
///
/// ```text
/// search = 0.6 * query + 0.4 * mean(liked embeddings)   (query alone without likes)
/// score  = cosine(search, item)
///          * 0.8 if the platform is outside the allow-list
///          * 0.9 if the known duration exceeds the maximum
///          + 0.001 * popularity
/// ```
///
/// Items the user already liked are never returned. Ties keep candidate order.
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{preference_cache_key, ContentItem, FeedbackRecord, Preferences, Recommendation},
    services::{
        embeddings::EmbeddingService,
        similarity::{blend, cosine_similarity, mean_vector},
    },
};

/// Weight of the query vector when blending with the personalization vector
pub const QUERY_WEIGHT: f64 = 0.6;
pub const PLATFORM_MISMATCH_FACTOR: f64 = 0.8;
pub const OVER_DURATION_FACTOR: f64 = 0.9;
pub const POPULARITY_WEIGHT: f64 = 0.001;
pub const DEFAULT_LIMIT: usize = 10;

/// Resolves a caller-supplied limit. Negative limits are rejected.
pub fn resolve_limit(limit: Option<i64>) -> AppResult<usize> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(n) if n < 0 => Err(AppError::InvalidInput(format!(
            "limit must not be negative, got {}",
            n
        ))),
        Some(n) => usize::try_from(n)
            .map_err(|_| AppError::InvalidInput(format!("limit out of range: {}", n))),
    }
}

/// The user's inferred taste: mean of liked-item embeddings
#[derive(Debug, Clone, PartialEq)]
pub struct Personalization {
    pub vector: Vec<f64>,
    pub liked_items: usize,
}

impl Personalization {
    /// `None` when no liked record carries an embedding
    pub fn from_feedback(feedback: &[FeedbackRecord]) -> AppResult<Option<Self>> {
        let liked: Vec<&[f64]> = feedback
            .iter()
            .filter(|f| f.liked)
            .filter_map(|f| f.embedding.as_deref())
            .collect();

        let liked_items = liked.len();
        Ok(mean_vector(liked)?.map(|vector| Self {
            vector,
            liked_items,
        }))
    }
}

/// Query vector, blended with personalization when there is any
pub fn search_vector(query: &[f64], personalization: Option<&Personalization>) -> AppResult<Vec<f64>> {
    match personalization {
        Some(p) => blend(query, &p.vector, QUERY_WEIGHT),
        None => Ok(query.to_vec()),
    }
}

fn liked_ids(feedback: &[FeedbackRecord]) -> HashSet<&str> {
    feedback
        .iter()
        .filter(|f| f.liked)
        .map(|f| f.item_id.as_str())
        .collect()
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

pub struct HybridScorer {
    embeddings: Arc<EmbeddingService>,
}

impl HybridScorer {
    pub fn new(embeddings: Arc<EmbeddingService>) -> Self {
        Self { embeddings }
    }

    /// Embeds the preferences (cached under `pref:<normalized query>`) and ranks
    pub async fn score_and_rank(
        &self,
        preferences: &Preferences,
        user_id: &str,
        candidates: Vec<ContentItem>,
        feedback: &[FeedbackRecord],
        limit: i64,
    ) -> AppResult<Vec<Recommendation>> {
        let limit = resolve_limit(Some(limit))?;
        if limit == 0 || candidates.is_empty() {
            return Ok(vec![]);
        }

        let query = preferences.query_text();
        let query_vector = self
            .embeddings
            .get_or_embed(&preference_cache_key(&query), &query)
            .await?;

        let ranked = rank(preferences, &query_vector, candidates, feedback, limit)?;

        tracing::info!(
            user_id = %user_id,
            returned = ranked.len(),
            "Candidates ranked"
        );

        Ok(ranked)
    }
}

/// Scores, filters, sorts and truncates. Pure and deterministic.
pub fn rank(
    preferences: &Preferences,
    query_vector: &[f64],
    candidates: Vec<ContentItem>,
    feedback: &[FeedbackRecord],
    limit: usize,
) -> AppResult<Vec<Recommendation>> {
    if limit == 0 {
        return Ok(vec![]);
    }

    let personalization = Personalization::from_feedback(feedback)?;
    let search = search_vector(query_vector, personalization.as_ref())?;
    let excluded = liked_ids(feedback);

    let mut scored = Vec::with_capacity(candidates.len());
    for item in candidates {
        if excluded.contains(item.id.as_str()) {
            continue;
        }
        let Some(embedding) = item.embedding.as_deref() else {
            tracing::debug!(item_id = %item.id, "Candidate has no embedding, skipping");
            continue;
        };

        let base = cosine_similarity(&search, embedding)?;
        let mut score = base;
        let mut reasons = vec![match &personalization {
            Some(p) => format!(
                "Personalized with {} liked item{}",
                p.liked_items,
                plural(p.liked_items)
            ),
            None => "Matched on your preferences".to_string(),
        }];
        reasons.push(format!("similarity {:.2}", base));

        if !preferences.allows_platform(&item.platform) {
            score *= PLATFORM_MISMATCH_FACTOR;
            reasons.push(format!("{} is not a preferred platform (-20%)", item.platform));
        }

        if let (Some(max), Some(minutes)) = (preferences.max_duration_minutes, item.duration_minutes) {
            if item.exceeds_duration(max) {
                score *= OVER_DURATION_FACTOR;
                reasons.push(format!("{} min is over the {} min limit (-10%)", minutes, max));
            }
        }

        let popularity = item.popularity();
        if popularity != 0.0 {
            score += POPULARITY_WEIGHT * popularity;
            reasons.push(format!("popularity {:.1}", popularity));
        }

        scored.push(Recommendation {
            item,
            score,
            reason: reasons.join("; "),
        });
    }

    // Stable sort: equal scores keep candidate order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);

    Ok(scored)
}
