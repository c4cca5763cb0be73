use std::sync::Arc;

use crate::{
    db::{FeedbackStore, SessionStore},
    error::{AppError, AppResult},
    models::FeedbackRecord,
    services::embeddings::EmbeddingService,
};

/// Records likes and dislikes, capturing the liked item's embedding
pub struct FeedbackService {
    store: Arc<dyn FeedbackStore>,
    sessions: Arc<SessionStore>,
    embeddings: Arc<EmbeddingService>,
}

impl FeedbackService {
    pub fn new(
        store: Arc<dyn FeedbackStore>,
        sessions: Arc<SessionStore>,
        embeddings: Arc<EmbeddingService>,
    ) -> Self {
        Self {
            store,
            sessions,
            embeddings,
        }
    }

    /// Stores the feedback record.
    ///
    /// A like on an item from the user's last recommendations stores that
    /// item's embedding. An unknown item or an embedding failure stores the
    /// record without one.
    pub async fn record_feedback(
        &self,
        user_id: &str,
        item_id: &str,
        liked: bool,
    ) -> AppResult<FeedbackRecord> {
        if user_id.trim().is_empty() || item_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "user_id and item_id are required".to_string(),
            ));
        }

        let mut embedding = None;
        if liked {
            match self.sessions.find_recent_item(user_id, item_id).await {
                Some(item) => match self
                    .embeddings
                    .get_or_embed(&item.id, &item.embedding_text())
                    .await
                {
                    Ok(vector) => embedding = Some(vector),
                    Err(e) => {
                        tracing::warn!(item_id = %item_id, error = %e, "Could not embed liked item");
                    }
                },
                None => {
                    tracing::debug!(user_id = %user_id, item_id = %item_id, "Liked item not in recent session");
                }
            }
        }

        let record = FeedbackRecord::new(user_id, item_id, liked).with_embedding(embedding);
        self.store.save(&record).await?;

        tracing::info!(
            user_id = %user_id,
            item_id = %item_id,
            liked,
            embedded = record.embedding.is_some(),
            "Feedback recorded"
        );

        Ok(record)
    }
}
