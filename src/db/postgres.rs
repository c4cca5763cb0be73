use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};

use super::{FeedbackStore, ProfileStore};
use crate::{
    error::AppResult,
    models::{FeedbackRecord, Preferences, Profile},
};

/// Creates a PostgreSQL connection pool and applies pending migrations
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct FeedbackRow {
    user_id: String,
    item_id: String,
    liked: bool,
    embedding: Option<Vec<f64>>,
    created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for FeedbackRecord {
    fn from(row: FeedbackRow) -> Self {
        FeedbackRecord {
            user_id: row.user_id,
            item_id: row.item_id,
            liked: row.liked,
            embedding: row.embedding,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn save(&self, record: &FeedbackRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback (user_id, item_id, liked, embedding, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.item_id)
        .bind(record.liked)
        .bind(&record.embedding)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_liked_feedback(&self, user_id: &str) -> AppResult<Vec<FeedbackRecord>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT user_id, item_id, liked, embedding, created_at
            FROM feedback
            WHERE user_id = $1 AND liked = true
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedbackRecord::from).collect())
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    name: String,
    preferences: Json<Preferences>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            user_id: row.user_id,
            name: row.name,
            preferences: row.preferences.0,
        }
    }
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileStore for PgProfileStore {
    async fn save(&self, profile: &Profile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, name, preferences)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, name) DO UPDATE SET preferences = EXCLUDED.preferences
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.name)
        .bind(Json(&profile.preferences))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, user_id: &str) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, name, preferences
            FROM profiles
            WHERE user_id = $1
            ORDER BY name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn get(&self, user_id: &str, name: &str) -> AppResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, name, preferences
            FROM profiles
            WHERE user_id = $1 AND name = $2
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }
}
