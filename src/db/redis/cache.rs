use redis::AsyncCommands;
use redis::Client;
use tokio::sync::mpsc;

use crate::db::{CacheEntry, EmbeddingStore};
use crate::error::AppError;
use crate::error::AppResult;

const KEY_PREFIX: &str = "emb:";

/// Creates a Redis client for the embedding cache
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

fn redis_key(key: &str) -> String {
    format!("{}{}", KEY_PREFIX, key)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
}

/// Embedding store backed by Redis
///
/// Reads go straight to Redis. Writes are handed to a background task so a
/// request never waits on the cache; a write whose request was abandoned
/// still lands.
#[derive(Clone)]
pub struct RedisEmbeddingStore {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes and waits for it
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Embedding cache writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Embedding cache writer task did not exit cleanly");
        }
    }
}

impl RedisEmbeddingStore {
    /// Creates the store and spawns its background writer
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let store = Self {
            redis_client,
            write_tx,
        };

        (store, CacheWriterHandle { shutdown_tx, task })
    }

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Embedding cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    let key = msg.key.clone();
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::warn!(error = %e, key = %key, "Failed to write embedding to Redis");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Senders live in cloned stores, so drain what is queued instead of waiting for close
                    let mut flushed = 0usize;
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::warn!(error = %e, "Failed to flush embedding during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }

                    tracing::info!(flushed, "Embedding cache writer task stopped");
                    break;
                }
                else => break,
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(msg.key, msg.value).await?;
        Ok(())
    }

    /// Reads the full entry, including the text the vector was computed from
    pub async fn get_entry(&self, key: &str) -> AppResult<Option<CacheEntry>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(redis_key(key)).await?;

        match cached {
            Some(json) => {
                let entry = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingStore for RedisEmbeddingStore {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<f64>>> {
        Ok(self.get_entry(key).await?.map(|entry| entry.vector))
    }

    async fn put(&self, key: &str, source_text: &str, vector: &[f64]) -> AppResult<()> {
        let entry = CacheEntry {
            key: key.to_string(),
            source_text: source_text.to_string(),
            vector: vector.to_vec(),
        };
        let value = serde_json::to_string(&entry)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;

        self.write_tx
            .send(CacheWriteMessage {
                key: redis_key(key),
                value,
            })
            .map_err(|_| AppError::Internal("Embedding cache writer has stopped".to_string()))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
