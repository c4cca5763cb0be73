pub mod aggregator;
pub mod embeddings;
pub mod feedback;
pub mod playlist;
pub mod profiles;
pub mod providers;
pub mod recommendations;
pub mod scorer;
pub mod similarity;

pub use aggregator::{CandidateAggregator, CandidatePool};
pub use embeddings::{Embedder, EmbeddingService, OpenAiEmbedder};
pub use feedback::FeedbackService;
pub use profiles::ProfileService;
pub use recommendations::{Playlist, RecommendationOutcome, RecommendationService};
pub use scorer::HybridScorer;
