pub mod conversation_service;
pub mod embedding_service;
pub mod retrieval_index;

pub use conversation_service::{ConversationError, ConversationService};
pub use embedding_service::{Embedder, EmbeddingError, EmbeddingService};
pub use retrieval_index::{RetrievalIndex, RetrievalScope, ScoredMessage, VectorStore};
