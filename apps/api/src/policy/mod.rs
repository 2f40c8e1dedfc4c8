// Policy QA: chunking, indexing, retrieval, grounded answering, session memory.
// Generation goes through llm_client; embeddings through the `Embedder` trait.

pub mod assistant;
pub mod chunker;
pub mod context;
pub mod embedding;
pub mod handlers;
pub mod index;
pub mod prompts;
pub mod retriever;
pub mod session;
