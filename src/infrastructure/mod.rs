pub mod crawling;
pub mod embeddings;
pub mod imaging;
pub mod notification;
pub mod observability;
pub mod persistence;
pub mod text_processing;
