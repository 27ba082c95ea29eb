mod collection_config;
mod embedder;
mod image_converter;
mod image_link_extractor;
mod job_notifier;
mod job_repository;
mod page_fetcher;
mod text_splitter;
mod vector_store;

pub use collection_config::{CollectionConfig, DistanceMetric};
pub use embedder::{Embedder, EmbedderError};
pub use image_converter::{ImageConverter, ImageConverterError};
pub use image_link_extractor::ImageLinkExtractor;
pub use job_notifier::{JobNotification, JobNotifier, NotifierError};
pub use job_repository::{JobRepository, RepositoryError};
pub use page_fetcher::{PageFetcher, PageFetcherError};
pub use text_splitter::{TextSplitter, TextSplitterError};
pub use vector_store::{SearchResult, VectorStore, VectorStoreError};
