mod pg_pool;
mod repositories;
mod vector_store;

pub use repositories::InMemoryJobRepository;
pub use repositories::PgJobRepository;

pub use pg_pool::{create_pool, run_migrations};

pub use vector_store::InMemoryVectorStore;
