pub mod database;
pub mod metrics;
pub mod store;

pub use database::{MongoDb, MongoDocumentStore};
pub use metrics::{get_metrics, init_metrics};
pub use store::{DocumentStore, MemoryDocumentStore};
