pub mod database;
pub mod deadline;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::MongoConnection;
pub use memory::InMemoryItemStore;
pub use self::metrics::{get_metrics, init_metrics};
pub use store::{ItemStore, MongoItemStore};
