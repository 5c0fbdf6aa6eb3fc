pub mod clients;
pub mod config;
pub mod models;
pub mod query;
pub mod storage;
pub mod sync;
pub mod transform;

// Convenient re-exports for tests and external callers
pub use clients::*;
pub use config::*;
pub use models::*;
pub use storage::*;
pub use sync::*;
