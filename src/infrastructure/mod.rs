pub mod registry;
pub mod storage;

pub use registry::ProjectRegistry;
pub use storage::{ObjectStore, ObjectUri};
