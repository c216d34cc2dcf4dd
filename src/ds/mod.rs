pub mod priority_store;
pub mod version_registry;

pub use priority_store::{Entry, PriorityStore};
pub use version_registry::VersionRegistry;
