//! In-memory implementations of the entity store ports.

mod store;

pub use store::InMemoryStore;
