//! The normalized in-memory store of fetched entities.

mod collection;
mod entity_store;

pub use collection::{Collection, Entity, FetchToken, LoadStatus};
pub use entity_store::{EntityStore, SharedStore, StoreSnapshot};
