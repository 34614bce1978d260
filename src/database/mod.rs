pub mod activities_repo;
pub mod activity_members_repo;
pub mod memory_store;
pub mod members_repo;
pub mod postgrest_store;
pub mod store;

pub use memory_store::MemoryStore;
pub use postgrest_store::PostgrestStore;
pub use store::{Filter, RecordStore, Select};
