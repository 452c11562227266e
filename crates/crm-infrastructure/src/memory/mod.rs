//! In-process repositories.
//!
//! Each store keeps its records behind one `RwLock`, so every trait method
//! is a single atomic step against the collection.

pub mod lead_store;
pub mod user_store;

pub use lead_store::MemoryLeadRepository;
pub use user_store::MemoryUserRepository;
