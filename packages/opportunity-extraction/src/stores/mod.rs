//! Record store implementations.

pub mod json;
pub mod memory;

pub use json::{JsonRecordStore, DEFAULT_TABLE};
pub use memory::MemoryRecordStore;
