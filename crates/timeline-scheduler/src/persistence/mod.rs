//! Record store seam: workflow and task documents, per-owner counters

mod memory;
mod store;

pub use memory::InMemoryRecordStore;
pub use store::{RecordStore, StoreError};
