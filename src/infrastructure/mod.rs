//! Reference implementations of the collaborator ports and the optional
//! durable archive.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
