//! Host port allocation
//!
//! Every application deployed on the shared server gets its own host port.
//! Ports come from a single persisted counter that is advanced under an
//! exclusive lock, so concurrent requests and restarts never hand out the
//! same host port twice.

pub mod allocator;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use allocator::{Options, PortAllocator};
pub use memory::MemoryPortStore;
pub use sqlite::SqlitePortStore;
pub use store::{PortCounter, PortCounterStore};

/// Highest value a host port may take
pub const MAX_PORT: i64 = u16::MAX as i64;
