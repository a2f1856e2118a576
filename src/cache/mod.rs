//! Content-addressed request cache.
//!
//! This module is provider-agnostic. It knows nothing about AWS. It:
//! - Addresses entries by a stable digest of the request (see [`QueryKey`])
//! - Stores one raw JSON response per key, written atomically
//! - Serves hits without calling the fetcher, and treats unreadable entries as misses
//! - Allows at most one live fetch in flight per key

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, LayerError};
pub use storage::{write_atomic, FsStorage, StorageError};
pub use traits::{CacheResult, QueryKey};
