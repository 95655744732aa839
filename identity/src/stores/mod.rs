//! Session store implementations.
//!
//! - [`FileSessionStore`]: JSON file, survives restarts
//! - [`MemorySessionStore`]: process-local
//! - [`FallbackSessionStore`]: infallible facade used by the identity layer;
//!   degrades to memory when the durable backend fails

pub mod fallback;
pub mod file;
pub mod memory;

pub use fallback::FallbackSessionStore;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
