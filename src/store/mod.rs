//! Registry storage: id-indexed arenas for bits, missions and crons.

pub mod arena;
pub mod registry;

pub use arena::{Arena, StoreError};
pub use registry::Registry;
