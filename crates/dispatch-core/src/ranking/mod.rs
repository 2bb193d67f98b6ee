//! Priority pool of orders awaiting a courier.
//!
//! - [`Priority`] - fixed-precision ranking key
//! - [`RankingHeap`] - the array-backed max-heap, unsynchronized
//! - [`RankingQueue`] - shared handle that serializes access to one heap

pub mod heap;
pub mod priority;
pub mod queue;

pub use heap::*;
pub use priority::*;
pub use queue::*;
