//! Skeleton retargeting: bone correspondence, rest-pose offsets and the
//! memoized remap tables built from them.

pub mod builder;
pub mod correspondence;
pub mod mirror;
pub mod offset;
pub mod shared;
pub mod table;

pub use builder::*;
pub use correspondence::*;
pub use mirror::*;
pub use offset::*;
pub use shared::*;
pub use table::*;
