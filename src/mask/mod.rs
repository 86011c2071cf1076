//! Body-region masks compiled to sparse per-bone weights.

pub mod compiler;
pub mod region;

pub use compiler::*;
pub use region::*;
