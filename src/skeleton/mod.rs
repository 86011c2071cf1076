pub mod cache;
pub mod node;

pub use cache::*;
pub use node::*;
