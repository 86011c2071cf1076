pub mod catalog;
pub mod human;
pub mod model;

pub use catalog::*;
pub use human::*;
pub use model::*;
