pub mod backend;
pub mod domain;
pub mod extraction;

pub use backend::*;
pub use domain::*;
pub use extraction::*;
