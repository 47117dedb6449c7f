//! Domain models for the medstock system.

mod authorization;
mod catalog;
mod clinic;
mod patient;
mod resolution;
mod upload;

pub use authorization::*;
pub use catalog::*;
pub use clinic::*;
pub use patient::*;
pub use resolution::*;
pub use upload::*;
