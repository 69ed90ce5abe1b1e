//! Core data models for the ranking engine.

mod completion;
mod fight;
mod fighter;
mod ids;
mod ranking;
mod season;
mod standings;
mod streak;

pub use completion::*;
pub use fight::*;
pub use fighter::*;
pub use ids::*;
pub use ranking::*;
pub use season::*;
pub use standings::*;
pub use streak::*;
