#![forbid(unsafe_code)]

pub mod catalog;
pub mod model;
pub mod scoring;
pub mod time;

pub use catalog::{CatalogError, QuestionBank};
pub use scoring::{Score, score};
pub use time::Clock;
