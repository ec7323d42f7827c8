#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod scoring;
pub mod stats;
pub mod time;
pub mod timer;

pub use catalog::{CatalogError, QuestionCatalog};
pub use config::{ConfigError, ExamConfig, ExamConfigDraft};
pub use error::Error;
pub use time::Clock;
