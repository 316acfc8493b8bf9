//! Core data models.

mod article;

pub use article::{ArticleRecord, COLUMNS};
