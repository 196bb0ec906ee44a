//! Application services layer.

pub mod catalog;
pub mod documents;
pub mod error;
