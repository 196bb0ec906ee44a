//! Bakery order backend: ingredient catalog and PDF document rendering.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
