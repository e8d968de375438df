//! Cross-cutting domain types shared across features.

pub mod models;
