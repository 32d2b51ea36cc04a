//! Core types shared by every stage: error taxonomy and configuration.

pub mod config;
pub mod errors;
