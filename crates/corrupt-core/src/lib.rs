//! Core types and utilities for corrupted validation datasets.
//!
//! This crate provides the corruption identifiers, example records, error
//! type and configuration shared by the dataset pipeline and the tools.

pub mod cli;
pub mod config;
pub mod error;
pub mod types;

pub use cli::*;
pub use config::*;
pub use error::{Error, Result};
pub use types::*;
