//! # Yiaga Core
//!
//! Core types, configuration, and storage for the Yiaga CMS.
//!
//! This crate provides:
//! - Configuration loading and validation (JSON5 format)
//! - A sled-backed record store with unique secondary indexes
//! - Content models (posts, initiatives, jobs, comments, ...)
//! - Input validation and sanitization

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod models;
pub mod store;
pub mod validation;

pub use config::{Config, ConfigError};
pub use store::{Collection, Record, RecordMeta, Store, StoreError};
pub use validation::ValidationError;
