//! # loadhook-core
//!
//! Core crate for loadhook. Contains the configuration schemas and the
//! unified error system shared by the interceptor and the instrumentation
//! lifecycle.
//!
//! This crate has **no** internal dependencies on other loadhook crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
