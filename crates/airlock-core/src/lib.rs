//! # airlock-core
//!
//! Core crate for Airlock. Contains the port traits (seals, queues,
//! reservations, notifier, presence, airlocks), configuration schemas,
//! the serializable permit [`Token`](types::token::Token), admission
//! outcomes, domain events, store key builders and the unified error.
//!
//! This crate has **no** internal dependencies on other Airlock crates.

pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
