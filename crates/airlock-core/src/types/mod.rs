//! Shared value types.

pub mod capability;
pub mod outcome;
pub mod token;

pub use capability::{AirlockCapabilities, SealCapabilities, SealKind};
pub use outcome::{ClaimResult, EntryResult, NO_QUEUE_POSITION};
pub use token::{TOKEN_VERSION, Token};
