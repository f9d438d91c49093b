//! Cross-cutting decorators around an [`Airlock`](airlock_core::traits::Airlock).
//!
//! Each decorator holds an inner airlock and implements the same trait.
//! Optional operations are checked against the inner capability flags
//! before forwarding, so an unsupported call fails at the outermost layer.

pub mod events;
pub mod traced;

use airlock_core::error::AppError;
use airlock_core::result::AppResult;

pub use events::EventAirlock;
pub use traced::TracingAirlock;

fn ensure_capability(supported: bool, operation: &str) -> AppResult<()> {
    if supported {
        Ok(())
    } else {
        Err(AppError::unsupported(format!(
            "Inner airlock does not support {operation}"
        )))
    }
}
