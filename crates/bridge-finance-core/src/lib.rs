pub mod error;
pub mod types;

#[cfg(feature = "bridge")]
pub mod bridge;

#[cfg(feature = "sensitivity")]
pub mod scenarios;

pub use error::BridgeFinanceError;
pub use types::*;

/// Standard result type for all bridge-finance operations
pub type BridgeFinanceResult<T> = Result<T, BridgeFinanceError>;
