pub mod error;
pub mod rounding;
pub mod time_value;
pub mod types;

#[cfg(feature = "financing")]
pub mod financing;

#[cfg(feature = "proforma")]
pub mod proforma;

#[cfg(feature = "returns")]
pub mod returns;

#[cfg(feature = "validation")]
pub mod validation;

#[cfg(feature = "audit")]
pub mod audit;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use error::ProformaError;
pub use types::*;

/// Standard result type for all pro-forma operations
pub type ProformaResult<T> = Result<T, ProformaError>;
