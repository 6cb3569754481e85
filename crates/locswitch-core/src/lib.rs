//! # locswitch-core - Core Domain Types
//!
//! Foundation crate for locswitch. Provides the value types shared by every
//! other crate, error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing, dirs).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`Coordinate`] - Latitude/longitude pair in degrees
//! - [`MovementType`] - Speed profile used by the movement engine (Walk, Cycle, Drive)
//! - [`MovementMode`] - Whether location changes are manual or driven by a route
//! - [`ConnectionKind`] - How a device is attached (USB, network)
//! - [`ConnectionStatus`] - Global connection status shown to the operator
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use locswitch_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod prelude;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::{ConnectionKind, ConnectionStatus, Coordinate, MovementMode, MovementType};
