//! # solace-error
//!
//! One error type for every solace crate.
//!
//! An [`Error`] answers three questions:
//! - what went wrong ([`ErrorKind`]): a missing key, a persona that failed,
//!   an automation run that never finished
//! - whether trying again could help ([`ErrorStatus`])
//! - where it happened: the operation plus key/value context such as the
//!   persona name or the uploaded file
//!
//! ```rust
//! use solace_error::{Error, ErrorKind};
//!
//! let err = Error::persona_failed("Stoic Agent", "provider returned no content")
//!     .with_operation("support::run")
//!     .with_context("step", "4");
//!
//! assert_eq!(err.kind(), ErrorKind::PersonaInvocationFailed);
//! assert_eq!(err.context_value("persona"), Some("Stoic Agent"));
//! ```
//!
//! Library errors from other crates are attached with `set_source` rather
//! than converted with `From`, so they never escape as raw types. The one
//! exception is `std::io::Error`.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

pub type Result<T> = std::result::Result<T, Error>;
