//! Chilean RUN (Rol Único Nacional) validation.
//!
//! A RUN is a numeric body followed by a single check character computed with
//! the module-11 algorithm. The check character is a digit or `K`.
//!
//! # Example
//!
//! ```
//! use mesa_core::run::{validate_run, RunFormat};
//!
//! let run = validate_run("12345678-5", RunFormat::Permissive).unwrap();
//! assert_eq!(run.to_string(), "123456785");
//! assert_eq!(run.formatted(), "12.345.678-5");
//!
//! assert!(validate_run("12345678-5", RunFormat::Strict).is_err());
//! ```

mod error;
mod validator;

pub use error::RunError;
pub use validator::{compute_check_digit, is_valid_run, validate_run, Run, RunFormat};
