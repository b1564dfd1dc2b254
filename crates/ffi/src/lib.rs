//! C ABI for the objrec detector.
//!
//! Every failure, panics included, comes back as an error code and message
//! inside an allocated record; nothing unwinds into the caller. All memory
//! handed to the caller comes from the C allocator, see [`api`] for the
//! release functions.

#![allow(non_camel_case_types)]

pub mod api;
pub mod error;
mod marshal;
pub mod records;

pub use api::{objrec_free, objrec_init, objrec_recognize, objrec_string_free, objret_free};
pub use error::BoundaryError;
pub use records::{err_code, objrec, objrec_cls, objret};
