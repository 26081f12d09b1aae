//! High-level intermediate representation for boundck
//!
//! Turns a deserialized manifest into the immutable [`ClassTable`] the
//! checker resolves against, plus the bodies it walks.
//!
//! [`ClassTable`]: boundck_types::ClassTable

pub mod error;
pub mod ir;
pub mod lower;

pub use error::LowerError;
pub use ir::*;
pub use lower::{lower_manifest, Lowered};
