//! Diagnostic infrastructure for the boundck generic-bound checker.
//!
//! This crate provides structured error reporting with:
//! - Source location tracking into declaration manifests (file, line, column)
//! - Stable diagnostic codes for every checker and lowering error
//! - Multiple output formats (terminal, JSON lines, simple text)
//!
//! # Example
//!
//! ```
//! use boundck_diagnostics::{
//!     Diagnostic, DiagnosticCode, DiagnosticEmitter, SimpleEmitter, SourceCache, Span,
//! };
//!
//! let mut cache = SourceCache::new();
//! let file_id = cache.add_file("gen6.toml", "[[class]]\nname = \"A\"\n".to_string());
//!
//! let diag = Diagnostic::error(DiagnosticCode::BoundViolation, "`Z` does not satisfy bound `A`")
//!     .with_span(Span::new(file_id, 17, 20))
//!     .with_help("type argument `T` must be `A` or a subclass of it")
//!     .build();
//!
//! let mut out = Vec::new();
//! SimpleEmitter::new(&mut out).emit(&diag, &cache).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("gen6.toml:2:8: error"));
//! ```

pub mod diagnostic;
pub mod emitter;
pub mod source_cache;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Diagnostics, Severity};
pub use emitter::{DiagnosticEmitter, JsonEmitter, SimpleEmitter, TerminalEmitter};
pub use source_cache::{SourceCache, SourceFile};
pub use span::{FileId, Label, Location, Span};
