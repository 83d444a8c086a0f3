//! rpnc-util - Shared Foundation Types
//!
//! This crate provides the types that every phase of the compiler leans on:
//!
//! - [`Span`] - source locations (byte range plus line/column)
//! - [`Diagnostic`], [`Handler`], [`Level`], [`ErrorKind`] - diagnostic
//!   reporting infrastructure shared by all phases
//! - [`InternalError`] - hard failures for broken phase invariants
//!
//! The compiler is line-oriented: each input line is compiled on its own,
//! and every diagnostic is attached to the line that produced it. The
//! [`Handler`] collects diagnostics across the whole run so the driver can
//! keep going after a failed line and still report everything at the end.

pub mod diagnostic;
pub mod error;
pub mod span;

pub use diagnostic::{Diagnostic, ErrorKind, Handler, Level};
pub use error::InternalError;
pub use span::Span;
