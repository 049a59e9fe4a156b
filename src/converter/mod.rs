//!
//! Format conversion modules for Anthropic/OpenAI-compatible API translation.
//!
//! Handles bidirectional conversion between the Anthropic Messages API and an
//! OpenAI-compatible chat completions backend. Each converter follows Single
//! Responsibility Principle and focuses on a specific conversion direction.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- modules --------------------------------------------------------------------------------- */

pub mod request;
pub mod response;
pub mod streaming;
pub mod tools;

/* --- start of code -------------------------------------------------------------------------- */

pub use request::RequestConverter;
pub use response::ResponseConverter;
pub use streaming::StreamReframer;
