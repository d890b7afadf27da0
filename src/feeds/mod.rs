//! Feed retrieval and parsing.
//!
//! This module contains the stages that turn the configured source list into
//! normalized news items:
//!
//! | Stage | Module | Notes |
//! |-------|--------|-------|
//! | Transport | [`transport`] | `reqwest` client, optional proxy prefix, retry with backoff |
//! | Parsing | [`parser`] | RSS `<item>` and Atom `<entry>`, streaming `quick-xml` reader |
//! | Orchestration | [`fetch`] | every source in flight at once, per-source timeout |
//!
//! # Common Patterns
//!
//! - Concurrent fetching with `futures::stream` for performance
//! - Graceful error handling (failed sources are logged and reported by name)
//! - Items are normalized as soon as they are parsed

pub mod fetch;
pub mod parser;
pub mod transport;
