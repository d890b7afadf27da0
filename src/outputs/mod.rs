//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Builds and writes the bootstrap data file (`news.json`) that
//!   seeds later runs
//!
//! # Output Structure
//!
//! ```text
//! export_dir/
//! └── news.json
//! ```

pub mod json;
