//! Profiling support via Tracy.
//!
//! Re-exports the CPU profiling macros from [`quartz_core::profiling`] so
//! graphics code and downstream users need a single import path.
//!
//! Enable with the `profiling` feature, which forwards to `quartz-core/profiling`:
//!
//! ```toml
//! [dependencies]
//! quartz-graphics = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! ```ignore
//! use quartz_graphics::profiling::profile_scope;
//!
//! fn rebuild_chunks() {
//!     profile_scope!("rebuild_chunks");
//! }
//! ```

pub use quartz_core::{profile_function, profile_plot, profile_scope};
