//! Optional Tracy instrumentation.
//!
//! Geometry work that can get expensive on large meshes (quantization, ghost
//! edge welding, KD-tree construction, combined buffer rebuilds) is wrapped in
//! spans so it shows up in the [Tracy profiler](https://github.com/wolfpld/tracy).
//!
//! Enable with the `profiling` Cargo feature:
//!
//! ```toml
//! [dependencies]
//! quartz-core = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! ```ignore
//! use quartz_core::{profile_function, profile_scope};
//!
//! fn rebuild() {
//!     profile_function!();
//!     {
//!         profile_scope!("upload_chunks");
//!     }
//! }
//! ```
//!
//! Without the feature every macro expands to nothing.

#[cfg(feature = "profiling")]
pub use tracy_client::{self, plot as tracy_plot, span};

/// Create a profiling span that lasts until the end of the current scope.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Create a profiling span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Create a profiling span named after the enclosing function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

/// Create a function span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Plot a numeric value over time, e.g. combined pool chunk counts.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        $crate::profiling::tracy_plot!($name, $value as f64)
    };
}

/// Plot a value (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        let _ = $value;
    };
}
