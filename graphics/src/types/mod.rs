//! Descriptors and usage flags for graphics resources.

mod buffer;

pub use buffer::{BufferDescriptor, BufferUsage};
