//! Control engine root.
//!
//! Line-centering regulator. Motion primitives own one instance per call.

pub mod pid;
