//! Static model geometry.
//!
//! Geometry is uploaded once and drawn as triangle strips. External models can
//! be supplied in the run-length-encoded strip format via `StripMesh::from_rle`.

mod arrow;
mod mesh;

pub use arrow::gravity_arrow;
pub use mesh::{GeometryError, StripMesh};
