pub mod cylinder;

pub use cylinder::{CylinderMesh, Vertex, cylinder};
