//! Half-edge topology kernel
//!
//! The shared mutable mesh store used by every generation stage: a point
//! registry deduplicated by quantized position, a half-edge arena with twin
//! pairing, and a triangle registry indexed per undirected edge.

mod half_edge;
mod point;
mod store;

pub use half_edge::{EdgeKey, HalfEdge, HalfEdgeKey, Triangle, TriangleKey};
pub use point::{quantize_position, Point, PointId, PositionKey};
pub use store::{GenerationPhase, SharedStore, TopologyStore};
