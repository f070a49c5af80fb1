pub mod node;
pub mod turtle;

pub use node::{LeafRecord, NodeId, Skeleton, SkeletonNode};
pub use turtle::{RadiusBound, SkeletonBuilder, TurtleParams, TurtleState};
