pub mod buffers;
pub mod slice;
pub mod synth;

pub use buffers::MeshBuffers;
pub use slice::{TreeSlice, CAP_UV};
pub use synth::{MeshLayout, MeshParams, MeshSynthesizer};
