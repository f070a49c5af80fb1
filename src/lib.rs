use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod generator;
pub mod grammar;
pub mod mesh;
pub mod random;
pub mod skeleton;

pub use config::{GrammarConfig, TreeConfig};
pub use error::{ConfigError, GenerationError, StructureError};
pub use generator::{generate_from_yaml, GeneratedTree, TreeGenerator};
pub use grammar::{LSystem, RuleRecord, Sequence, Symbol, SymbolEncoding};
pub use mesh::{MeshBuffers, MeshParams, MeshSynthesizer};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use skeleton::{LeafRecord, RadiusBound, Skeleton, SkeletonBuilder, TurtleParams};

/// Floats per leaf in [`TreeSynth::leaves`]: position, direction, radius
pub const LEAF_STRIDE: usize = 7;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// A generated tree exposed to JavaScript as flat typed arrays
#[wasm_bindgen]
pub struct TreeSynth {
    tree: GeneratedTree,
}

#[wasm_bindgen]
impl TreeSynth {
    /// Grow the tree described by a YAML document
    #[wasm_bindgen(constructor)]
    pub fn new(yaml: &str) -> Result<TreeSynth, JsValue> {
        let tree = generate_from_yaml(yaml).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { tree })
    }

    /// x, y, z per vertex
    pub fn positions(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.tree.mesh.position_data()[..])
    }

    pub fn normals(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.tree.mesh.normal_data()[..])
    }

    pub fn tangents(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.tree.mesh.tangent_data()[..])
    }

    /// u, v per vertex
    pub fn uvs(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.tree.mesh.uv_data()[..])
    }

    pub fn indices(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(&self.tree.mesh.indices[..])
    }

    /// px, py, pz, dx, dy, dz, radius per leaf
    pub fn leaves(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&leaf_data(&self.tree.leaves)[..])
    }

    /// Bounding sphere of the mesh as cx, cy, cz, radius, for framing a camera
    pub fn bounds(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&bounds_data(&self.tree.mesh)[..])
    }

    /// Final symbol string
    pub fn sequence(&self) -> String {
        self.tree.sequence.to_string()
    }

    pub fn vertex_count(&self) -> usize {
        self.tree.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.tree.mesh.triangle_count()
    }
}

fn bounds_data(mesh: &MeshBuffers) -> [f32; 4] {
    let (center, radius) = mesh.bounding_sphere();
    [center.x, center.y, center.z, radius]
}

fn leaf_data(leaves: &[LeafRecord]) -> Vec<f32> {
    let mut data = Vec::with_capacity(leaves.len() * LEAF_STRIDE);
    for leaf in leaves {
        data.extend_from_slice(&leaf.position.to_array());
        data.extend_from_slice(&leaf.direction.to_array());
        data.push(leaf.radius);
    }
    data
}
