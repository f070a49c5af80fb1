use glam::{Quat, Vec3};
use log::{debug, warn};
use serde::Deserialize;

use super::node::{NodeId, Skeleton};
use crate::error::{ConfigError, StructureError};
use crate::grammar::Symbol;

/// What happens to the radius after a decay command scales it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RadiusBound {
    #[default]
    Unbounded,
    /// Radius never drops below `min`.
    Floor { min: f32 },
    /// Radius never rises above `max`.
    Ceiling { max: f32 },
}

impl RadiusBound {
    pub fn apply(self, radius: f32) -> f32 {
        match self {
            RadiusBound::Unbounded => radius,
            RadiusBound::Floor { min } => radius.max(min),
            RadiusBound::Ceiling { max } => radius.min(max),
        }
    }
}

/// Parameters controlling how symbols become geometry
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TurtleParams {
    /// Length of one forward step
    pub step_length: f32,
    /// Rotation per turn command (degrees)
    pub angle: f32,
    /// Radius of the root node
    pub initial_radius: f32,
    /// Multiplier applied by `!`
    pub radius_decay: f32,
    pub radius_bound: RadiusBound,
}

impl Default for TurtleParams {
    fn default() -> Self {
        Self {
            step_length: 1.0,
            angle: 25.0,
            initial_radius: 0.1,
            radius_decay: 0.9,
            radius_bound: RadiusBound::Unbounded,
        }
    }
}

impl TurtleParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.step_length.is_finite() || self.step_length < 0.0 {
            return Err(ConfigError::parameter("step_length", "must be finite and >= 0"));
        }
        if !self.angle.is_finite() {
            return Err(ConfigError::parameter("angle", "must be finite"));
        }
        if !self.initial_radius.is_finite() || self.initial_radius <= 0.0 {
            return Err(ConfigError::parameter("initial_radius", "must be finite and > 0"));
        }
        if !self.radius_decay.is_finite() || self.radius_decay <= 0.0 {
            return Err(ConfigError::parameter("radius_decay", "must be finite and > 0"));
        }
        match self.radius_bound {
            RadiusBound::Floor { min: bound } | RadiusBound::Ceiling { max: bound }
                if !bound.is_finite() || bound < 0.0 =>
            {
                Err(ConfigError::parameter("radius_bound", "must be finite and >= 0"))
            }
            _ => Ok(()),
        }
    }
}

/// Turtle heading, thickness and attachment point. Copied onto the branch
/// stack at `[` and restored at `]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    /// Accumulated rotation about the x, y and z axes (degrees)
    pub rotation: Vec3,
    pub radius: f32,
    pub node: NodeId,
}

impl TurtleState {
    /// Unit forward vector: +Y rotated by z, then x, then y.
    pub fn heading(&self) -> Vec3 {
        let r = self.rotation;
        let rotation = Quat::from_rotation_y(r.y.to_radians())
            * Quat::from_rotation_x(r.x.to_radians())
            * Quat::from_rotation_z(r.z.to_radians());
        rotation * Vec3::Y
    }
}

/// Interprets a symbol sequence as turtle commands.
///
/// | glyph | command |
/// |-------|---------|
/// | `F` | step forward, creating a node |
/// | `+` `-` | turn about z |
/// | `&` `^` | pitch about x |
/// | `\` `/` | roll about y |
/// | `[` `]` | open / close a branch |
/// | `!` | decay the radius |
/// | `L` | mark the current node as carrying a leaf |
///
/// Other symbols are ignored. Instance digits of indexed symbols do not
/// change the command.
pub struct SkeletonBuilder {
    params: TurtleParams,
}

impl SkeletonBuilder {
    pub fn new(params: TurtleParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TurtleParams {
        &self.params
    }

    pub fn build(&self, sequence: &[Symbol]) -> Result<Skeleton, StructureError> {
        let params = &self.params;
        let mut skeleton = Skeleton::with_root(params.initial_radius);
        let mut state = TurtleState {
            rotation: Vec3::ZERO,
            radius: params.initial_radius,
            node: skeleton.root(),
        };
        let mut stack: Vec<TurtleState> = Vec::new();

        for (position, symbol) in sequence.iter().enumerate() {
            match symbol.glyph() {
                'F' => {
                    let from = skeleton.node(state.node).position;
                    let to = from + state.heading() * params.step_length;
                    state.node = skeleton.add_child(state.node, to, state.radius);
                }
                '+' => state.rotation.z += params.angle,
                '-' => state.rotation.z -= params.angle,
                '&' => state.rotation.x += params.angle,
                '^' => state.rotation.x -= params.angle,
                '\\' => state.rotation.y += params.angle,
                '/' => state.rotation.y -= params.angle,
                '[' => stack.push(state),
                ']' => {
                    state = stack.pop().ok_or(StructureError::UnbalancedClose { position })?;
                }
                '!' => state.radius = params.radius_bound.apply(state.radius * params.radius_decay),
                'L' => skeleton.mark_leaf(state.node),
                _ => {}
            }
        }

        if !stack.is_empty() {
            warn!("{} branch(es) left open at end of sequence", stack.len());
        }
        debug!("built skeleton with {} nodes", skeleton.len());
        Ok(skeleton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolEncoding;

    const EPS: f32 = 1e-5;

    fn build(text: &str, params: TurtleParams) -> Result<Skeleton, StructureError> {
        let seq = SymbolEncoding::SingleChar.parse(text).unwrap();
        SkeletonBuilder::new(params).build(&seq)
    }

    fn right_angles() -> TurtleParams {
        TurtleParams {
            step_length: 1.0,
            angle: 90.0,
            ..Default::default()
        }
    }

    fn assert_near(actual: Vec3, expected: Vec3) {
        assert!(
            actual.abs_diff_eq(expected, EPS),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_empty_string_gives_root_only() {
        let skeleton = build("", right_angles()).unwrap();
        assert_eq!(skeleton.len(), 1);
        assert_eq!(skeleton.node(skeleton.root()).position, Vec3::ZERO);
    }

    #[test]
    fn test_single_step() {
        let skeleton = build("F", right_angles()).unwrap();
        let root = skeleton.root();
        assert_eq!(skeleton.len(), 2);
        assert_eq!(skeleton.node(root).position, Vec3::ZERO);
        let child = skeleton.children(root)[0];
        assert_near(skeleton.node(child).position, Vec3::Y);
    }

    #[test]
    fn test_two_steps() {
        let skeleton = build("FF", right_angles()).unwrap();
        let a = skeleton.children(skeleton.root())[0];
        let b = skeleton.children(a)[0];
        assert_near(skeleton.node(b).position, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_turns_about_z() {
        let skeleton = build("F+F", right_angles()).unwrap();
        let a = skeleton.children(skeleton.root())[0];
        assert_near(skeleton.node(skeleton.children(a)[0]).position, Vec3::new(-1.0, 1.0, 0.0));

        let skeleton = build("F-F", right_angles()).unwrap();
        let a = skeleton.children(skeleton.root())[0];
        assert_near(skeleton.node(skeleton.children(a)[0]).position, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_pitch_and_roll() {
        let skeleton = build("F&F", right_angles()).unwrap();
        let a = skeleton.children(skeleton.root())[0];
        assert_near(skeleton.node(skeleton.children(a)[0]).position, Vec3::new(0.0, 1.0, 1.0));

        // roll alone keeps heading up; roll then turn swings the turn into z
        let skeleton = build("F\\+F", right_angles()).unwrap();
        let a = skeleton.children(skeleton.root())[0];
        assert_near(skeleton.node(skeleton.children(a)[0]).position, Vec3::new(0.0, 1.0, 1.0));

        let skeleton = build("\\F", right_angles()).unwrap();
        assert_near(skeleton.node(skeleton.children(skeleton.root())[0]).position, Vec3::Y);
    }

    #[test]
    fn test_branches_share_parent() {
        let skeleton = build("F[+F][-F]", right_angles()).unwrap();
        let a = skeleton.children(skeleton.root())[0];
        assert_near(skeleton.node(a).position, Vec3::Y);
        let children = skeleton.children(a);
        assert_eq!(children.len(), 2);
        assert_near(skeleton.node(children[0]).position, Vec3::new(-1.0, 1.0, 0.0));
        assert_near(skeleton.node(children[1]).position, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_close_restores_heading() {
        let skeleton = build("F[+F]F", right_angles()).unwrap();
        let a = skeleton.children(skeleton.root())[0];
        let children = skeleton.children(a);
        assert_near(skeleton.node(children[1]).position, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_unbalanced_close_is_structural_error() {
        let err = build("F]F", right_angles()).unwrap_err();
        assert_eq!(err, StructureError::UnbalancedClose { position: 1 });

        let err = build("[F]]", right_angles()).unwrap_err();
        assert_eq!(err, StructureError::UnbalancedClose { position: 3 });
    }

    #[test]
    fn test_unclosed_branch_is_accepted() {
        let skeleton = build("F[+F", right_angles()).unwrap();
        assert_eq!(skeleton.len(), 3);
    }

    #[test]
    fn test_radius_decay_and_restore() {
        let params = TurtleParams {
            initial_radius: 1.0,
            radius_decay: 0.5,
            ..right_angles()
        };
        let skeleton = build("F[!F]F", params).unwrap();
        let a = skeleton.children(skeleton.root())[0];
        let children = skeleton.children(a);
        assert_eq!(skeleton.node(a).radius, 1.0);
        assert_eq!(skeleton.node(children[0]).radius, 0.5);
        assert_eq!(skeleton.node(children[1]).radius, 1.0);
    }

    #[test]
    fn test_radius_floor_bounds_from_below() {
        let params = TurtleParams {
            initial_radius: 1.0,
            radius_decay: 0.5,
            radius_bound: RadiusBound::Floor { min: 0.3 },
            ..right_angles()
        };
        let skeleton = build("!F!F!F", params).unwrap();
        let radii: Vec<f32> = skeleton.iter().map(|(_, n)| n.radius).collect();
        assert_eq!(radii, vec![1.0, 0.5, 0.3, 0.3]);
    }

    #[test]
    fn test_radius_ceiling_bounds_from_above() {
        let params = TurtleParams {
            initial_radius: 1.0,
            radius_decay: 2.0,
            radius_bound: RadiusBound::Ceiling { max: 3.0 },
            ..right_angles()
        };
        let skeleton = build("!F!F", params).unwrap();
        let radii: Vec<f32> = skeleton.iter().map(|(_, n)| n.radius).collect();
        assert_eq!(radii, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_leaf_marker_and_unknown_symbols() {
        let skeleton = build("FXLF[+FL]Q", right_angles()).unwrap();
        let leaves = skeleton.leaves();
        assert_eq!(leaves.len(), 2);
        assert_near(leaves[0].position, Vec3::Y);
        assert_near(leaves[1].direction, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_indexed_symbols_use_glyph() {
        let seq = SymbolEncoding::Indexed.parse("F1F22[+F3]").unwrap();
        let skeleton = SkeletonBuilder::new(right_angles()).build(&seq).unwrap();
        assert_eq!(skeleton.len(), 4);
    }

    #[test]
    fn test_params_validation() {
        assert!(TurtleParams::default().validate().is_ok());
        let bad = TurtleParams {
            initial_radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidParameter { name: "initial_radius", .. })
        ));
        let bad = TurtleParams {
            radius_bound: RadiusBound::Floor { min: f32::NAN },
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
