use std::collections::VecDeque;

use glam::Vec3;

/// Handle of a node inside its [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One turtle step of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonNode {
    pub position: Vec3,
    pub parent: Option<NodeId>,
    /// Owned children in creation order
    pub children: Vec<NodeId>,
    pub radius: f32,
    pub is_leaf: bool,
}

/// Where a decorative leaf object should be instanced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafRecord {
    pub position: Vec3,
    /// Unit direction pointing away from the parent node
    pub direction: Vec3,
    pub radius: f32,
}

/// Tree of nodes stored in an arena; node 0 is the root.
#[derive(Debug, Clone)]
pub struct Skeleton {
    nodes: Vec<SkeletonNode>,
}

impl Skeleton {
    pub(crate) fn with_root(radius: f32) -> Self {
        Self {
            nodes: vec![SkeletonNode {
                position: Vec3::ZERO,
                parent: None,
                children: Vec::new(),
                radius,
                is_leaf: false,
            }],
        }
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, position: Vec3, radius: f32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SkeletonNode {
            position,
            parent: Some(parent),
            children: Vec::new(),
            radius,
            is_leaf: false,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn mark_leaf(&mut self, id: NodeId) {
        self.nodes[id.0].is_leaf = true;
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &SkeletonNode {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A skeleton always holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes with their ids, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SkeletonNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Unit direction from the parent to `id`; straight up for the root or a
    /// zero-length step.
    pub fn incoming_direction(&self, id: NodeId) -> Vec3 {
        match self.parent(id) {
            Some(parent) => (self.node(id).position - self.node(parent).position)
                .try_normalize()
                .unwrap_or(Vec3::Y),
            None => Vec3::Y,
        }
    }

    /// Unit direction from `id` to its `slot`-th child, falling back to the
    /// incoming direction for a zero-length step.
    pub fn child_direction(&self, id: NodeId, slot: usize) -> Vec3 {
        let child = self.children(id)[slot];
        (self.node(child).position - self.node(id).position)
            .try_normalize()
            .unwrap_or_else(|| self.incoming_direction(id))
    }

    /// Position of `id` within its parent's child list; 0 for the root.
    pub fn child_order(&self, id: NodeId) -> usize {
        self.parent(id)
            .and_then(|parent| self.children(parent).iter().position(|&c| c == id))
            .unwrap_or(0)
    }

    /// Slot of the child that best continues the incoming direction. Ties go
    /// to the earliest child; `None` for a tip.
    pub fn most_colinear_child(&self, id: NodeId) -> Option<usize> {
        let incoming = self.incoming_direction(id);
        let mut best: Option<(usize, f32)> = None;
        for slot in 0..self.children(id).len() {
            let cosine = incoming.dot(self.child_direction(id, slot));
            if best.map_or(true, |(_, c)| cosine > c) {
                best = Some((slot, cosine));
            }
        }
        best.map(|(slot, _)| slot)
    }

    /// Nodes level by level starting at the root.
    pub fn breadth_first(&self) -> BreadthFirst<'_> {
        BreadthFirst {
            skeleton: self,
            queue: VecDeque::from([self.root()]),
        }
    }

    /// Leaf hand-off for an instancing collaborator.
    pub fn leaves(&self) -> Vec<LeafRecord> {
        self.iter()
            .filter(|(_, node)| node.is_leaf)
            .map(|(id, node)| LeafRecord {
                position: node.position,
                direction: self.incoming_direction(id),
                radius: node.radius,
            })
            .collect()
    }
}

pub struct BreadthFirst<'a> {
    skeleton: &'a Skeleton,
    queue: VecDeque<NodeId>,
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        self.queue.extend(self.skeleton.children(id).iter().copied());
        Some(id)
    }
}
