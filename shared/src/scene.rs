/*!
Renderer-agnostic scene graph.

Every visual object the core drives is a [`SceneNode`] addressed by a
[`NodeId`]. Hosts mirror nodes onto their own entities each frame:
- `pose`, `scale` and `visible` map onto the root transform and visibility,
- `parts` map onto named descendants (a lid, indicator lights),
- `texture` names an image to apply to every mesh under the node.

Removal is permanent. Removed ids are queued once for the host to dispose.
*/

use std::collections::HashMap;

use thiserror::Error;

use crate::types::{Pose, Vec3};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0:?} was removed")]
    Removed(NodeId),
    #[error("node {node:?} has no part named `{part}`")]
    MissingPart { node: NodeId, part: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Ground,
    Vehicle,
    Wheel,
    Shop,
    ShopProxy,
    VehicleProxy,
    Barrel,
    Container,
    Content,
    Decoration,
    Board,
}

/// Local state of a named sub-object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartState {
    pub pose: Pose,
    pub visible: bool,
    /// Set once the core has written the pose; untouched parts keep their authored pose.
    pub pose_driven: bool,
}

impl Default for PartState {
    fn default() -> Self {
        Self {
            pose: Pose::identity(),
            visible: true,
            pose_driven: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub kind: NodeKind,
    /// Asset path, or `None` for procedural geometry (fallback wheels, proxies).
    pub asset: Option<String>,
    pub pose: Pose,
    pub scale: Vec3,
    pub visible: bool,
    pub removed: bool,
    pub parts: HashMap<String, PartState>,
    pub texture: Option<String>,
    /// Playback time of the node's animation clip, if it has one.
    pub clip_time: Option<f32>,
}

impl SceneNode {
    pub fn new(kind: NodeKind, asset: Option<String>, pose: Pose, scale: f32) -> Self {
        Self {
            kind,
            asset,
            pose,
            scale: Vec3::repeat(scale),
            visible: true,
            removed: false,
            parts: HashMap::new(),
            texture: None,
            clip_time: None,
        }
    }

    pub fn with_parts<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.parts.insert(name.to_owned(), PartState::default());
        }
        self
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    removed_queue: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Live node lookup; removed nodes are not returned.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0 as usize).filter(|n| !n.removed)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0 as usize).filter(|n| !n.removed)
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        match self.nodes.get(id.0 as usize) {
            None => Err(SceneError::UnknownNode(id)),
            Some(n) if n.removed => Err(SceneError::Removed(id)),
            Some(n) => Ok(n),
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        match self.nodes.get_mut(id.0 as usize) {
            None => Err(SceneError::UnknownNode(id)),
            Some(n) if n.removed => Err(SceneError::Removed(id)),
            Some(n) => Ok(n),
        }
    }

    pub fn set_pose(&mut self, id: NodeId, pose: Pose) {
        if let Some(node) = self.get_mut(id) {
            node.pose = pose;
        }
    }

    pub fn set_translation(&mut self, id: NodeId, translation: Vec3) {
        if let Some(node) = self.get_mut(id) {
            node.pose.translation = translation;
        }
    }

    pub fn translation(&self, id: NodeId) -> Option<Vec3> {
        self.get(id).map(|n| n.pose.translation)
    }

    pub fn part(&self, id: NodeId, name: &str) -> Result<&PartState, SceneError> {
        self.node(id)?
            .parts
            .get(name)
            .ok_or_else(|| SceneError::MissingPart {
                node: id,
                part: name.to_owned(),
            })
    }

    pub fn part_mut(&mut self, id: NodeId, name: &str) -> Result<&mut PartState, SceneError> {
        self.node_mut(id)?
            .parts
            .get_mut(name)
            .ok_or_else(|| SceneError::MissingPart {
                node: id,
                part: name.to_owned(),
            })
    }

    /// Permanently remove a node. Removing twice is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize)
            && !node.removed
        {
            node.removed = true;
            node.visible = false;
            self.removed_queue.push(id);
        }
    }

    pub fn is_removed(&self, id: NodeId) -> bool {
        self.nodes.get(id.0 as usize).is_some_and(|n| n.removed)
    }

    /// Ids removed since the last drain.
    pub fn drain_removed(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.removed_queue)
    }

    /// Live nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.removed)
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_is_reported_once() {
        let mut graph = SceneGraph::new();
        let id = graph.add(SceneNode::new(NodeKind::Container, None, Pose::identity(), 1.0));
        graph.remove(id);
        graph.remove(id);
        assert_eq!(graph.drain_removed(), vec![id]);
        assert!(graph.drain_removed().is_empty());
        assert!(graph.get(id).is_none());
        assert_eq!(graph.node(id).err(), Some(SceneError::Removed(id)));
    }

    #[test]
    fn missing_part_is_an_error_not_a_panic() {
        let mut graph = SceneGraph::new();
        let id = graph.add(
            SceneNode::new(NodeKind::Container, None, Pose::identity(), 1.0).with_parts(["lid"]),
        );
        assert!(graph.part(id, "lid").is_ok());
        assert_eq!(
            graph.part(id, "handle").err(),
            Some(SceneError::MissingPart {
                node: id,
                part: "handle".into()
            })
        );
    }

    #[test]
    fn iter_skips_removed_nodes() {
        let mut graph = SceneGraph::new();
        let a = graph.add(SceneNode::new(NodeKind::Barrel, None, Pose::identity(), 1.0));
        let b = graph.add(SceneNode::new(NodeKind::Barrel, None, Pose::identity(), 1.0));
        graph.remove(a);
        let ids: Vec<_> = graph.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b]);
        assert_eq!(graph.len(), 1);
    }
}
