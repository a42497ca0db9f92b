use foundation::math::Vec2;
use indexmap::IndexMap;

use crate::components::GroupTransform;
use crate::node::SceneNode;

/// An ordered, keyed collection of nodes sharing one transform.
///
/// Node order is draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: String,
    pub transform: GroupTransform,
    pub visible: bool,
    pub(crate) nodes: IndexMap<String, SceneNode>,
}

impl Group {
    pub fn new(id: impl Into<String>, transform: GroupTransform) -> Self {
        Self {
            id: id.into(),
            transform,
            visible: true,
            nodes: IndexMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts or replaces the node with the same key, keeping its slot.
    pub fn upsert(&mut self, node: SceneNode) {
        self.nodes.insert(node.key.clone(), node);
    }

    pub fn get(&self, key: &str) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<SceneNode> {
        self.nodes.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.keys().map(|k| k.as_str())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> + '_ {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> + '_ {
        self.nodes.values_mut()
    }
}

/// Retained-mode scene: named groups drawn in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneGraph {
    size: Vec2,
    groups: IndexMap<String, Group>,
}

impl SceneGraph {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            groups: IndexMap::new(),
        }
    }

    /// Outer pixel size of the drawing surface.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    /// Returns the group `id`, appending it with `transform` if missing.
    pub fn ensure_group(&mut self, id: &str, transform: GroupTransform) -> &mut Group {
        self.groups
            .entry(id.to_string())
            .or_insert_with(|| Group::new(id, transform))
    }

    pub fn has_group(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.get_mut(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> + '_ {
        self.groups.values()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Total number of nodes over all groups.
    pub fn node_count(&self) -> usize {
        self.groups.values().map(Group::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::SceneGraph;
    use crate::components::{GroupTransform, Shape, Style};
    use crate::node::SceneNode;
    use foundation::math::Vec2;

    #[test]
    fn groups_keep_insertion_order() {
        let mut scene = SceneGraph::new(Vec2::new(100.0, 100.0));
        scene.ensure_group("back", GroupTransform::identity());
        scene.ensure_group("front", GroupTransform::identity());
        scene.ensure_group("back", GroupTransform::translate(Vec2::new(5.0, 5.0)));
        let ids: Vec<_> = scene.groups().map(|g| g.id().to_string()).collect();
        assert_eq!(ids, vec!["back", "front"]);
        assert_eq!(
            scene.group("back").unwrap().transform,
            GroupTransform::identity()
        );
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut scene = SceneGraph::new(Vec2::new(10.0, 10.0));
        let g = scene.ensure_group("dots", GroupTransform::identity());
        g.upsert(SceneNode::new("a", Shape::circle(Vec2::ZERO, 1.0), Style::default()));
        g.upsert(SceneNode::new("b", Shape::circle(Vec2::ZERO, 1.0), Style::default()));
        g.upsert(SceneNode::new("a", Shape::circle(Vec2::new(1.0, 1.0), 1.0), Style::default()));
        let keys: Vec<_> = g.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(scene.node_count(), 2);
    }
}
