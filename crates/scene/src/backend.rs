use foundation::math::Vec2;

use crate::components::GroupTransform;
use crate::node::SceneNode;
use crate::world::SceneGraph;

/// Sink for draw primitives produced by walking a [`SceneGraph`].
///
/// Transforms nest: a backend composes every pushed transform onto the
/// current one and restores it on pop.
pub trait DrawBackend {
    fn begin_frame(&mut self, size: Vec2);
    fn push_transform(&mut self, transform: GroupTransform);
    fn pop_transform(&mut self);
    fn draw(&mut self, node: &SceneNode);
    fn end_frame(&mut self);
}

/// Draws every visible node, group by group, in scene order.
pub fn render(scene: &SceneGraph, backend: &mut dyn DrawBackend) {
    backend.begin_frame(scene.size());
    for group in scene.groups().filter(|g| g.visible) {
        backend.push_transform(group.transform);
        for node in group.nodes().filter(|n| n.style.visible) {
            backend.draw(node);
        }
        backend.pop_transform();
    }
    backend.end_frame();
}

/// One flattened draw call: the node and the transform in effect.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub transform: GroupTransform,
    pub node: SceneNode,
}

/// Backend that records draw calls instead of rasterizing them.
#[derive(Debug, Default)]
pub struct CommandList {
    stack: Vec<GroupTransform>,
    pub size: Vec2,
    pub commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> GroupTransform {
        self.stack.last().copied().unwrap_or_default()
    }
}

impl DrawBackend for CommandList {
    fn begin_frame(&mut self, size: Vec2) {
        self.size = size;
        self.stack.clear();
        self.commands.clear();
    }

    fn push_transform(&mut self, transform: GroupTransform) {
        let composed = self.current().then(&transform);
        self.stack.push(composed);
    }

    fn pop_transform(&mut self) {
        self.stack.pop();
    }

    fn draw(&mut self, node: &SceneNode) {
        self.commands.push(DrawCommand {
            transform: self.current(),
            node: node.clone(),
        });
    }

    fn end_frame(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::{CommandList, render};
    use crate::components::{GroupTransform, Shape, Style};
    use crate::node::SceneNode;
    use crate::world::SceneGraph;
    use foundation::math::Vec2;

    #[test]
    fn skips_hidden_groups_and_nodes() {
        let mut scene = SceneGraph::new(Vec2::new(960.0, 500.0));
        let dots = scene.ensure_group("dots", GroupTransform::translate(Vec2::new(40.0, 20.0)));
        dots.upsert(SceneNode::new("a", Shape::circle(Vec2::ZERO, 3.5), Style::default()));
        dots.upsert(SceneNode::new(
            "b",
            Shape::circle(Vec2::ZERO, 3.5),
            Style::default().hidden(),
        ));
        let overlay = scene.ensure_group("overlay", GroupTransform::identity());
        overlay.visible = false;
        overlay.upsert(SceneNode::new("img", Shape::circle(Vec2::ZERO, 1.0), Style::default()));

        let mut list = CommandList::new();
        render(&scene, &mut list);
        assert_eq!(list.size, Vec2::new(960.0, 500.0));
        assert_eq!(list.commands.len(), 1);
        assert_eq!(list.commands[0].node.key, "a");
        assert_eq!(list.commands[0].transform.translate, Vec2::new(40.0, 20.0));
    }
}
