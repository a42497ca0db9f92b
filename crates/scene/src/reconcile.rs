use indexmap::IndexMap;

use crate::node::SceneNode;
use crate::world::Group;

/// Keys touched by one [`Group::join`], in data order (exits in old order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSummary {
    pub entered: Vec<String>,
    pub updated: Vec<String>,
    pub exited: Vec<String>,
}

impl JoinSummary {
    pub fn is_noop(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

impl Group {
    /// Identity-keyed enter/update/exit of this group's nodes against `data`.
    ///
    /// - keys not yet present are created with `enter`;
    /// - keys already present are passed to `update`;
    /// - nodes whose key is absent from `data` are removed.
    ///
    /// A key repeated in `data` is joined once with its last datum, at the
    /// position of its first occurrence. Afterwards node order equals data
    /// order.
    pub fn join<D>(
        &mut self,
        data: impl IntoIterator<Item = (String, D)>,
        mut enter: impl FnMut(&str, &D) -> SceneNode,
        mut update: impl FnMut(&str, &D, &mut SceneNode),
    ) -> JoinSummary {
        let mut keyed: IndexMap<String, D> = IndexMap::new();
        for (key, datum) in data {
            keyed.insert(key, datum);
        }

        let mut summary = JoinSummary::default();
        // Claimed slots are emptied in place so exits keep their old order.
        let mut previous: IndexMap<String, Option<SceneNode>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|(key, node)| (key, Some(node)))
            .collect();
        let mut next = IndexMap::with_capacity(keyed.len());

        for (key, datum) in &keyed {
            match previous.get_mut(key).and_then(Option::take) {
                Some(mut node) => {
                    update(key, datum, &mut node);
                    summary.updated.push(key.clone());
                    next.insert(key.clone(), node);
                }
                None => {
                    let mut node = enter(key, datum);
                    node.key = key.clone();
                    summary.entered.push(key.clone());
                    next.insert(key.clone(), node);
                }
            }
        }

        summary.exited = previous
            .into_iter()
            .filter_map(|(key, node)| node.map(|_| key))
            .collect();
        self.nodes = next;
        summary
    }
}
