#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// A producer of scene nodes for one named group.
pub trait Layer {
    fn id(&self) -> LayerId;

    /// Scene group this layer writes into.
    fn group(&self) -> &str;
}
