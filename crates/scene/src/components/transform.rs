use foundation::math::Vec2;

/// Uniform scale followed by a translation: `p' = p * scale + translate`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GroupTransform {
    pub translate: Vec2,
    pub scale: f64,
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl GroupTransform {
    pub fn identity() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }

    pub fn translate(translate: Vec2) -> Self {
        Self {
            translate,
            scale: 1.0,
        }
    }

    pub fn new(translate: Vec2, scale: f64) -> Self {
        Self { translate, scale }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        p.scale(self.scale) + self.translate
    }

    pub fn invert(&self, p: Vec2) -> Vec2 {
        (p - self.translate).scale(1.0 / self.scale)
    }

    /// `self` applied after `inner`.
    pub fn then(&self, inner: &GroupTransform) -> GroupTransform {
        GroupTransform {
            translate: self.apply(inner.translate),
            scale: self.scale * inner.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GroupTransform;
    use foundation::math::Vec2;

    #[test]
    fn identity_is_noop() {
        let p = Vec2::new(3.0, -2.0);
        assert_eq!(GroupTransform::identity().apply(p), p);
    }

    #[test]
    fn apply_invert_and_compose() {
        let t = GroupTransform::new(Vec2::new(10.0, 20.0), 2.0);
        let p = Vec2::new(1.0, 1.0);
        assert_eq!(t.apply(p), Vec2::new(12.0, 22.0));
        assert_eq!(t.invert(t.apply(p)), p);

        let outer = GroupTransform::translate(Vec2::new(40.0, 20.0));
        let both = outer.then(&t);
        assert_eq!(both.apply(p), outer.apply(t.apply(p)));
    }
}
