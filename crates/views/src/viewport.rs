use foundation::bounds::{DataBounds, ScreenRect};
use foundation::math::Vec2;
use foundation::math::scale::LinearScale;
use scene::components::GroupTransform;

/// User pan/zoom applied on top of the natural data-to-pixel mapping.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomTransform {
    pub translate: Vec2,
    pub scale: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ZoomTransform {
    pub fn identity() -> Self {
        Self {
            translate: Vec2::ZERO,
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

    /// Same transform with the scale clamped into `[lo, hi]`.
    ///
    /// Non-finite input collapses to the identity.
    pub fn clamped(self, [lo, hi]: [f64; 2]) -> Self {
        if !(self.scale.is_finite() && self.translate.is_finite()) {
            return Self::identity();
        }
        Self {
            translate: self.translate,
            scale: self.scale.clamp(lo, hi),
        }
    }

    /// Zooms by `factor` keeping `anchor` fixed on screen.
    pub fn zoomed_at(self, anchor: Vec2, factor: f64, extent: [f64; 2]) -> Self {
        let under = self.invert(anchor);
        let scale = (self.scale * factor).clamp(extent[0], extent[1]);
        Self {
            translate: anchor - under.scale(scale),
            scale,
        }
    }

    pub fn as_group(&self) -> GroupTransform {
        GroupTransform::new(self.translate, self.scale)
    }
}

/// Natural scales built from the latest bounds, composed with the user's
/// zoom transform.
///
/// The natural scales always map the niced data domain exactly onto the plot
/// area. The interactive scales are what the axes show: the natural domain
/// seen through the zoom. A new domain rebuilds the natural scales and
/// recomposes the interactive ones against them, so a zoomed-in user stays
/// zoomed in.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportTransform {
    size: Vec2,
    natural_x: LinearScale,
    natural_y: LinearScale,
    x: LinearScale,
    y: LinearScale,
    zoom: ZoomTransform,
    extent: [f64; 2],
    tick_count: usize,
    base_radius: f64,
    bounds: Option<DataBounds>,
}

impl ViewportTransform {
    /// `size` is the plot area in pixels; y grows downwards.
    pub fn new(size: Vec2, extent: [f64; 2], tick_count: usize, base_radius: f64) -> Self {
        let x = LinearScale::new([0.0, 1.0], [0.0, size.x]);
        let y = LinearScale::new([0.0, 1.0], [size.y, 0.0]);
        Self {
            size,
            natural_x: x,
            natural_y: y,
            x,
            y,
            zoom: ZoomTransform::identity(),
            extent,
            tick_count,
            base_radius,
            bounds: None,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// True until the first valid domain has been set.
    pub fn is_first_render(&self) -> bool {
        self.bounds.is_none()
    }

    /// Server bounds of the latest applied domain, before rounding.
    pub fn bounds(&self) -> Option<DataBounds> {
        self.bounds
    }

    pub fn transform(&self) -> ZoomTransform {
        self.zoom
    }

    pub fn natural_x(&self) -> &LinearScale {
        &self.natural_x
    }

    pub fn natural_y(&self) -> &LinearScale {
        &self.natural_y
    }

    pub fn x_scale(&self) -> &LinearScale {
        &self.x
    }

    pub fn y_scale(&self) -> &LinearScale {
        &self.y
    }

    /// Rebuilds the natural scales from `bounds`.
    ///
    /// Returns `false`, leaving everything untouched, for unusable bounds.
    pub fn set_domain(&mut self, bounds: &DataBounds) -> bool {
        if !bounds.is_valid() {
            return false;
        }
        self.natural_x
            .set_domain([bounds.xmin, bounds.xmax])
            .nice(self.tick_count);
        self.natural_y
            .set_domain([bounds.ymin, bounds.ymax])
            .nice(self.tick_count);
        self.bounds = Some(*bounds);
        self.recompose();
        true
    }

    /// Applies a new zoom transform, clamping its scale to the extent.
    pub fn zoom(&mut self, transform: ZoomTransform) {
        self.zoom = transform.clamped(self.extent);
        self.recompose();
    }

    pub fn zoom_at(&mut self, anchor_px: Vec2, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let next = self.zoom.zoomed_at(anchor_px, factor, self.extent);
        self.zoom(next);
    }

    pub fn pan_by(&mut self, delta_px: Vec2) {
        let next = ZoomTransform::new(self.zoom.translate + delta_px, self.zoom.scale);
        self.zoom(next);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom(ZoomTransform::identity());
    }

    fn recompose(&mut self) {
        let t = self.zoom;
        let [x0, x1] = self.natural_x.range();
        let [y0, y1] = self.natural_y.range();
        let ix = |px: f64| self.natural_x.invert((px - t.translate.x) / t.scale);
        let iy = |px: f64| self.natural_y.invert((px - t.translate.y) / t.scale);
        let x_domain = [ix(x0), ix(x1)];
        let y_domain = [iy(y0), iy(y1)];
        self.x.set_domain(x_domain);
        self.y.set_domain(y_domain);
    }

    /// Dot radius keeping a constant on-screen size under zoom.
    pub fn point_radius(&self) -> f64 {
        self.base_radius / self.zoom.scale
    }

    /// Data point in the zoomable group's space (natural mapping only).
    pub fn natural_to_px(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.natural_x.map(p.x), self.natural_y.map(p.y))
    }

    /// Data point to plot-area pixels, zoom included.
    pub fn data_to_screen(&self, p: Vec2) -> Vec2 {
        self.zoom.apply(self.natural_to_px(p))
    }

    pub fn screen_to_data(&self, px: Vec2) -> Vec2 {
        let p = self.zoom.invert(px);
        Vec2::new(self.natural_x.invert(p.x), self.natural_y.invert(p.y))
    }

    /// Pixel rectangle covered by `bounds` under the natural mapping.
    pub fn raster_rect(&self, bounds: &DataBounds) -> ScreenRect {
        let x = self.natural_x.map(bounds.xmin);
        let y = self.natural_y.map(bounds.ymax);
        ScreenRect::new(
            x,
            y,
            self.natural_x.map(bounds.xmax) - x,
            self.natural_y.map(bounds.ymin) - y,
        )
    }

    /// Data rectangle currently visible in the plot area.
    pub fn filter_bounds(&self) -> Option<DataBounds> {
        self.bounds?;
        Some(DataBounds::new(
            self.x.invert(0.0),
            self.x.invert(self.size.x),
            self.y.invert(self.size.y),
            self.y.invert(0.0),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewportTransform, ZoomTransform};
    use foundation::bounds::{DataBounds, ScreenRect};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn viewport() -> ViewportTransform {
        ViewportTransform::new(Vec2::new(900.0, 450.0), [1.0, 32.0], 10, 3.5)
    }

    fn centre_zoom() -> ZoomTransform {
        ZoomTransform::new(Vec2::new(-450.0, -225.0), 2.0)
    }

    #[test]
    fn first_render_maps_domain_onto_plot_area() {
        let mut vp = viewport();
        assert!(vp.is_first_render());
        assert!(vp.filter_bounds().is_none());
        assert!(vp.set_domain(&DataBounds::new(0.0, 10.0, 0.0, 5.0)));
        assert!(!vp.is_first_render());
        assert_eq!(vp.x_scale().domain(), vp.natural_x().domain());
        assert_eq!(vp.data_to_screen(Vec2::new(0.0, 0.0)), Vec2::new(0.0, 450.0));
        assert_eq!(vp.data_to_screen(Vec2::new(10.0, 5.0)), Vec2::new(900.0, 0.0));
        assert_eq!(
            vp.raster_rect(&DataBounds::new(0.0, 10.0, 0.0, 5.0)),
            ScreenRect::new(0.0, 0.0, 900.0, 450.0)
        );
    }

    #[test]
    fn nice_rounds_the_natural_domain() {
        let mut vp = viewport();
        vp.set_domain(&DataBounds::new(0.13, 9.7, -0.4, 4.61));
        assert_eq!(vp.natural_x().domain(), [0.0, 10.0]);
        assert_eq!(vp.natural_y().domain(), [-0.5, 5.0]);
    }

    #[test]
    fn zoom_survives_new_domain() {
        let mut vp = viewport();
        vp.set_domain(&DataBounds::new(0.0, 10.0, 0.0, 5.0));
        vp.zoom(centre_zoom());
        assert_eq!(vp.x_scale().domain(), [2.5, 7.5]);
        assert_eq!(vp.y_scale().domain(), [1.25, 3.75]);

        vp.set_domain(&DataBounds::new(0.0, 20.0, 0.0, 10.0));
        assert_eq!(vp.transform(), centre_zoom());
        assert_eq!(vp.natural_x().domain(), [0.0, 20.0]);
        assert_eq!(vp.x_scale().domain(), [5.0, 15.0]);
        assert_eq!(vp.y_scale().domain(), [2.5, 7.5]);

        // Interactive scale and composed mapping agree.
        let p = Vec2::new(12.0, 3.0);
        let screen = vp.data_to_screen(p);
        assert!((screen.x - vp.x_scale().map(p.x)).abs() < 1e-9);
        assert!((screen.y - vp.y_scale().map(p.y)).abs() < 1e-9);
    }

    #[test]
    fn scale_is_clamped_and_radius_follows() {
        let mut vp = viewport();
        vp.set_domain(&DataBounds::new(0.0, 10.0, 0.0, 5.0));
        vp.zoom(ZoomTransform::new(Vec2::ZERO, 100.0));
        assert_eq!(vp.transform().scale, 32.0);
        vp.zoom(ZoomTransform::new(Vec2::ZERO, 0.5));
        assert_eq!(vp.transform().scale, 1.0);
        vp.zoom(ZoomTransform::new(Vec2::ZERO, 2.0));
        assert_eq!(vp.point_radius(), 1.75);
        vp.zoom(ZoomTransform::new(Vec2::new(f64::NAN, 0.0), 2.0));
        assert_eq!(vp.transform(), ZoomTransform::identity());
    }

    #[test]
    fn filter_bounds_is_visible_rectangle() {
        let mut vp = viewport();
        vp.set_domain(&DataBounds::new(0.0, 10.0, 0.0, 5.0));
        assert_eq!(vp.filter_bounds(), Some(DataBounds::new(0.0, 10.0, 0.0, 5.0)));
        vp.zoom(centre_zoom());
        assert_eq!(vp.filter_bounds(), Some(DataBounds::new(2.5, 7.5, 1.25, 3.75)));
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let mut vp = viewport();
        vp.set_domain(&DataBounds::new(0.0, 10.0, 0.0, 5.0));
        let anchor = Vec2::new(300.0, 100.0);
        let before = vp.screen_to_data(anchor);
        vp.zoom_at(anchor, 4.0);
        let after = vp.screen_to_data(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);

        vp.pan_by(Vec2::new(10.0, 0.0));
        assert_eq!(vp.transform().scale, 4.0);
        vp.reset_zoom();
        assert_eq!(vp.x_scale().domain(), [0.0, 10.0]);
    }

    #[test]
    fn invalid_bounds_are_ignored() {
        let mut vp = viewport();
        vp.set_domain(&DataBounds::new(0.0, 10.0, 0.0, 5.0));
        assert!(!vp.set_domain(&DataBounds::new(5.0, 1.0, 0.0, 1.0)));
        assert!(!vp.set_domain(&DataBounds::new(0.0, f64::INFINITY, 0.0, 1.0)));
        assert_eq!(vp.natural_x().domain(), [0.0, 10.0]);
    }
}
