/// Continuous linear mapping from a data domain onto a pixel range.
///
/// Semantics follow the usual plotting conventions: a zero-width domain maps
/// everything onto the start of the range, and `nice` widens the domain to
/// round tick boundaries.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new([0.0, 1.0], [0.0, 1.0])
    }
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn set_domain(&mut self, domain: [f64; 2]) -> &mut Self {
        self.domain = domain;
        self
    }

    pub fn set_range(&mut self, range: [f64; 2]) -> &mut Self {
        self.range = range;
        self
    }

    pub fn map(&self, v: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = d1 - d0;
        if span == 0.0 {
            return r0;
        }
        r0 + (v - d0) / span * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return d0;
        }
        d0 + (px - r0) / span * (d1 - d0)
    }

    /// Extends the domain outwards to round values for roughly `count` ticks.
    ///
    /// Two passes, since the first rounding can change the step size.
    pub fn nice(&mut self, count: usize) -> &mut Self {
        for _ in 0..2 {
            let step = tick_step(self.domain, count);
            if step == 0.0 || !step.is_finite() {
                break;
            }
            let reversed = self.domain[1] < self.domain[0];
            let (lo, hi) = if reversed {
                (self.domain[1], self.domain[0])
            } else {
                (self.domain[0], self.domain[1])
            };
            let lo = (lo / step).floor() * step;
            let hi = (hi / step).ceil() * step;
            self.domain = if reversed { [hi, lo] } else { [lo, hi] };
        }
        self
    }

    /// Round tick values inside the domain, ascending.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let step = tick_step(self.domain, count);
        if step == 0.0 || !step.is_finite() {
            return Vec::new();
        }
        let lo = self.domain[0].min(self.domain[1]);
        let hi = self.domain[0].max(self.domain[1]);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step + 0.5).floor() as i64;
        (first..=last)
            .map(|i| i as f64 * step)
            .filter(|v| *v <= hi + step * 1e-9)
            .collect()
    }

    /// Step between consecutive values returned by [`LinearScale::ticks`].
    pub fn tick_step(&self, count: usize) -> f64 {
        tick_step(self.domain, count)
    }
}

fn tick_step(domain: [f64; 2], count: usize) -> f64 {
    let span = (domain[1] - domain[0]).abs();
    if span == 0.0 || count == 0 {
        return 0.0;
    }
    let m = count as f64;
    let mut step = 10f64.powf((span / m).log10().floor());
    let err = m / span * step;
    if err <= 0.15 {
        step *= 10.0;
    } else if err <= 0.35 {
        step *= 5.0;
    } else if err <= 0.75 {
        step *= 2.0;
    }
    step
}

/// Formats a tick value with as many decimals as the step needs.
pub fn format_tick(value: f64, step: f64) -> String {
    let precision = if step > 0.0 && step.is_finite() {
        (-step.log10().floor()).max(0.0) as usize
    } else {
        0
    };
    let s = format!("{value:.precision$}");
    // "-0" and "-0.0" read badly on an axis.
    if s.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        s.trim_start_matches('-').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::{LinearScale, format_tick};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn maps_and_inverts() {
        let s = LinearScale::new([0.0, 10.0], [0.0, 500.0]);
        assert_eq!(s.map(5.0), 250.0);
        assert_eq!(s.invert(250.0), 5.0);

        let flipped = LinearScale::new([0.0, 10.0], [450.0, 0.0]);
        assert_eq!(flipped.map(0.0), 450.0);
        assert_eq!(flipped.invert(0.0), 10.0);
    }

    #[test]
    fn zero_width_domain_maps_to_range_start() {
        let s = LinearScale::new([3.0, 3.0], [10.0, 20.0]);
        assert_eq!(s.map(3.0), 10.0);
        assert_eq!(s.map(100.0), 10.0);
    }

    #[test]
    fn nice_rounds_outwards() {
        let mut s = LinearScale::new([0.13, 0.97], [0.0, 100.0]);
        s.nice(10);
        let [d0, d1] = s.domain();
        assert!(approx(d0, 0.1), "{d0}");
        assert!(approx(d1, 1.0), "{d1}");

        let mut already = LinearScale::new([0.0, 2.0], [0.0, 100.0]);
        already.nice(10);
        assert_eq!(already.domain(), [0.0, 2.0]);
    }

    #[test]
    fn nice_keeps_degenerate_domain() {
        let mut s = LinearScale::new([5.0, 5.0], [0.0, 1.0]);
        s.nice(10);
        assert_eq!(s.domain(), [5.0, 5.0]);
    }

    #[test]
    fn ticks_cover_domain() {
        let s = LinearScale::new([0.0, 1.0], [0.0, 100.0]);
        let ticks = s.ticks(10);
        assert_eq!(ticks.len(), 11);
        assert!(approx(ticks[0], 0.0));
        assert!(approx(ticks[10], 1.0));
    }

    #[test]
    fn tick_format_uses_step_precision() {
        assert_eq!(format_tick(0.30000000000000004, 0.1), "0.3");
        assert_eq!(format_tick(20.0, 5.0), "20");
        assert_eq!(format_tick(-0.0, 0.1), "0.0");
    }
}
