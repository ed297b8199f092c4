use crate::math::{Color, Frustum, HermiteCubic, Point3};
use crate::plot::FadeRamp;

use super::device::GraphicsDevice;
use super::vertex_sink::VertexSink;
use super::SubdivisionParams;

/// How emitted points are colored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Use the sink's current color.
    Solid,
    /// Multiply the alpha of `color` by the opacity ramp evaluated at the
    /// curve parameter of each point.
    Faded { color: Color, ramp: FadeRamp },
}

impl Shading {
    /// Re-expresses the shading in the parameter space of a segment starting
    /// at time `t0` and spanning `dt` time units.
    #[must_use]
    pub fn localize(&self, t0: f64, dt: f64) -> Self {
        match *self {
            Self::Solid => Self::Solid,
            Self::Faded { color, ramp } => Self::Faded {
                color,
                ramp: ramp.localize(t0, dt),
            },
        }
    }
}

/// Counters gathered while rendering a curve.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    /// Number of `render_cubic` invocations per depth; index 0 counts
    /// segments drawn as straight chords.
    pub segments_per_depth: Vec<usize>,
    /// Deepest subdivision level reached.
    pub max_depth: u32,
    /// Smallest sub-segment bounding radius considered.
    pub min_segment_radius: f64,
    /// Sub-segments emitted flat because the depth cap or the segment budget
    /// was reached.
    pub truncated: usize,
    /// Segments skipped because their bounding radius was not finite.
    pub skipped: usize,
}

impl Default for RenderStats {
    fn default() -> Self {
        Self {
            segments_per_depth: Vec::new(),
            max_depth: 0,
            min_segment_radius: f64::INFINITY,
            truncated: 0,
            skipped: 0,
        }
    }
}

impl RenderStats {
    pub(crate) fn record_chord(&mut self) {
        if self.segments_per_depth.is_empty() {
            self.segments_per_depth.push(0);
        }
        self.segments_per_depth[0] += 1;
    }

    pub(crate) fn record_segment(&mut self, depth: u32, radius: f64) {
        let index = depth as usize;
        if self.segments_per_depth.len() <= index {
            self.segments_per_depth.resize(index + 1, 0);
        }
        self.segments_per_depth[index] += 1;
        self.max_depth = self.max_depth.max(depth);
        self.min_segment_radius = self.min_segment_radius.min(radius);
    }
}

/// Recursively refines cubic segments until each piece is flat enough for
/// the viewing distance, culling pieces outside the frustum and streaming the
/// rest into a [`VertexSink`].
///
/// Strip state is threaded through the `restart` flag: `true` means the
/// previous piece was culled (or nothing has been drawn yet) and the next
/// emitted point must open a new strip.
pub struct AdaptiveSubdivider<'a, D> {
    sink: &'a mut VertexSink<D>,
    frustum: &'a Frustum,
    threshold: f64,
    params: SubdivisionParams,
    stats: RenderStats,
    pieces_left: usize,
}

impl<'a, D: GraphicsDevice> AdaptiveSubdivider<'a, D> {
    #[must_use]
    pub fn new(
        sink: &'a mut VertexSink<D>,
        frustum: &'a Frustum,
        threshold: f64,
        params: SubdivisionParams,
    ) -> Self {
        Self {
            sink,
            frustum,
            threshold,
            params,
            stats: RenderStats::default(),
            pieces_left: params.segment_budget,
        }
    }

    #[must_use]
    pub fn frustum(&self) -> &Frustum {
        self.frustum
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut RenderStats {
        &mut self.stats
    }

    #[must_use]
    pub fn into_stats(self) -> RenderStats {
        self.stats
    }

    /// Renders `cubic` over `[t0, t1]`, returning the updated restart flag.
    ///
    /// `curve_radius` bounds the deviation of the parent piece; each of the
    /// `factor` sub-intervals is tested with `curve_radius / factor`. A call
    /// at depth 1 starts a whole sample segment and refills the segment
    /// budget.
    #[allow(clippy::too_many_arguments)]
    pub fn render_cubic(
        &mut self,
        mut restart: bool,
        cubic: &HermiteCubic,
        t0: f64,
        t1: f64,
        curve_radius: f64,
        depth: u32,
        shading: &Shading,
    ) -> bool {
        let factor = f64::from(self.params.factor);
        let dt = (t1 - t0) / factor;
        let segment_radius = curve_radius / factor;
        self.stats.record_segment(depth, segment_radius);
        if depth == 1 {
            self.pieces_left = self.params.segment_budget;
        }
        self.pieces_left = self.pieces_left.saturating_sub(1);

        let mut last_t = t0;
        let mut last_p = cubic.evaluate(t0);

        for i in 1..=self.params.factor {
            let t = t0 + dt * f64::from(i);
            let p = cubic.evaluate(t);

            let min_distance = (-self.frustum.near_z()).max(p.z.abs() - segment_radius);
            let needs_refinement = segment_radius >= self.threshold * min_distance;

            if self.frustum.cull_sphere(&p, segment_radius) {
                restart = self.break_strip(restart);
            } else if needs_refinement && depth < self.params.max_depth && self.pieces_left > 0 {
                restart = self.render_cubic(
                    restart,
                    cubic,
                    t - dt,
                    t,
                    segment_radius,
                    depth + 1,
                    shading,
                );
            } else {
                if needs_refinement {
                    self.stats.truncated += 1;
                }
                restart = self.line_to(restart, &last_p, last_t, &p, t, shading);
            }

            last_t = t;
            last_p = p;
        }

        restart
    }

    /// Closes the current strip if one is open. Always returns `true`.
    pub fn break_strip(&mut self, restart: bool) -> bool {
        if !restart {
            self.sink.end();
        }
        true
    }

    /// Extends the current strip to `to`. When `restart` is set, a new strip
    /// is opened at `from` first so that no gap appears. Returns `false`.
    pub fn line_to(
        &mut self,
        restart: bool,
        from: &Point3,
        from_t: f64,
        to: &Point3,
        to_t: f64,
        shading: &Shading,
    ) -> bool {
        if restart {
            self.sink.begin();
            self.emit_vertex(from, from_t, shading);
        }
        self.emit_vertex(to, to_t, shading);
        false
    }

    /// Emits a single point. `t` is only used by faded shading.
    pub fn emit_vertex(&mut self, p: &Point3, t: f64, shading: &Shading) {
        match shading {
            Shading::Solid => {
                self.sink.vertex(p);
            }
            Shading::Faded { color, ramp } => {
                #[allow(clippy::cast_possible_truncation)]
                let opacity = ramp.opacity(t) as f32;
                let faded = Color::new(color.x, color.y, color.z, color.w * opacity);
                self.sink.colored_vertex(p, faded);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::Vector3;
    use crate::tessellation::device::RecordingDevice;
    use crate::tessellation::LineMode;

    fn wide_frustum() -> Frustum {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        Frustum::new(
            -0.01,
            -1.0e6,
            [
                Vector3::new(0.0, -s, -s),
                Vector3::new(0.0, s, -s),
                Vector3::new(s, 0.0, -s),
                Vector3::new(-s, 0.0, -s),
            ],
        )
    }

    /// Quarter-circle-like arc in front of the camera.
    fn arc(depth: f64) -> HermiteCubic {
        HermiteCubic::new(
            &Point3::new(-1.0, 0.0, -depth),
            &Point3::new(1.0, 0.0, -depth),
            &Vector3::new(1.0, 1.0, 0.0),
            &Vector3::new(1.0, -1.0, 0.0),
        )
    }

    fn sink() -> VertexSink<RecordingDevice> {
        let mut sink = VertexSink::new(RecordingDevice::new());
        sink.setup(LineMode::Lines);
        sink
    }

    fn render(
        sink: &mut VertexSink<RecordingDevice>,
        frustum: &Frustum,
        cubic: &HermiteCubic,
        threshold: f64,
        params: SubdivisionParams,
    ) -> RenderStats {
        let mut sub = AdaptiveSubdivider::new(sink, frustum, threshold, params);
        let radius = cubic.bounding_radius();
        let restart = sub.render_cubic(true, cubic, 0.0, 1.0, radius, 1, &Shading::Solid);
        sub.break_strip(restart);
        let stats = sub.into_stats();
        sink.flush();
        stats
    }

    #[test]
    fn flat_segment_emits_factor_plus_one_points() {
        let frustum = wide_frustum();
        let cubic = arc(100.0);
        let mut sink = sink();
        let stats = render(&mut sink, &frustum, &cubic, 10.0, SubdivisionParams::default());

        assert_eq!(stats.max_depth, 1);
        let strips = sink.device().strips();
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].len(), 9);
    }

    #[test]
    fn nearer_curves_subdivide_deeper() {
        let frustum = wide_frustum();
        let params = SubdivisionParams::default();

        let mut far_sink = sink();
        let far = render(&mut far_sink, &frustum, &arc(1000.0), 1.0e-3, params);
        let mut near_sink = sink();
        let near = render(&mut near_sink, &frustum, &arc(2.0), 1.0e-3, params);

        assert!(near.max_depth > far.max_depth);
        let far_points: usize = far_sink.device().strips().iter().map(Vec::len).sum();
        let near_points: usize = near_sink.device().strips().iter().map(Vec::len).sum();
        assert!(near_points > far_points);
    }

    #[test]
    fn segment_radius_shrinks_by_factor_per_level() {
        let frustum = wide_frustum();
        let cubic = arc(2.0);
        let radius = cubic.bounding_radius();
        let mut sink = sink();
        let stats = render(&mut sink, &frustum, &cubic, 1.0e-3, SubdivisionParams::default());

        assert!(stats.max_depth >= 2);
        let expected = radius / 8f64.powi(i32::try_from(stats.max_depth).unwrap());
        assert_relative_eq!(stats.min_segment_radius, expected);
    }

    #[test]
    fn emitted_points_lie_on_the_curve_in_order() {
        let frustum = wide_frustum();
        let cubic = arc(3.0);
        let mut sink = sink();
        render(&mut sink, &frustum, &cubic, 1.0e-2, SubdivisionParams::default());

        let strips = sink.device().strips();
        assert_eq!(strips.len(), 1);
        let strip = &strips[0];
        let first = cubic.evaluate(0.0);
        let last = cubic.evaluate(1.0);
        assert_relative_eq!(f64::from(strip[0].x), first.x, epsilon = 1e-6);
        assert_relative_eq!(f64::from(strip[strip.len() - 1].x), last.x, epsilon = 1e-6);
        assert!(strip.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn culled_middle_splits_strip() {
        // Curve passes behind the camera in the middle: z goes from -5 to +5
        // and back to -5.
        let cubic = HermiteCubic::new(
            &Point3::new(-1.0, 0.0, -5.0),
            &Point3::new(1.0, 0.0, -5.0),
            &Vector3::new(0.0, 0.0, 40.0),
            &Vector3::new(0.0, 0.0, -40.0),
        );
        let frustum = Frustum::new(-0.01, -1.0e6, [Vector3::zeros(); 4]);
        let mut sink = sink();
        render(&mut sink, &frustum, &cubic, 1.0, SubdivisionParams::default());

        let strips = sink.device().strips();
        assert_eq!(strips.len(), 2);
        assert!(strips.iter().all(|s| s.len() >= 2));
        // Nothing from the part of the curve behind the camera is drawn.
        for strip in &strips {
            assert!(strip.iter().all(|p| p.z < 0.5));
        }
        assert_relative_eq!(f64::from(strips[0][0].x), -1.0, epsilon = 1e-6);
        assert_relative_eq!(f64::from(strips[1][strips[1].len() - 1].x), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn depth_cap_truncates_instead_of_looping() {
        let frustum = wide_frustum();
        let cubic = arc(2.0);
        let params = SubdivisionParams {
            factor: 2,
            max_depth: 3,
            ..SubdivisionParams::default()
        };
        let mut sink = sink();
        // A vanishing threshold would otherwise subdivide without bound.
        let stats = render(&mut sink, &frustum, &cubic, 1.0e-300, params);

        assert_eq!(stats.max_depth, 3);
        assert!(stats.truncated > 0);
        let points: usize = sink.device().strips().iter().map(Vec::len).sum();
        assert_eq!(points, 9);
    }

    #[test]
    fn segment_budget_bounds_work_for_tiny_thresholds() {
        let frustum = wide_frustum();
        let cubic = arc(5.0);
        let params = SubdivisionParams::default();
        let mut sink = sink();
        let stats = render(&mut sink, &frustum, &cubic, 1.0e-30, params);

        assert!(stats.truncated > 0);
        let pieces: usize = stats.segments_per_depth.iter().sum();
        assert!(pieces <= params.segment_budget);
        let strips = sink.device().strips();
        let first = strips.first().unwrap();
        let last = strips.last().unwrap();
        assert_relative_eq!(f64::from(first[0].x), -1.0, epsilon = 1e-6);
        assert_relative_eq!(f64::from(last[last.len() - 1].x), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn budget_is_refilled_per_segment() {
        let frustum = wide_frustum();
        let cubic = arc(5.0);
        let params = SubdivisionParams {
            segment_budget: 64,
            ..SubdivisionParams::default()
        };
        let mut sink = sink();
        let mut sub = AdaptiveSubdivider::new(&mut sink, &frustum, 1.0e-30, params);
        let radius = cubic.bounding_radius();
        let restart = sub.render_cubic(true, &cubic, 0.0, 1.0, radius, 1, &Shading::Solid);
        let first: usize = sub.stats().segments_per_depth.iter().sum();
        sub.render_cubic(restart, &cubic, 0.0, 1.0, radius, 1, &Shading::Solid);
        let both: usize = sub.stats().segments_per_depth.iter().sum();

        assert_eq!(first, 64);
        assert_eq!(both, 128);
    }

    #[test]
    fn accessors_reflect_construction() {
        let frustum = wide_frustum();
        let mut sink = sink();
        let sub = AdaptiveSubdivider::new(&mut sink, &frustum, 0.25, SubdivisionParams::default());
        assert_eq!(sub.frustum(), &frustum);
        assert_relative_eq!(sub.threshold(), 0.25);
        assert_eq!(sub.stats(), &RenderStats::default());
    }

    #[test]
    fn faded_shading_ramps_alpha() {
        let frustum = wide_frustum();
        let cubic = arc(100.0);
        let mut sink = sink();
        let shading = Shading::Faded {
            color: Color::new(1.0, 1.0, 1.0, 1.0),
            ramp: FadeRamp::between(0.0, 1.0),
        };
        let params = SubdivisionParams::default();
        let radius = cubic.bounding_radius();
        let mut sub = AdaptiveSubdivider::new(&mut sink, &frustum, 10.0, params);
        let restart = sub.render_cubic(true, &cubic, 0.0, 1.0, radius, 1, &shading);
        sub.break_strip(restart);
        sink.flush();

        let alphas: Vec<f32> = sink
            .device()
            .events()
            .iter()
            .find_map(|e| match e {
                crate::tessellation::DeviceEvent::Upload { vertices } => {
                    Some(vertices.iter().step_by(2).map(|v| v.color.w).collect())
                }
                _ => None,
            })
            .unwrap();
        // Nine points plus the trailing direction point.
        assert_eq!(alphas.len(), 10);
        assert!(alphas[0].abs() < 1e-6);
        assert!((alphas[8] - 1.0).abs() < 1e-6);
        assert!(alphas[..9].windows(2).all(|w| w[0] <= w[1]));
    }
}
