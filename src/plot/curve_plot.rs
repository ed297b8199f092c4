use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::math::{Color, HermiteCubic, Point3, Vector3};
use crate::tessellation::{CurveRenderer, CurveView, GraphicsDevice, RenderStats, Shading};

use super::sample::{segment_bounding_radius, CurvePlotSample, FadeRamp};

/// A trajectory plotted as a chain of cubic Hermite segments between
/// time-ordered samples.
///
/// Samples can only be added before the first or after the last one; a
/// sample whose time falls inside the covered range is ignored. Every render
/// call transforms the samples into camera space in double precision, so the
/// curve stays stable at any scale.
#[derive(Debug, Clone, Default)]
pub struct CurvePlot {
    samples: VecDeque<CurvePlotSample>,
    duration: f64,
}

/// Optional time window of a render call.
#[derive(Debug, Clone, Copy)]
struct TimeWindow {
    start: f64,
    end: f64,
}

impl CurvePlot {
    /// Creates an empty plot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample at either end of the plot.
    ///
    /// The sample is appended if its time is after the last sample, prepended
    /// if it is before the first one, and otherwise ignored. Returns whether
    /// the sample was added.
    pub fn add_sample(&mut self, mut sample: CurvePlotSample) -> bool {
        if sample.t.is_nan() {
            return false;
        }
        sample.bounding_radius = 0.0;

        let add_to_back = match (self.samples.front(), self.samples.back()) {
            (Some(_), Some(last)) if sample.t > last.t => true,
            (Some(first), Some(_)) if sample.t < first.t => false,
            (Some(_), Some(_)) => return false,
            _ => true,
        };

        if add_to_back {
            self.samples.push_back(sample);
        } else {
            self.samples.push_front(sample);
        }

        let n = self.samples.len();
        if n > 1 {
            let (start, end) = if add_to_back { (n - 2, n - 1) } else { (0, 1) };
            let radius = segment_bounding_radius(&self.samples[start], &self.samples[end]);
            self.samples[end].bounding_radius = radius;
        }
        true
    }

    /// Removes all samples earlier than `t`.
    pub fn remove_samples_before(&mut self, t: f64) {
        while self.samples.front().is_some_and(|s| s.t < t) {
            self.samples.pop_front();
        }
    }

    /// Removes all samples later than `t`.
    pub fn remove_samples_after(&mut self, t: f64) {
        while self.samples.back().is_some_and(|s| s.t > t) {
            self.samples.pop_back();
        }
    }

    /// Samples in ascending time order.
    #[must_use]
    pub fn samples(&self) -> &VecDeque<CurvePlotSample> {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time of the first sample.
    #[must_use]
    pub fn start_time(&self) -> Option<f64> {
        self.samples.front().map(|s| s.t)
    }

    /// Time of the last sample.
    #[must_use]
    pub fn end_time(&self) -> Option<f64> {
        self.samples.back().map(|s| s.t)
    }

    /// Time span the owner intends the plot to cover.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    /// Draws the whole curve in `color`.
    pub fn render<D: GraphicsDevice>(
        &self,
        renderer: &mut CurveRenderer<D>,
        view: &CurveView,
        color: Color,
    ) -> RenderStats {
        self.render_pass(renderer, view, None, &Shading::Solid, Some(color))
    }

    /// Draws the part of the curve between `start_time` and `end_time`.
    pub fn render_span<D: GraphicsDevice>(
        &self,
        renderer: &mut CurveRenderer<D>,
        view: &CurveView,
        start_time: f64,
        end_time: f64,
        color: Color,
    ) -> RenderStats {
        let window = TimeWindow {
            start: start_time,
            end: end_time,
        };
        self.render_pass(renderer, view, Some(window), &Shading::Solid, Some(color))
    }

    /// Draws the part of the curve between `start_time` and `end_time`,
    /// fading from transparent at `fade_start_time` to `color` at
    /// `fade_end_time`. Swapping the fade times reverses the fade.
    #[allow(clippy::too_many_arguments)]
    pub fn render_faded<D: GraphicsDevice>(
        &self,
        renderer: &mut CurveRenderer<D>,
        view: &CurveView,
        start_time: f64,
        end_time: f64,
        color: Color,
        fade_start_time: f64,
        fade_end_time: f64,
    ) -> RenderStats {
        let window = TimeWindow {
            start: start_time,
            end: end_time,
        };
        let shading = Shading::Faded {
            color,
            ramp: FadeRamp::between(fade_start_time, fade_end_time),
        };
        self.render_pass(renderer, view, Some(window), &shading, None)
    }

    fn first_sample_in(&self, window: TimeWindow) -> Option<usize> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        if window.end <= first.t || window.start >= last.t || window.end <= window.start {
            return None;
        }
        // Last sample at or before the window start.
        Some(
            self.samples
                .partition_point(|s| s.t <= window.start)
                .saturating_sub(1),
        )
    }

    #[allow(clippy::too_many_lines)]
    fn render_pass<D: GraphicsDevice>(
        &self,
        renderer: &mut CurveRenderer<D>,
        view: &CurveView,
        window: Option<TimeWindow>,
        shading: &Shading,
        color: Option<Color>,
    ) -> RenderStats {
        if self.samples.len() < 2 {
            return RenderStats::default();
        }
        if !view.has_valid_threshold() {
            warn!(
                threshold = view.subdivision_threshold,
                "ignoring curve render with unusable subdivision threshold"
            );
            return RenderStats::default();
        }
        let first = match window {
            Some(window) => match self.first_sample_in(window) {
                Some(first) => first,
                None => return RenderStats::default(),
            },
            None => 0,
        };

        let frustum = view.frustum;
        let threshold = view.subdivision_threshold;
        let to_camera = |s: &CurvePlotSample| -> (Point3, Vector3) {
            (view.modelview * s.position, view.modelview * s.velocity)
        };

        renderer.begin_pass(view, color);
        let mut sub = renderer.subdivider(view);

        // Set while no strip is open.
        let mut restart = true;
        let mut first_segment = window.is_some();
        let (mut p0, mut v0) = to_camera(&self.samples[first]);

        for i in first + 1..self.samples.len() {
            let s0 = &self.samples[i - 1];
            let s1 = &self.samples[i];
            let (p1, v1) = to_camera(s1);
            let last_segment = window.is_some_and(|w| w.end <= s1.t);
            let radius = s1.bounding_radius;

            if !radius.is_finite() {
                debug!(t = s1.t, "skipping curve segment with non-finite bounding radius");
                sub.stats_mut().skipped += 1;
                restart = sub.break_strip(restart);
            } else if radius >= threshold * (-frustum.near_z()).max(p0.z.abs() - radius)
                || first_segment
                || last_segment
            {
                // Close to the viewer: refine the cubic, unless the whole
                // segment is out of view.
                if frustum.cull_sphere(&p0, radius) {
                    restart = sub.break_strip(restart);
                } else {
                    let dt = s1.t - s0.t;
                    let mut t0 = 0.0;
                    let mut t1 = 1.0;
                    if let Some(window) = window {
                        if first_segment {
                            t0 = ((window.start - s0.t) / dt).clamp(0.0, 1.0);
                        }
                        if last_segment {
                            t1 = (window.end - s0.t) / dt;
                        }
                    }
                    let cubic = HermiteCubic::new(&p0, &p1, &(v0 * dt), &(v1 * dt));
                    let local = shading.localize(s0.t, dt);
                    restart = sub.render_cubic(restart, &cubic, t0, t1, radius, 1, &local);
                }
            } else {
                // Far enough away to draw as a straight chord. Only the far
                // plane is checked; the GPU clips everything else.
                sub.stats_mut().record_chord();
                if p0.z + radius < frustum.far_z() {
                    restart = sub.break_strip(restart);
                } else {
                    restart = sub.line_to(restart, &p0, s0.t, &p1, s1.t, shading);
                }
            }

            first_segment = false;
            p0 = p1;
            v0 = v1;
            if last_segment {
                break;
            }
        }

        sub.break_strip(restart);
        let stats = sub.into_stats();
        renderer.end_pass(&stats);
        stats
    }
}
