use crate::math::{HermiteCubic, Point3, Vector3};

/// A time-stamped position/velocity observation of a point on a trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePlotSample {
    /// Time key of the sample.
    pub t: f64,
    /// Position at time `t`.
    pub position: Point3,
    /// Velocity at time `t`, in position units per time unit.
    pub velocity: Vector3,
    /// Bound on the deviation of the segment ending at this sample from its
    /// start point. Maintained by the plot; zero for the first sample.
    pub(crate) bounding_radius: f64,
}

impl CurvePlotSample {
    /// Creates a new sample. The bounding radius is computed when the sample
    /// is added to a plot.
    #[must_use]
    pub fn new(t: f64, position: Point3, velocity: Vector3) -> Self {
        Self {
            t,
            position,
            velocity,
            bounding_radius: 0.0,
        }
    }

    /// Bounding radius of the segment that ends at this sample.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }
}

/// Bounding radius of the cubic segment running from `start` to `end`.
pub(crate) fn segment_bounding_radius(start: &CurvePlotSample, end: &CurvePlotSample) -> f64 {
    let dt = end.t - start.t;
    HermiteCubic::new(
        &start.position,
        &end.position,
        &(start.velocity * dt),
        &(end.velocity * dt),
    )
    .bounding_radius()
}

/// Linear opacity ramp `opacity(t) = clamp((t - start) * rate, 0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeRamp {
    /// Parameter value where the ramp leaves zero.
    pub start: f64,
    /// Opacity change per parameter unit. Negative values reverse the ramp.
    pub rate: f64,
}

impl FadeRamp {
    /// Builds a ramp that is transparent at `fade_start` and opaque at
    /// `fade_end`. Swapping the two reverses the direction of the fade.
    #[must_use]
    pub fn between(fade_start: f64, fade_end: f64) -> Self {
        Self {
            start: fade_start,
            rate: 1.0 / (fade_end - fade_start),
        }
    }

    /// Opacity at parameter `t`, in `[0, 1]`.
    #[must_use]
    pub fn opacity(&self, t: f64) -> f64 {
        // Zero-length ramps have an infinite rate and yield NaN at their start.
        let opacity = ((t - self.start) * self.rate).clamp(0.0, 1.0);
        if opacity.is_nan() {
            0.0
        } else {
            opacity
        }
    }

    /// Re-expresses the ramp in the parameter space of a segment starting at
    /// time `t0` and spanning `dt` time units.
    #[must_use]
    pub fn localize(&self, t0: f64, dt: f64) -> Self {
        Self {
            start: (self.start - t0) / dt,
            rate: self.rate * dt,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn new_sample_has_zero_radius() {
        let s = CurvePlotSample::new(1.0, Point3::origin(), Vector3::x());
        assert_relative_eq!(s.bounding_radius(), 0.0);
    }

    #[test]
    fn segment_radius_scales_velocity_by_time_span() {
        let a = CurvePlotSample::new(0.0, Point3::origin(), Vector3::new(0.0, 1.0, 0.0));
        let b = CurvePlotSample::new(2.0, Point3::new(2.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        // C1 = (0, 2, 0), C2 = (6, -6, 0), C3 = (-4, 4, 0).
        let expected = (10.0_f64 * 10.0 + 12.0 * 12.0).sqrt();
        assert_relative_eq!(segment_bounding_radius(&a, &b), expected, epsilon = 1e-12);
    }

    #[test]
    fn ramp_clamps_to_unit_interval() {
        let ramp = FadeRamp::between(10.0, 20.0);
        assert_relative_eq!(ramp.opacity(0.0), 0.0);
        assert_relative_eq!(ramp.opacity(10.0), 0.0);
        assert_relative_eq!(ramp.opacity(15.0), 0.5);
        assert_relative_eq!(ramp.opacity(20.0), 1.0);
        assert_relative_eq!(ramp.opacity(30.0), 1.0);
    }

    #[test]
    fn reversed_ramp_decreases() {
        let ramp = FadeRamp::between(20.0, 10.0);
        assert_relative_eq!(ramp.opacity(5.0), 1.0);
        assert_relative_eq!(ramp.opacity(15.0), 0.5);
        assert_relative_eq!(ramp.opacity(25.0), 0.0);
    }

    #[test]
    fn zero_length_ramp_is_a_step() {
        let ramp = FadeRamp::between(5.0, 5.0);
        assert_relative_eq!(ramp.opacity(4.0), 0.0);
        assert_relative_eq!(ramp.opacity(5.0), 0.0);
        assert_relative_eq!(ramp.opacity(6.0), 1.0);
    }

    #[test]
    fn localized_ramp_agrees_with_global_ramp() {
        let ramp = FadeRamp::between(3.0, 7.0);
        let local = ramp.localize(2.0, 4.0);
        for i in 0..=8 {
            let s = f64::from(i) / 8.0;
            assert_relative_eq!(local.opacity(s), ramp.opacity(2.0 + 4.0 * s), epsilon = 1e-12);
        }
    }
}
