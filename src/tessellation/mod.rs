mod adaptive;
mod device;
mod renderer;
mod vertex_sink;

pub use adaptive::{AdaptiveSubdivider, RenderStats, Shading};
pub use device::{DeviceEvent, GraphicsDevice, LineVertex, PrimitiveTopology, RecordingDevice};
pub use renderer::CurveRenderer;
pub use vertex_sink::{VertexSink, DEFAULT_CAPACITY, MIN_CAPACITY};

use crate::error::{ConfigError, Result};
use crate::math::{Affine3, Frustum};

/// Output style of rendered curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineMode {
    /// One-pixel line strips.
    #[default]
    Lines,
    /// Thick lines expanded into triangle strips by the shader.
    Triangles,
}

/// Parameters controlling adaptive subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubdivisionParams {
    /// Number of equal sub-intervals a piece is split into per level.
    pub factor: u32,
    /// Deepest level that may be refined further. Pieces at this depth are
    /// emitted flat.
    pub max_depth: u32,
    /// Maximum number of pieces refined for one sample segment. Once spent,
    /// the rest of the segment is emitted flat.
    pub segment_budget: usize,
}

impl Default for SubdivisionParams {
    fn default() -> Self {
        Self {
            factor: 8,
            max_depth: 20,
            segment_budget: 16_384,
        }
    }
}

/// Engine-level configuration of a [`CurveRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    /// Logical points held by the vertex sink before it flushes.
    pub capacity: usize,
    pub subdivision: SubdivisionParams,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            subdivision: SubdivisionParams::default(),
        }
    }
}

impl RendererConfig {
    /// Checks that the configuration describes a usable engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the capacity is below [`MIN_CAPACITY`], the
    /// subdivision factor is below 2, or the maximum depth or the segment
    /// budget is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < MIN_CAPACITY {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.capacity,
                min: MIN_CAPACITY,
            }
            .into());
        }
        if self.subdivision.factor < 2 {
            return Err(ConfigError::InvalidSubdivisionFactor(self.subdivision.factor).into());
        }
        if self.subdivision.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth.into());
        }
        if self.subdivision.segment_budget == 0 {
            return Err(ConfigError::ZeroSegmentBudget.into());
        }
        Ok(())
    }
}

/// Camera-dependent inputs of a single render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveView {
    /// Transformation from curve space into camera space.
    pub modelview: Affine3,
    pub frustum: Frustum,
    /// Ratio of apparent segment size to viewing distance above which a
    /// segment is subdivided. Smaller values subdivide more.
    pub subdivision_threshold: f64,
    pub mode: LineMode,
}

impl CurveView {
    /// Creates a view that renders thin lines.
    #[must_use]
    pub fn new(modelview: Affine3, frustum: Frustum, subdivision_threshold: f64) -> Self {
        Self {
            modelview,
            frustum,
            subdivision_threshold,
            mode: LineMode::Lines,
        }
    }

    /// Returns the view with a different output mode.
    #[must_use]
    pub fn with_mode(mut self, mode: LineMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether the threshold permits a bounded subdivision.
    #[must_use]
    pub fn has_valid_threshold(&self) -> bool {
        self.subdivision_threshold.is_finite() && self.subdivision_threshold > 0.0
    }
}
