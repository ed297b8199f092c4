//! High-precision rendering of long, thin trajectory curves.
//!
//! A [`CurvePlot`] holds time-stamped position/velocity samples. Rendering
//! transforms each pair of samples into camera space in double precision,
//! builds a cubic Hermite segment, adaptively subdivides it according to the
//! viewing distance, culls pieces outside the view frustum and streams the
//! resulting line strips through a fixed-capacity [`VertexSink`] into a
//! [`GraphicsDevice`].

pub mod error;
pub mod math;
pub mod plot;
pub mod tessellation;

pub use error::{ConfigError, CurvePlotError, Result};
pub use math::{Frustum, HermiteCubic};
pub use plot::{CurvePlot, CurvePlotSample, FadeRamp};
pub use tessellation::{
    AdaptiveSubdivider, CurveRenderer, CurveView, DeviceEvent, GraphicsDevice, LineMode,
    LineVertex, PrimitiveTopology, RecordingDevice, RenderStats, RendererConfig,
    SubdivisionParams, VertexSink,
};
