use tracing::{debug, warn};

use crate::error::Result;
use crate::math::Color;

use super::adaptive::{AdaptiveSubdivider, RenderStats};
use super::device::GraphicsDevice;
use super::vertex_sink::VertexSink;
use super::{CurveView, RendererConfig, SubdivisionParams};

/// The per-engine rendering resource: a vertex sink bound to a graphics
/// device, plus the subdivision parameters.
///
/// One renderer serves any number of curve plots, one render call at a time.
/// Threads that render concurrently need their own renderer.
#[derive(Debug)]
pub struct CurveRenderer<D> {
    sink: VertexSink<D>,
    params: SubdivisionParams,
}

impl<D: GraphicsDevice> CurveRenderer<D> {
    /// Creates a renderer with the default configuration.
    #[must_use]
    pub fn new(device: D) -> Self {
        Self {
            sink: VertexSink::new(device),
            params: SubdivisionParams::default(),
        }
    }

    /// Creates a renderer from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(device: D, config: RendererConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sink: VertexSink::with_capacity(device, config.capacity)?,
            params: config.subdivision,
        })
    }

    #[must_use]
    pub fn params(&self) -> SubdivisionParams {
        self.params
    }

    #[must_use]
    pub fn sink(&self) -> &VertexSink<D> {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut VertexSink<D> {
        &mut self.sink
    }

    #[must_use]
    pub fn device(&self) -> &D {
        self.sink.device()
    }

    pub fn device_mut(&mut self) -> &mut D {
        self.sink.device_mut()
    }

    /// Consumes the renderer and returns its device.
    pub fn into_device(self) -> D {
        self.sink.into_device()
    }

    /// Starts a render call. `color` replaces the sink's current color when
    /// given.
    pub(crate) fn begin_pass(&mut self, view: &CurveView, color: Option<Color>) {
        self.sink.setup(view.mode);
        if let Some(color) = color {
            self.sink.set_color(color);
        }
    }

    /// Borrows a subdivider over the sink for the duration of a pass.
    pub(crate) fn subdivider<'a>(&'a mut self, view: &'a CurveView) -> AdaptiveSubdivider<'a, D> {
        AdaptiveSubdivider::new(
            &mut self.sink,
            &view.frustum,
            view.subdivision_threshold,
            self.params,
        )
    }

    /// Submits everything still pending and ends the render call.
    pub(crate) fn end_pass(&mut self, stats: &RenderStats) {
        self.sink.flush();
        self.sink.finish();

        debug!(
            segments = ?stats.segments_per_depth,
            max_depth = stats.max_depth,
            "rendered curve"
        );
        if stats.truncated > 0 {
            warn!(
                truncated = stats.truncated,
                max_depth = self.params.max_depth,
                segment_budget = self.params.segment_budget,
                "curve subdivision hit its depth or budget limit"
            );
        }
    }
}
