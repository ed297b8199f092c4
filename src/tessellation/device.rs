use nalgebra::Vector4;

use crate::math::Color;

use super::LineMode;

/// One slot of the streamed vertex buffer.
///
/// Every logical curve point occupies two consecutive slots with opposite
/// `scale` values, which a thick-line shader uses to push the pair apart in
/// screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineVertex {
    /// Camera-space position (`w = 1`).
    pub position: Vector4<f32>,
    /// RGBA color.
    pub color: Color,
    /// Signed half-width multiplier.
    pub scale: f32,
}

impl Default for LineVertex {
    fn default() -> Self {
        Self {
            position: Vector4::new(0.0, 0.0, 0.0, 1.0),
            color: Color::zeros(),
            scale: 0.0,
        }
    }
}

/// Primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Thin line strip; indices address vertex pairs.
    LineStrip,
    /// Triangulated thick line; indices address individual slots.
    TriangleStrip,
}

/// The graphics-device operations the vertex sink relies on.
///
/// Submissions are fire-and-forget: implementations must not assume the
/// uploaded slice outlives the call.
pub trait GraphicsDevice {
    /// Allocates a streaming buffer large enough for `slots` vertices.
    /// Called once per sink, before the first upload.
    fn create_buffer(&mut self, slots: usize);

    /// Binds the buffer and its attribute layout for a render call.
    fn bind(&mut self, mode: LineMode);

    /// Replaces the start of the buffer with `vertices`.
    fn upload(&mut self, vertices: &[LineVertex]);

    /// Issues a draw call over the uploaded vertices.
    fn draw(&mut self, topology: PrimitiveTopology, first: usize, count: usize);

    /// Releases the attribute bindings at the end of a render call.
    fn unbind(&mut self);
}

/// Event recorded by [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    CreateBuffer { slots: usize },
    Bind { mode: LineMode },
    Upload { vertices: Vec<LineVertex> },
    Draw {
        topology: PrimitiveTopology,
        first: usize,
        count: usize,
    },
    Unbind,
}

/// A headless device that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    events: Vec<DeviceEvent>,
}

impl RecordingDevice {
    /// Creates an empty recording device.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events in submission order.
    #[must_use]
    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    /// Discards the recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of uploads, i.e. buffer flushes that carried data.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DeviceEvent::Upload { .. }))
            .count()
    }

    /// Reconstructs the drawn strips, one vertex per logical point, in draw
    /// order.
    ///
    /// Each draw call is resolved against the most recent upload.
    #[must_use]
    pub fn strip_vertices(&self) -> Vec<Vec<LineVertex>> {
        let mut strips = Vec::new();
        let mut buffer: &[LineVertex] = &[];
        for event in &self.events {
            match event {
                DeviceEvent::Upload { vertices } => buffer = vertices,
                DeviceEvent::Draw {
                    topology,
                    first,
                    count,
                } => {
                    let (first, count) = match topology {
                        PrimitiveTopology::LineStrip => (*first, *count),
                        PrimitiveTopology::TriangleStrip => (*first / 2, *count / 2),
                    };
                    let strip = (first..first + count)
                        .filter_map(|i| buffer.get(i * 2).copied())
                        .collect();
                    strips.push(strip);
                }
                _ => {}
            }
        }
        strips
    }

    /// Positions of the drawn strips, see [`strip_vertices`](Self::strip_vertices).
    #[must_use]
    pub fn strips(&self) -> Vec<Vec<Vector4<f32>>> {
        self.strip_vertices()
            .into_iter()
            .map(|strip| strip.into_iter().map(|v| v.position).collect())
            .collect()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_buffer(&mut self, slots: usize) {
        self.events.push(DeviceEvent::CreateBuffer { slots });
    }

    fn bind(&mut self, mode: LineMode) {
        self.events.push(DeviceEvent::Bind { mode });
    }

    fn upload(&mut self, vertices: &[LineVertex]) {
        self.events.push(DeviceEvent::Upload {
            vertices: vertices.to_vec(),
        });
    }

    fn draw(&mut self, topology: PrimitiveTopology, first: usize, count: usize) {
        self.events.push(DeviceEvent::Draw {
            topology,
            first,
            count,
        });
    }

    fn unbind(&mut self) {
        self.events.push(DeviceEvent::Unbind);
    }
}
