use nalgebra::Vector4;
use tracing::trace;

use crate::error::{ConfigError, Result};
use crate::math::{Color, Point3};

use super::device::{GraphicsDevice, LineVertex, PrimitiveTopology};
use super::LineMode;

/// Default number of logical points held before an implicit flush.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Smallest capacity that can hold a strip segment plus its continuation.
pub const MIN_CAPACITY: usize = 2;

/// Fixed-capacity vertex store that batches line strips for a
/// [`GraphicsDevice`].
///
/// Each logical point is written as two slots with scales `-0.5` and `+0.5`.
/// When a strip is closed, one extra trailing point repeating the position of
/// the second-to-last point is appended, and the scales of the final point are
/// negated, so that a thick-line shader can derive the direction of the last
/// segment. Strips of zero or one point are discarded.
///
/// When the buffer fills up in the middle of a strip the strip is closed,
/// the batch is flushed, and the strip reopens with the boundary point.
///
/// A sink is shared mutable state: only one render call may drive it at a
/// time.
#[derive(Debug)]
pub struct VertexSink<D> {
    device: D,
    data: Vec<LineVertex>,
    capacity: usize,
    current_position: usize,
    current_strip_length: usize,
    strip_lengths: Vec<usize>,
    color: Color,
    mode: LineMode,
    buffer_created: bool,
}

impl<D: GraphicsDevice> VertexSink<D> {
    /// Creates a sink with [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new(device: D) -> Self {
        Self::allocate(device, DEFAULT_CAPACITY)
    }

    /// Creates a sink holding up to `capacity` logical points per batch.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is below [`MIN_CAPACITY`].
    pub fn with_capacity(device: D, capacity: usize) -> Result<Self> {
        if capacity < MIN_CAPACITY {
            return Err(ConfigError::CapacityTooSmall {
                capacity,
                min: MIN_CAPACITY,
            }
            .into());
        }
        Ok(Self::allocate(device, capacity))
    }

    fn allocate(device: D, capacity: usize) -> Self {
        Self {
            device,
            // One extra point for the trailing direction slot of the last strip.
            data: vec![LineVertex::default(); (capacity + 1) * 2],
            capacity,
            current_position: 0,
            current_strip_length: 0,
            strip_lengths: Vec::new(),
            color: Color::new(1.0, 1.0, 1.0, 1.0),
            mode: LineMode::Lines,
            buffer_created: false,
        }
    }

    /// Maximum number of logical points per batch.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of logical points written since the last flush, including
    /// trailing direction points of closed strips.
    #[must_use]
    pub fn pending_points(&self) -> usize {
        self.current_position
    }

    /// Lengths of the closed strips awaiting the next flush.
    #[must_use]
    pub fn pending_strips(&self) -> &[usize] {
        &self.strip_lengths
    }

    /// Output mode selected by the last [`setup`](Self::setup).
    #[must_use]
    pub fn mode(&self) -> LineMode {
        self.mode
    }

    /// Color used by [`vertex`](Self::vertex).
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Sets the color used by [`vertex`](Self::vertex).
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    #[must_use]
    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Consumes the sink and returns its device.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Prepares the sink for a render call: creates the device buffer on
    /// first use, discards any pending data and binds the attribute layout.
    pub fn setup(&mut self, mode: LineMode) {
        if !self.buffer_created {
            self.device.create_buffer(self.data.len());
            self.buffer_created = true;
        }
        self.strip_lengths.clear();
        self.current_strip_length = 0;
        self.current_position = 0;
        self.mode = mode;
        self.device.bind(mode);
    }

    /// Ends a render call.
    pub fn finish(&mut self) {
        self.device.unbind();
    }

    /// Opens a new strip, closing the current one if it is still open.
    pub fn begin(&mut self) {
        if self.current_strip_length > 0 {
            self.end();
        }
    }

    /// Closes the current strip.
    pub fn end(&mut self) {
        self.end_strip(true);
    }

    /// Appends a point with the current color. Returns `true` if the buffer
    /// was flushed to the device as a result.
    pub fn vertex(&mut self, position: &Point3) -> bool {
        self.push(position, self.color)
    }

    /// Appends a point with an explicit color. Returns `true` if the buffer
    /// was flushed to the device as a result.
    pub fn colored_vertex(&mut self, position: &Point3, color: Color) -> bool {
        self.push(position, color)
    }

    /// Closes the open strip and submits all pending strips to the device.
    pub fn flush(&mut self) {
        self.flush_batch(true);
    }

    fn push(&mut self, position: &Point3, color: Color) -> bool {
        let position: Vector4<f32> = position.coords.cast::<f32>().push(1.0);
        self.write_point(self.current_position, position, color);
        self.current_position += 1;
        self.current_strip_length += 1;
        if self.current_position < self.capacity {
            return false;
        }

        self.flush_batch(true);

        // Reopen the strip at the boundary point.
        self.write_point(0, position, color);
        self.current_position = 1;
        self.current_strip_length = 1;
        true
    }

    fn write_point(&mut self, point: usize, position: Vector4<f32>, color: Color) {
        let index = point * 2;
        self.data[index] = LineVertex {
            position,
            color,
            scale: -0.5,
        };
        self.data[index + 1] = LineVertex {
            position,
            color,
            scale: 0.5,
        };
    }

    fn end_strip(&mut self, flush_if_needed: bool) {
        if self.current_strip_length > 1 {
            let index = self.current_position * 2;
            // Repeat the second-to-last point so the direction of the final
            // segment can be derived from the trailing slot.
            let previous = self.data[index - 4];
            self.write_point(self.current_position, previous.position, previous.color);
            self.data[index - 2].scale = -self.data[index - 2].scale;
            self.data[index - 1].scale = -self.data[index - 1].scale;
            self.current_position += 1;
            self.strip_lengths.push(self.current_strip_length);
        } else {
            self.current_position -= self.current_strip_length;
        }
        self.current_strip_length = 0;

        if flush_if_needed && self.current_position >= self.capacity {
            self.flush_batch(false);
        }
    }

    fn flush_batch(&mut self, end_if_needed: bool) {
        if self.current_position > 0 {
            if end_if_needed && self.current_strip_length > 1 {
                self.end_strip(false);
            }

            if !self.strip_lengths.is_empty() {
                self.device.upload(&self.data[..self.current_position * 2]);

                let mut start = 0;
                for &length in &self.strip_lengths {
                    match self.mode {
                        LineMode::Lines => {
                            self.device.draw(PrimitiveTopology::LineStrip, start, length);
                        }
                        LineMode::Triangles => {
                            self.device
                                .draw(PrimitiveTopology::TriangleStrip, start * 2, length * 2);
                        }
                    }
                    start += length + 1;
                }
                trace!(
                    points = self.current_position,
                    strips = self.strip_lengths.len(),
                    "flushed curve vertex batch"
                );
            }

            self.current_position = 0;
            self.strip_lengths.clear();
        }

        self.current_strip_length = 0;
    }
}
