use tracing::debug;

/// Square region of the window that receives the logical canvas, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DestinationRect {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl DestinationRect {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Uniform factor mapping a `logical_size` canvas onto this rectangle.
    #[allow(clippy::cast_precision_loss)]
    pub fn scale(&self, logical_size: u32) -> f32 {
        if logical_size == 0 {
            return 0.0;
        }
        self.size as f32 / logical_size as f32
    }
}

/// Largest centred square inside a `width × height` window.
pub fn compute_destination_rect(width: u32, height: u32) -> DestinationRect {
    let size = width.min(height);
    DestinationRect {
        x: (width - size) / 2,
        y: (height - size) / 2,
        size,
    }
}

/// Tracks the window size and the canvas placement derived from it.
#[derive(Debug, Clone)]
pub struct ViewportManager {
    logical_size: u32,
    window_size: (u32, u32),
    destination: DestinationRect,
}

impl ViewportManager {
    pub fn new(logical_size: u32, width: u32, height: u32) -> Self {
        Self {
            logical_size,
            window_size: (width, height),
            destination: compute_destination_rect(width, height),
        }
    }

    /// Recompute the placement from the new window size alone.
    pub fn resize(&mut self, width: u32, height: u32) -> DestinationRect {
        self.window_size = (width, height);
        self.destination = compute_destination_rect(width, height);
        debug!(
            width,
            height,
            x = self.destination.x,
            y = self.destination.y,
            size = self.destination.size,
            "viewport resized"
        );
        self.destination
    }

    pub fn destination(&self) -> DestinationRect {
        self.destination
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn scale_factor(&self) -> f32 {
        self.destination.scale(self.logical_size)
    }
}
