use tracing::trace;

pub mod resources;
pub mod scene;

pub use resources::{DrawMode, Resource, Resources, SpriteOptions};
pub use scene::{Layer, Scene, Sprite, SpriteId};

/// Largest internal resolution in either direction, in pixels.
pub const MAX_INTERNAL_PX: f64 = 4096.0;

/// The size of a game in game units, plus the margins around its board.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RendererSize {
    pub width: f64,
    pub height: f64,
    pub top_offset: f64,
    pub left_offset: f64,
    pub bottom_offset: f64,
    pub right_offset: f64,
}

impl RendererSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

/// Where the game is drawn inside the renderer's area, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Pixels per game unit.
    pub scale_x: f64,
    pub scale_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLine {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// Maps game units onto the pixels of the area the game is drawn into, and
/// holds the [`Scene`] of sprites to draw.
#[derive(Clone, Debug)]
pub struct Renderer {
    size: RendererSize,
    px_external_width: f64,
    px_external_height: f64,
    /// Internal resolution after applying the resolution scale.
    px_width: f64,
    px_height: f64,
    viewport: Viewport,
    resolution_scale: f64,
    show_grid: bool,
    grid_lines: Vec<GridLine>,
    pub scene: Scene,
}

impl Renderer {
    pub fn new(resolution_scale: f64, show_grid: bool) -> Self {
        let mut renderer = Self {
            size: RendererSize::new(10.0, 10.0),
            px_external_width: 800.0,
            px_external_height: 600.0,
            px_width: 800.0,
            px_height: 600.0,
            viewport: Viewport {
                left: 0.0,
                top: 0.0,
                width: 1.0,
                height: 1.0,
                scale_x: 1.0,
                scale_y: 1.0,
            },
            resolution_scale,
            show_grid,
            grid_lines: Vec::new(),
            scene: Scene::default(),
        };
        renderer.resize(None);
        renderer
    }

    pub fn size(&self) -> RendererSize {
        self.size
    }

    /// Sets the size of the game in game units.
    pub fn set_size(&mut self, size: RendererSize) {
        self.size = RendererSize {
            width: size.width.abs().max(f64::MIN_POSITIVE),
            height: size.height.abs().max(f64::MIN_POSITIVE),
            ..size
        };
        self.resize(None);
    }

    pub fn set_resolution_scale(&mut self, scale: f64) {
        self.resolution_scale = scale;
        self.resize(None);
    }

    pub fn set_show_grid(&mut self, show_grid: bool) {
        self.show_grid = show_grid;
        self.draw_grid();
    }

    /// Fits the game into an area of `width × height` pixels, or into the
    /// last area when `None`.
    pub fn resize(&mut self, px_external: Option<(f64, f64)>) {
        if let Some((width, height)) = px_external {
            if width > 0.0 && height > 0.0 {
                self.px_external_width = width;
                self.px_external_height = height;
            }
        }
        let (ext_w, ext_h) = (self.px_external_width, self.px_external_height);

        let internal_w = (ext_w * self.resolution_scale).clamp(1.0, MAX_INTERNAL_PX);
        let internal_h = (ext_h * self.resolution_scale).clamp(1.0, MAX_INTERNAL_PX);
        let internal_ratio = self.scale_ratio(internal_w, internal_h);
        self.px_width = self.size.width * internal_ratio;
        self.px_height = self.size.height * internal_ratio;

        // the internal image is stretched back onto the external area
        let ratio = self.scale_ratio(ext_w, ext_h);
        let width = self.size.width * ratio;
        let height = self.size.height * ratio;
        self.viewport = Viewport {
            left: ext_w / 2.0 - width / 2.0,
            top: ext_h / 2.0 - height / 2.0,
            width,
            height,
            scale_x: width / self.size.width,
            scale_y: height / self.size.height,
        };
        trace!(
            width = ext_w,
            height = ext_h,
            internal_width = self.px_width,
            internal_height = self.px_height,
            "Renderer resized"
        );
        self.draw_grid();
    }

    /// Scales to a snug width when the game is at least as wide, relative to
    /// its height, as the area, and to a snug height otherwise.
    fn scale_ratio(&self, width: f64, height: f64) -> f64 {
        let px_fatness = width / height;
        let our_fatness = self.size.width / self.size.height;
        if our_fatness >= px_fatness {
            width / self.size.width
        } else {
            height / self.size.height
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The internal resolution in pixels.
    pub fn internal_size(&self) -> (f64, f64) {
        (self.px_width, self.px_height)
    }

    /// Maps a point in game units to a pixel of the renderer's area.
    pub fn to_pixels(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.viewport.left + x * self.viewport.scale_x,
            self.viewport.top + y * self.viewport.scale_y,
        )
    }

    /// Maps a pixel of the renderer's area back to game units.
    pub fn from_pixels(&self, px: f64, py: f64) -> (f64, f64) {
        (
            (px - self.viewport.left) / self.viewport.scale_x,
            (py - self.viewport.top) / self.viewport.scale_y,
        )
    }

    pub fn grid_lines(&self) -> &[GridLine] {
        &self.grid_lines
    }

    fn draw_grid(&mut self) {
        self.grid_lines.clear();
        if !self.show_grid {
            return;
        }
        let Viewport {
            left,
            top,
            scale_x,
            scale_y,
            ..
        } = self.viewport;
        let size = self.size;
        let start_x = left + size.left_offset * scale_x;
        let start_y = top + size.top_offset * scale_y;
        let end_x = left + (size.width - size.right_offset) * scale_x;
        let end_y = top + (size.height - size.bottom_offset) * scale_y;

        let columns = size.width.ceil() as usize;
        let rows = size.height.ceil() as usize;
        for x in 0..columns {
            let dx = x as f64 * scale_x + start_x;
            self.grid_lines.push(GridLine {
                from: (dx, start_y),
                to: (dx, end_y),
            });
        }
        for y in 0..rows {
            let dy = y as f64 * scale_y + start_y;
            self.grid_lines.push(GridLine {
                from: (start_x, dy),
                to: (end_x, dy),
            });
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(1.0, false)
    }
}
