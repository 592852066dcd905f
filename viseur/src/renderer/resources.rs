use std::f64::consts::PI;

use crate::renderer::scene::{Scene, Sprite, SpriteId};
use crate::{Color, SceneError};

/// How a front end paints a sprite of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    /// Fills the sprite's whole area with its color.
    Tile,
    /// Draws the glyph in the middle of the sprite's area.
    Glyph,
    /// Draws the border of the sprite's area.
    Outline,
    /// Draws the sprite's text.
    Text,
}

/// Something a game can draw, the counterpart of a texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resource {
    pub key: &'static str,
    pub glyph: char,
    /// The color used when the sprite has no tint.
    pub fill: Color,
    pub mode: DrawMode,
    /// Whether the glyph follows the sprite's rotation.
    pub directional: bool,
}

const ARROWS: [char; 8] = ['→', '↘', '↓', '↙', '←', '↖', '↑', '↗'];

impl Resource {
    pub const fn tile(key: &'static str, fill: Color) -> Self {
        Self {
            key,
            glyph: ' ',
            fill,
            mode: DrawMode::Tile,
            directional: false,
        }
    }

    pub const fn glyph(key: &'static str, glyph: char, fill: Color) -> Self {
        Self {
            key,
            glyph,
            fill,
            mode: DrawMode::Glyph,
            directional: false,
        }
    }

    pub const fn outline(key: &'static str, glyph: char, fill: Color) -> Self {
        Self {
            key,
            glyph,
            fill,
            mode: DrawMode::Outline,
            directional: false,
        }
    }

    /// A glyph that points along the sprite's rotation.
    pub const fn arrow(key: &'static str, fill: Color) -> Self {
        Self {
            key,
            glyph: '→',
            fill,
            mode: DrawMode::Glyph,
            directional: true,
        }
    }

    pub const fn text(key: &'static str, fill: Color) -> Self {
        Self {
            key,
            glyph: ' ',
            fill,
            mode: DrawMode::Text,
            directional: false,
        }
    }

    /// The glyph to draw for a sprite rotated by `rotation` radians, y
    /// pointing down.
    pub fn glyph_for(&self, rotation: f64) -> char {
        if !self.directional || !rotation.is_finite() {
            return self.glyph;
        }
        let octant = (rotation.rem_euclid(2.0 * PI) / (PI / 4.0)).round() as usize % 8;
        ARROWS[octant]
    }
}

/// Where and how to create a sprite, in game units.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteOptions {
    pub position: (f64, f64),
    pub anchor: (f64, f64),
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub visible: bool,
    pub tint: Option<Color>,
    pub alpha: f64,
    pub text: Option<String>,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            position: (0.0, 0.0),
            anchor: (0.0, 0.0),
            width: 1.0,
            height: 1.0,
            rotation: 0.0,
            visible: true,
            tint: None,
            alpha: 1.0,
            text: None,
        }
    }
}

impl SpriteOptions {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: (x, y),
            ..Self::default()
        }
    }

    pub fn anchor(mut self, x: f64, y: f64) -> Self {
        self.anchor = (x, y);
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        self.width *= factor;
        self.height *= factor;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn tint(mut self, color: Color) -> Self {
        self.tint = Some(color);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// The resources of one game.
#[derive(Debug)]
pub struct Resources {
    resources: &'static [Resource],
}

impl Resources {
    pub const fn new(resources: &'static [Resource]) -> Self {
        Self { resources }
    }

    pub fn get(&self, key: &str) -> Result<&Resource, SceneError> {
        self.resources
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| SceneError::UnknownResource(String::from(key)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Creates a sprite of the resource `key` on a layer of the scene.
    pub fn new_sprite(
        &self,
        scene: &mut Scene,
        layer: &str,
        key: &str,
        options: SpriteOptions,
    ) -> Result<SpriteId, SceneError> {
        let resource = *self.get(key)?;
        scene.add(layer, Sprite::new(resource, options))
    }
}
