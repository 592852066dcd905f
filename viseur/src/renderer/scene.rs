use crate::renderer::resources::{Resource, SpriteOptions};
use crate::{Color, SceneError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(usize);

/// A drawable instance of a [`Resource`], positioned in game units.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub resource: Resource,
    pub position: (f64, f64),
    /// Which point of the sprite sits at `position`, as fractions of its
    /// size.
    pub anchor: (f64, f64),
    pub width: f64,
    pub height: f64,
    /// Radians, clockwise.
    pub rotation: f64,
    pub visible: bool,
    pub tint: Option<Color>,
    pub alpha: f64,
    pub text: Option<String>,
}

impl Sprite {
    pub fn new(resource: Resource, options: SpriteOptions) -> Self {
        Self {
            resource,
            position: options.position,
            anchor: options.anchor,
            width: options.width,
            height: options.height,
            rotation: options.rotation,
            visible: options.visible,
            tint: options.tint,
            alpha: options.alpha,
            text: options.text,
        }
    }

    /// The color to paint the sprite with.
    pub fn color(&self) -> Color {
        self.tint.unwrap_or(self.resource.fill)
    }

    pub fn glyph(&self) -> char {
        self.resource.glyph_for(self.rotation)
    }

    /// Left, top, right and bottom edges in game units.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let left = self.position.0 - self.anchor.0 * self.width;
        let top = self.position.1 - self.anchor.1 * self.height;
        (left, top, left + self.width, top + self.height)
    }

    pub fn center(&self) -> (f64, f64) {
        let (left, top, right, bottom) = self.bounds();
        ((left + right) / 2.0, (top + bottom) / 2.0)
    }
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub name: &'static str,
    sprites: Vec<SpriteId>,
}

impl Layer {
    pub fn sprites(&self) -> &[SpriteId] {
        &self.sprites
    }
}

/// All sprites of a game, grouped into layers that are drawn in order.
#[derive(Clone, Debug)]
pub struct Scene {
    layers: Vec<Layer>,
    sprites: Vec<Sprite>,
}

impl Scene {
    pub fn new(layer_order: &[&'static str]) -> Self {
        Self {
            layers: layer_order
                .iter()
                .map(|&name| Layer {
                    name,
                    sprites: Vec::new(),
                })
                .collect(),
            sprites: Vec::new(),
        }
    }

    pub fn add(&mut self, layer: &str, sprite: Sprite) -> Result<SpriteId, SceneError> {
        let id = SpriteId(self.sprites.len());
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.name == layer)
            .ok_or_else(|| SceneError::UnknownLayer(String::from(layer)))?;
        layer.sprites.push(id);
        self.sprites.push(sprite);
        Ok(id)
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.get(id.0)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.get_mut(id.0)
    }

    pub fn set_position(&mut self, id: SpriteId, x: f64, y: f64) {
        if let Some(sprite) = self.get_mut(id) {
            sprite.position = (x, y);
        }
    }

    pub fn set_visible(&mut self, id: SpriteId, visible: bool) {
        if let Some(sprite) = self.get_mut(id) {
            sprite.visible = visible;
        }
    }

    pub fn set_tint(&mut self, id: SpriteId, tint: Color) {
        if let Some(sprite) = self.get_mut(id) {
            sprite.tint = Some(tint);
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Visible sprites, back to front.
    pub fn draw_order(&self) -> impl Iterator<Item = &Sprite> {
        self.layers
            .iter()
            .flat_map(|layer| layer.sprites.iter())
            .filter_map(|id| self.sprites.get(id.0))
            .filter(|sprite| sprite.visible && sprite.alpha > 0.0)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Removes every sprite but keeps the layers.
    pub fn clear(&mut self) {
        self.sprites.clear();
        for layer in &mut self.layers {
            layer.sprites.clear();
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new(&["background", "game", "ui"])
    }
}
