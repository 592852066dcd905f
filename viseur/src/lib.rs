pub use color::*;
pub use config::*;
pub use easing::Easing;
pub use errors::*;
pub use events::*;
pub use gamelog::*;
pub use gui::Side;
pub use history::{StateHistory, ViseurGameState};
pub use renderer::{Renderer, Scene};
pub use settings::*;
pub use time_manager::*;
pub use timer::*;
pub use viseur::*;

#[cfg(test)]
mod arbitrary;
mod color;
mod config;
pub mod easing;
mod errors;
mod events;
pub mod game;
mod gamelog;
pub mod games;
pub mod gui;
pub mod history;
pub mod renderer;
mod settings;
mod time_manager;
mod timer;
pub mod utils;
mod viseur;
