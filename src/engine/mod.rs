pub mod animation;
pub mod events;
pub mod math;
pub mod multi_animation;
pub mod scene;
pub mod scene_manager;
pub mod section;
pub mod transition;

pub mod prelude {
    pub use super::animation::*;
    pub use super::events::*;
    pub use super::multi_animation::*;
    pub use super::scene::*;
    pub use super::scene_manager::*;
    pub use super::section::*;
    pub use super::transition::*;
    pub use canvas::{Color, Surface};
    pub use glam::{IVec2, UVec2, Vec2};
}
