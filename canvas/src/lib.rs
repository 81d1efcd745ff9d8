//! A software drawing surface used to render scenes and compose their transitions.

mod color;
mod surface;
mod transform;

pub use color::*;
pub use surface::*;
pub use transform::*;
