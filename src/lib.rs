//! Sprite animation playback and animated scene transitions, composed onto [canvas::Surface]s.

pub mod engine;
