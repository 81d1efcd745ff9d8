//! 2D helpers on top of [glam::Vec2] used by the transition engine.
//!
//! Component wise add/sub/mul/div come straight from glam's operators.

use glam::Vec2;

/// Round both components to `decimals` decimal places.
#[inline]
pub fn round_to(v: Vec2, decimals: i32) -> Vec2 {
    let scale = 10f32.powi(decimals);
    (v * scale).round() / scale
}

/// Per second change needed to go from `start` to `end` in `duration` seconds.
#[inline]
pub fn change_rate(start: f32, end: f32, duration: f32) -> f32 {
    (end - start) / duration
}

#[inline]
pub fn change_rate_vec(start: Vec2, end: Vec2, duration: f32) -> Vec2 {
    (end - start) / Vec2::splat(duration)
}

/// Wrap an angle into `[0, 360)`.
#[inline]
pub fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round tiny negative values up to exactly 360.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Offset to subtract from a blit position so that `origin` (in the unrotated `size`) stays in
/// the same relative place after the surface grew to `rotated_size`.
pub fn pivot_offset(origin: Vec2, size: Vec2, rotated_size: Vec2) -> Vec2 {
    let fraction = Vec2::new(
        if size.x != 0.0 { origin.x / size.x } else { 0.5 },
        if size.y != 0.0 { origin.y / size.y } else { 0.5 },
    );

    (rotated_size - size) * fraction
}
