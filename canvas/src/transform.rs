use glam::{UVec2, Vec2};
use image::{RgbaImage, imageops};

use crate::Surface;

/// Size of the axis aligned box that contains a `size` rectangle rotated by `degrees`.
pub fn rotated_bounds(size: UVec2, degrees: f32) -> UVec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let size = size.as_vec2();

    let bounds = Vec2::new(
        size.x * cos + size.y * sin,
        size.x * sin + size.y * cos,
    );

    // Trim float noise so quarter turns do not grow by a pixel.
    (bounds - 1e-3).ceil().max(Vec2::ZERO).as_uvec2()
}

impl Surface {
    /// Return a copy resized to `size` with nearest neighbour sampling.
    pub fn scaled(&self, size: UVec2) -> Surface {
        let pixels = if size == self.size() {
            self.pixels.clone()
        } else if size.x == 0 || size.y == 0 || self.pixels.width() == 0 || self.pixels.height() == 0
        {
            RgbaImage::new(size.x, size.y)
        } else {
            imageops::resize(&self.pixels, size.x, size.y, imageops::FilterType::Nearest)
        };

        Surface {
            pixels,
            alpha: self.alpha,
        }
    }

    /// Return a copy rotated counter-clockwise by `degrees`. The result grows to the bounding
    /// box of the rotated pixels; uncovered corners are transparent.
    pub fn rotated(&self, degrees: f32) -> Surface {
        let mut degrees = degrees.rem_euclid(360.0);
        if degrees >= 360.0 {
            degrees = 0.0;
        }

        let pixels = if degrees == 0.0 {
            self.pixels.clone()
        } else if degrees == 90.0 {
            imageops::rotate270(&self.pixels)
        } else if degrees == 180.0 {
            imageops::rotate180(&self.pixels)
        } else if degrees == 270.0 {
            imageops::rotate90(&self.pixels)
        } else {
            rotate_nearest(&self.pixels, degrees)
        };

        Surface {
            pixels,
            alpha: self.alpha,
        }
    }
}

fn rotate_nearest(source: &RgbaImage, degrees: f32) -> RgbaImage {
    let source_size = UVec2::new(source.width(), source.height());
    let size = rotated_bounds(source_size, degrees);

    let (sin, cos) = degrees.to_radians().sin_cos();
    let source_size = source_size.as_vec2();
    let source_center = source_size * 0.5;
    let center = size.as_vec2() * 0.5;

    let mut result = RgbaImage::new(size.x, size.y);

    for (x, y, pixel) in result.enumerate_pixels_mut() {
        let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
        // Inverse of a counter-clockwise turn in y-down image space.
        let s = Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos) + source_center;

        if s.x >= 0.0 && s.y >= 0.0 && s.x < source_size.x && s.y < source_size.y {
            *pixel = *source.get_pixel(s.x as u32, s.y as u32);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;
    use crate::Color;

    #[test]
    fn bounds_for_quarter_turns() {
        let size = UVec2::new(40, 10);
        assert_eq!(rotated_bounds(size, 0.0), size);
        assert_eq!(rotated_bounds(size, 90.0), UVec2::new(10, 40));
        assert_eq!(rotated_bounds(size, 180.0), size);
        assert_eq!(rotated_bounds(size, 270.0), UVec2::new(10, 40));
        assert_eq!(rotated_bounds(size, 360.0), size);
    }

    #[test]
    fn bounds_grow_at_45_degrees() {
        let bounds = rotated_bounds(UVec2::new(10, 10), 45.0);
        // 10 * sqrt(2) = 14.14
        assert_eq!(bounds, UVec2::new(15, 15));
    }

    #[test]
    fn scale_changes_size_and_keeps_alpha() {
        let surface = Surface::filled(UVec2::new(2, 2), Color::RED).with_alpha(7);
        let scaled = surface.scaled(UVec2::new(6, 4));
        assert_eq!(scaled.size(), UVec2::new(6, 4));
        assert_eq!(scaled.alpha(), 7);
        assert_eq!(scaled.pixel(UVec2::new(5, 3)), Some(Color::RED));
    }

    #[test]
    fn scale_to_zero_is_empty() {
        let surface = Surface::filled(UVec2::new(2, 2), Color::RED);
        let scaled = surface.scaled(UVec2::new(0, 4));
        assert_eq!(scaled.size(), UVec2::new(0, 4));
    }

    #[test]
    fn rotate_quarter_turn_is_counter_clockwise() {
        // Red on the right half of a 2x1 surface.
        let mut surface = Surface::new(UVec2::new(2, 1));
        surface.fill_rect(IVec2::new(1, 0), UVec2::ONE, Color::RED);

        let rotated = surface.rotated(90.0);
        assert_eq!(rotated.size(), UVec2::new(1, 2));
        // The right side ends up on top.
        assert_eq!(rotated.pixel(UVec2::new(0, 0)), Some(Color::RED));
        assert_eq!(rotated.pixel(UVec2::new(0, 1)), Some(Color::TRANSPARENT));
    }

    #[test]
    fn rotate_wraps_angles() {
        let surface = Surface::filled(UVec2::new(3, 1), Color::BLUE);
        assert_eq!(surface.rotated(450.0).size(), UVec2::new(1, 3));
        assert_eq!(surface.rotated(-90.0).size(), UVec2::new(1, 3));
        assert_eq!(surface.rotated(720.0).size(), UVec2::new(3, 1));
    }

    #[test]
    fn rotate_arbitrary_angle_keeps_center() {
        let surface = Surface::filled(UVec2::new(8, 8), Color::GREEN);
        let rotated = surface.rotated(30.0);

        let size = rotated.size();
        assert!(size.x > 8 && size.y > 8);
        assert_eq!(rotated.pixel(size / 2), Some(Color::GREEN));
        // The corners of the grown box are outside the rotated square.
        assert_eq!(rotated.pixel(UVec2::ZERO), Some(Color::TRANSPARENT));
    }
}
