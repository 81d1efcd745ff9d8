use std::path::Path;

use glam::{IVec2, UVec2};
use image::{Rgba, RgbaImage};

use crate::Color;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// An RGBA pixel buffer with a surface-wide opacity that is applied when it is blitted onto
/// another surface.
#[derive(Clone, Debug)]
pub struct Surface {
    pub(crate) pixels: RgbaImage,
    pub(crate) alpha: u8,
}

impl Surface {
    /// Create a fully transparent surface.
    pub fn new(size: UVec2) -> Self {
        Self {
            pixels: RgbaImage::new(size.x, size.y),
            alpha: u8::MAX,
        }
    }

    /// Create a surface of the given size filled with a single color.
    pub fn filled(size: UVec2, color: Color) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(size.x, size.y, color.into()),
            alpha: u8::MAX,
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            alpha: u8::MAX,
        }
    }

    /// Decode an image file into a surface.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SurfaceError> {
        let image = image::open(path.as_ref())?.to_rgba8();

        tracing::debug!(
            path = %path.as_ref().display(),
            width = image.width(),
            height = image.height(),
            "Loaded surface",
        );

        Ok(Self::from_image(image))
    }

    /// Encode the pixels to an image file. The format is picked from the extension. Surface
    /// opacity is not baked into the output.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SurfaceError> {
        self.pixels.save(path)?;
        Ok(())
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.pixels.width(), self.pixels.height())
    }

    #[inline]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Set the opacity used when this surface is blitted. 0 is invisible, 255 is opaque.
    #[inline]
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn pixel(&self, position: UVec2) -> Option<Color> {
        self.pixels
            .get_pixel_checked(position.x, position.y)
            .map(|p| Color::from(*p))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        let color: Rgba<u8> = color.into();
        self.pixels.pixels_mut().for_each(|p| *p = color);
    }

    /// Overwrite a rectangle with `color`, clipped to the surface.
    pub fn fill_rect(&mut self, position: IVec2, size: UVec2, color: Color) {
        let Some((min, max)) = clip(self.size(), position, size) else {
            return;
        };

        let color: Rgba<u8> = color.into();
        for y in min.y..max.y {
            for x in min.x..max.x {
                self.pixels.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Alpha blend `source` onto this surface with its top left corner at `position`. The
    /// source's surface opacity is multiplied into every source pixel.
    pub fn blit(&mut self, source: &Surface, position: IVec2) {
        if source.alpha == 0 {
            return;
        }

        let Some((min, max)) = clip(self.size(), position, source.size()) else {
            return;
        };

        let opacity = source.alpha as f32 / 255.0;

        for y in min.y..max.y {
            for x in min.x..max.x {
                let src = *source
                    .pixels
                    .get_pixel((x - position.x) as u32, (y - position.y) as u32);
                let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
                *dst = blend(src, *dst, opacity);
            }
        }
    }
}

/// Intersect the rectangle at `position` with `size` against a surface of `bounds`, returning the
/// covered `[min, max)` range in surface coordinates.
fn clip(bounds: UVec2, position: IVec2, size: UVec2) -> Option<(IVec2, IVec2)> {
    let min = position.max(IVec2::ZERO);
    let max = (position + size.as_ivec2()).min(bounds.as_ivec2());

    (min.x < max.x && min.y < max.y).then_some((min, max))
}

/// Porter-Duff "source over" on straight (non premultiplied) alpha.
fn blend(src: Rgba<u8>, dst: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let src_alpha = src[3] as f32 / 255.0 * opacity;
    if src_alpha <= 0.0 {
        return dst;
    }

    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);

    let channel = |i: usize| {
        let value =
            (src[i] as f32 * src_alpha + dst[i] as f32 * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
