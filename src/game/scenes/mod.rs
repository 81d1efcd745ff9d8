use std::path::{Path, PathBuf};

use reel::engine::prelude::*;

mod gallery;
mod title;

pub use gallery::GalleryScene;
pub use title::TitleScene;

/// All PNG files in `dir`, sorted by name so numbered frames play in order.
pub fn frame_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect::<Vec<_>>();
    paths.sort();

    tracing::debug!(dir = %dir.display(), count = paths.len(), "Found sprite frames");

    Ok(paths)
}

/// Square frames of `size` pixels, one per color. Each frame insets its square a little more so
/// the sprite appears to shrink.
fn square_frames(size: u32, colors: &[Color]) -> Vec<Surface> {
    colors
        .iter()
        .enumerate()
        .map(|(index, color)| {
            let inset = (index as u32 * 2).min(size / 2);
            let mut frame = Surface::new(UVec2::splat(size));
            frame.fill_rect(
                IVec2::splat(inset as i32),
                UVec2::splat(size - inset * 2),
                *color,
            );
            frame
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_frames_shrink() {
        let frames = square_frames(8, &[Color::RED, Color::GREEN]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].pixel(UVec2::ZERO), Some(Color::RED));
        assert_eq!(frames[1].pixel(UVec2::ZERO), Some(Color::TRANSPARENT));
        assert_eq!(frames[1].pixel(UVec2::new(2, 2)), Some(Color::GREEN));
    }
}
