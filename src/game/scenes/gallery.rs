use reel::engine::prelude::*;

use super::square_frames;

/// A sprite bouncing from side to side over a striped floor.
pub struct GalleryScene {
    screen_size: Vec2,
    sprite: AnimationSequence,
    position: Vec2,
    velocity: Vec2,
}

impl GalleryScene {
    /// Plays `frames` if there are any, otherwise a generated sprite.
    pub fn new(
        screen_size: UVec2,
        frames: Vec<FrameSource>,
        sink: EventSink,
    ) -> Result<Self, AnimationError> {
        let sprite = if frames.is_empty() {
            AnimationSequence::new(
                square_frames(24, &[Color::GREEN, Color::from_rgb(0, 192, 128), Color::BLUE]),
                8.0,
                sink,
            )?
        } else {
            AnimationSequence::new(frames, 12.0, sink)?
        };
        let sprite = sprite.with_tag("gallery");

        let screen_size = screen_size.as_vec2();

        Ok(Self {
            screen_size,
            sprite,
            position: Vec2::new(0.0, screen_size.y * 0.5),
            velocity: Vec2::new(screen_size.x * 0.5, 0.0),
        })
    }

    fn sprite_size(&self) -> Vec2 {
        self.sprite
            .get_frame()
            .map(|frame| frame.size().as_vec2())
            .unwrap_or(Vec2::ZERO)
    }
}

impl Scene for GalleryScene {
    fn update(&mut self, delta_time: f32) {
        self.sprite.update(delta_time);

        let max_x = (self.screen_size.x - self.sprite_size().x).max(0.0);
        self.position += self.velocity * delta_time;
        if self.position.x < 0.0 || self.position.x > max_x {
            self.position.x = self.position.x.clamp(0.0, max_x);
            self.velocity.x = -self.velocity.x;
        }
    }

    fn draw(&mut self, surface: &mut Surface) {
        surface.fill(Color::from_rgb(16, 48, 32));

        let floor = (self.screen_size.y * 0.75) as i32;
        let stripe = UVec2::new(self.screen_size.x as u32, 4);
        for row in 0..4 {
            surface.fill_rect(
                IVec2::new(0, floor + row * 12),
                stripe,
                Color::from_rgb(32, 96, 64),
            );
        }

        self.sprite
            .draw(surface, self.position.round().as_ivec2());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_bounces_off_the_edges() {
        let mut scene =
            GalleryScene::new(UVec2::new(100, 50), vec![], EventSink::disconnected()).unwrap();

        // 50 pixels per second, 76 pixels of room.
        scene.update(2.0);
        assert_eq!(scene.position.x, 76.0);
        assert!(scene.velocity.x < 0.0);

        scene.update(1.0);
        assert_eq!(scene.position.x, 26.0);
    }
}
