use reel::engine::prelude::*;

use super::square_frames;

const SPRITE_SIZE: u32 = 32;

/// A pulsing sprite in the middle of the screen. Space makes it blink a few times.
pub struct TitleScene {
    background: Color,
    sprite: MultiAnimation,
    position: IVec2,
}

impl TitleScene {
    pub fn new(screen_size: UVec2, sink: EventSink) -> Result<Self, AnimationError> {
        let pulse = AnimationSequence::new(
            square_frames(
                SPRITE_SIZE,
                &[
                    Color::RED,
                    Color::from_rgb(255, 128, 0),
                    Color::from_rgb(255, 255, 0),
                    Color::from_rgb(255, 128, 0),
                ],
            ),
            6.0,
            sink.clone(),
        )?
        .with_tag("pulse");

        let blink = AnimationSequence::new(
            square_frames(SPRITE_SIZE, &[Color::WHITE, Color::TRANSPARENT]),
            4.0,
            sink,
        )?
        .with_tag("blink")
        .with_loop_count(3);

        let sprite = MultiAnimation::new([("pulse", pulse), ("blink", blink)], Some("pulse"))?;

        let position = (screen_size.as_ivec2() - IVec2::splat(SPRITE_SIZE as i32)) / 2;

        Ok(Self {
            background: Color::from_rgb(24, 24, 48),
            sprite,
            position,
        })
    }

    fn play(&mut self, key: &str) {
        if let Err(err) = self.sprite.switch(key) {
            tracing::warn!("Could not switch title animation: {err}");
            return;
        }
        if let Some(animation) = self.sprite.active_mut() {
            animation.replay();
        }
    }
}

impl Scene for TitleScene {
    fn handle_event(&mut self, event: &SceneEvent) {
        match event {
            SceneEvent::KeyDown { key: Key::Space } => {
                let next = if self.sprite.active_key() == Some("blink") {
                    "pulse"
                } else {
                    "blink"
                };
                self.play(next);
            }

            SceneEvent::Notification(notification)
                if notification.is(NotificationKind::AnimationEnd)
                    && notification.tag.as_deref() == Some("blink") =>
            {
                self.play("pulse");
            }

            _ => {}
        }
    }

    fn update(&mut self, delta_time: f32) {
        self.sprite.update(delta_time);
    }

    fn draw(&mut self, surface: &mut Surface) {
        surface.fill(self.background);
        self.sprite.draw(surface, self.position);
    }
}
