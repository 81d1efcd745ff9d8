use std::sync::Arc;

use canvas::Surface;
use glam::Vec2;

use super::{
    events::{EventSink, NotificationKind, ObjectId},
    math::{change_rate, change_rate_vec, pivot_offset, wrap_degrees},
    scene::{Scene, SceneHandle},
    section::{Section, SectionSpec},
};

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("A transition needs at least one section")]
    NoSections,

    #[error("Section duration must be a positive number of seconds ({0})")]
    InvalidDuration(f32),

    #[error("Section {index} is missing a duration")]
    MissingDuration { index: usize },

    #[error("Section {index} is invalid ({source})")]
    InvalidSection {
        index: usize,
        #[source]
        source: Box<TransitionError>,
    },
}

/// Whether a transition brings a scene onto the screen or takes it off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TransitionKind {
    Enter,
    Exit,
}

/// The direction a scene moves in during a slide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SlideDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SlideDirection {
    fn unit(self) -> Vec2 {
        match self {
            SlideDirection::Up => Vec2::NEG_Y,
            SlideDirection::Down => Vec2::Y,
            SlideDirection::Left => Vec2::NEG_X,
            SlideDirection::Right => Vec2::X,
        }
    }
}

/// Per second change of each property in the active section. `None` holds the property still.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ChangeRates {
    position: Option<Vec2>,
    size: Option<Vec2>,
    angle: Option<f32>,
    transparency: Option<f32>,
}

const OPAQUE: f32 = 255.0;

/// Animates the position, size, rotation and transparency of a scene through a list of
/// [Section]s, then composes the scene onto a surface with those values applied.
#[derive(Debug)]
pub struct Transition {
    id: ObjectId,
    tag: Option<Arc<str>>,
    sink: EventSink,

    sections: Vec<Section>,
    active_index: usize,
    /// Seconds left in the active section.
    remaining: f32,

    scene_size: Vec2,

    position: Vec2,
    size: Vec2,
    /// Degrees in `[0, 360)`.
    angle: f32,
    transparency: f32,
    rotation_origin: Option<Vec2>,
    rates: ChangeRates,

    target: Option<SceneHandle>,
    running: bool,
}

impl Transition {
    pub fn new(sections: Vec<Section>, sink: EventSink) -> Result<Self, TransitionError> {
        if sections.is_empty() {
            return Err(TransitionError::NoSections);
        }

        Ok(Self {
            id: ObjectId::next(),
            tag: None,
            sink,
            sections,
            active_index: 0,
            remaining: 0.0,
            scene_size: Vec2::ZERO,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            angle: 0.0,
            transparency: OPAQUE,
            rotation_origin: None,
            rates: ChangeRates::default(),
            target: None,
            running: false,
        })
    }

    /// Build a transition from loosely specified sections, failing on the first invalid one.
    pub fn from_specs(
        specs: impl IntoIterator<Item = SectionSpec>,
        sink: EventSink,
    ) -> Result<Self, TransitionError> {
        let sections = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| spec.into_section(index))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(sections, sink)
    }

    /// Move a whole screen in or out of view along `direction`.
    pub fn slide(
        direction: SlideDirection,
        kind: TransitionKind,
        screen_size: Vec2,
        duration: f32,
        sink: EventSink,
    ) -> Result<Self, TransitionError> {
        let offset = direction.unit() * screen_size;
        let (start, end) = match kind {
            TransitionKind::Enter => (-offset, Vec2::ZERO),
            TransitionKind::Exit => (Vec2::ZERO, offset),
        };

        let section = Section::new(duration)?.with_position(Some(start), Some(end));
        Self::new(vec![section], sink)
    }

    /// Slide a scene in from above the screen.
    pub fn linear_slide_down_enter(
        screen_size: Vec2,
        duration: f32,
        sink: EventSink,
    ) -> Result<Self, TransitionError> {
        Self::slide(
            SlideDirection::Down,
            TransitionKind::Enter,
            screen_size,
            duration,
            sink,
        )
    }

    /// Slide a scene out through the bottom of the screen.
    pub fn linear_slide_down_exit(
        screen_size: Vec2,
        duration: f32,
        sink: EventSink,
    ) -> Result<Self, TransitionError> {
        Self::slide(
            SlideDirection::Down,
            TransitionKind::Exit,
            screen_size,
            duration,
            sink,
        )
    }

    /// Fade from invisible to opaque when entering, the other way around when exiting.
    pub fn fade(kind: TransitionKind, duration: f32, sink: EventSink) -> Result<Self, TransitionError> {
        let (start, end) = match kind {
            TransitionKind::Enter => (0.0, OPAQUE),
            TransitionKind::Exit => (OPAQUE, 0.0),
        };

        let section = Section::new(duration)?.with_transparency(Some(start), Some(end));
        Self::new(vec![section], sink)
    }

    pub fn with_tag(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The scene this transition is currently bound to.
    #[inline]
    pub fn target(&self) -> Option<SceneHandle> {
        self.target
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[inline]
    pub fn active_section_index(&self) -> usize {
        self.active_index
    }

    /// Seconds left in the active section.
    #[inline]
    pub fn remaining_in_section(&self) -> f32 {
        self.remaining
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[inline]
    pub fn transparency(&self) -> f32 {
        self.transparency
    }

    /// Bind the transition to `scene` and start from the first section. A running transition is
    /// restarted.
    pub fn start(&mut self, scene: SceneHandle, scene_size: Vec2) {
        if self.running {
            tracing::debug!(transition = %self.id, "Restarting running transition");
        }

        self.scene_size = scene_size;
        self.reset();
        self.target = Some(scene);
        self.running = true;

        tracing::debug!(
            transition = %self.id,
            tag = ?self.tag,
            sections = self.sections.len(),
            "Starting transition",
        );

        self.enter_section();
    }

    /// Advance by `delta_time` seconds. Time left over when a section runs out is carried into
    /// the following sections; whatever is left after the last section is dropped.
    pub fn update(&mut self, delta_time: f32) {
        if !self.running {
            return;
        }

        let mut unconsumed = delta_time.max(0.0);

        loop {
            let section_time = unconsumed.min(self.remaining);
            self.remaining -= unconsumed;
            self.advance_values(section_time);
            unconsumed -= section_time;

            if self.remaining > 0.0 {
                break;
            }

            self.sections[self.active_index].on_end(&self.sink);

            if self.active_index + 1 >= self.sections.len() {
                self.finish();
                break;
            }

            self.active_index += 1;
            self.enter_section();
        }
    }

    /// Stop a running transition immediately and reset it. Does nothing if it is not running.
    pub fn terminate(&mut self) {
        if !self.running {
            return;
        }

        self.reset();

        tracing::debug!(transition = %self.id, "Transition terminated");
        self.sink
            .notify(NotificationKind::TransitionEnd, self.id, self.tag.as_ref());
    }

    /// Render `scene`, which must be the scene this transition is bound to, and compose it onto
    /// `target`. Does nothing while unbound.
    pub fn draw(&self, scene: &mut dyn Scene, target: &mut Surface) {
        if self.target.is_none() {
            return;
        }

        let mut rendered = Surface::new(self.scene_size.round().max(Vec2::ZERO).as_uvec2());
        scene.draw(&mut rendered);

        self.compose(&rendered, target);
    }

    /// Apply the current size, angle and transparency to an already rendered scene and blit it
    /// onto `target` at the current position.
    pub fn compose(&self, rendered: &Surface, target: &mut Surface) {
        let scaled = rendered.scaled(self.size.round().max(Vec2::ZERO).as_uvec2());
        let mut rotated = scaled.rotated(self.angle);

        let scaled_size = scaled.size().as_vec2();
        let origin = self.rotation_origin.unwrap_or(scaled_size * 0.5);
        let offset = pivot_offset(origin, scaled_size, rotated.size().as_vec2());

        rotated.set_alpha(self.transparency.round().clamp(0.0, OPAQUE) as u8);

        target.blit(&rotated, (self.position - offset).round().as_ivec2());
    }

    fn reset(&mut self) {
        self.active_index = 0;
        self.remaining = 0.0;
        self.position = Vec2::ZERO;
        self.size = self.scene_size;
        self.angle = 0.0;
        self.transparency = OPAQUE;
        self.rotation_origin = None;
        self.rates = ChangeRates::default();
        self.target = None;
        self.running = false;
    }

    /// Resolve the start values of the active section and work out how fast each property has
    /// to change to hit its end value in time.
    fn enter_section(&mut self) {
        let section = &self.sections[self.active_index];
        let duration = section.duration();

        self.remaining = duration;

        let position = section.position.start.unwrap_or(self.position);
        self.position = position;
        self.rates.position = section
            .position
            .end
            .map(|end| change_rate_vec(position, end, duration));

        let size = section.size.start.unwrap_or(self.size);
        self.size = size;
        self.rates.size = section
            .size
            .end
            .map(|end| change_rate_vec(size, end, duration));

        let angle = section.angle.start.unwrap_or(self.angle);
        self.angle = angle;
        self.rates.angle = section
            .angle
            .end
            .map(|end| change_rate(angle, end, duration));

        let transparency = section.transparency.start.unwrap_or(self.transparency);
        self.transparency = transparency;
        self.rates.transparency = section
            .transparency
            .end
            .map(|end| change_rate(transparency, end, duration));

        self.rotation_origin = section.rotation_origin;

        tracing::debug!(
            transition = %self.id,
            section = self.active_index,
            duration,
            "Entering transition section",
        );

        section.on_start(&self.sink);
    }

    fn advance_values(&mut self, time: f32) {
        if let Some(rate) = self.rates.position {
            self.position += rate * time;
        }
        if let Some(rate) = self.rates.size {
            self.size += rate * time;
        }
        if let Some(rate) = self.rates.angle {
            self.angle = wrap_degrees(self.angle + rate * time);
        }
        if let Some(rate) = self.rates.transparency {
            self.transparency += rate * time;
        }
    }

    fn finish(&mut self) {
        self.remaining = 0.0;
        self.rates = ChangeRates::default();
        self.target = None;
        self.running = false;

        tracing::debug!(transition = %self.id, tag = ?self.tag, "Transition finished");
        self.sink
            .notify(NotificationKind::TransitionEnd, self.id, self.tag.as_ref());
    }
}
