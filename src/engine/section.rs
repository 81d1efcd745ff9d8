use std::sync::Arc;

use glam::Vec2;

use super::{
    events::{EventSink, NotificationKind, ObjectId},
    transition::TransitionError,
};

/// Optional values a property has at the start and end of a [Section].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Endpoints<T> {
    /// Missing start values continue from wherever the transition currently is.
    pub start: Option<T>,
    /// Without an end value the property holds still for the whole section.
    pub end: Option<T>,
}

impl<T> Endpoints<T> {
    pub const fn new(start: Option<T>, end: Option<T>) -> Self {
        Self { start, end }
    }
}

/// One timed phase of a transition.
#[derive(Clone, Debug)]
pub struct Section {
    id: ObjectId,
    tag: Option<Arc<str>>,
    duration: f32,
    pub(crate) position: Endpoints<Vec2>,
    pub(crate) size: Endpoints<Vec2>,
    /// Degrees, counter-clockwise. Values past 360 describe more than one turn.
    pub(crate) angle: Endpoints<f32>,
    /// 0 is invisible, 255 is opaque.
    pub(crate) transparency: Endpoints<f32>,
    pub(crate) rotation_origin: Option<Vec2>,
}

impl Section {
    /// A section lasting `duration` seconds that leaves every property alone.
    pub fn new(duration: f32) -> Result<Self, TransitionError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(TransitionError::InvalidDuration(duration));
        }

        Ok(Self {
            id: ObjectId::next(),
            tag: None,
            duration,
            position: Endpoints::default(),
            size: Endpoints::default(),
            angle: Endpoints::default(),
            transparency: Endpoints::default(),
            rotation_origin: None,
        })
    }

    pub fn with_position(mut self, start: Option<Vec2>, end: Option<Vec2>) -> Self {
        self.position = Endpoints::new(start, end);
        self
    }

    pub fn with_start_position(mut self, start: Vec2) -> Self {
        self.position.start = Some(start);
        self
    }

    pub fn with_end_position(mut self, end: Vec2) -> Self {
        self.position.end = Some(end);
        self
    }

    pub fn with_size(mut self, start: Option<Vec2>, end: Option<Vec2>) -> Self {
        self.size = Endpoints::new(start, end);
        self
    }

    pub fn with_start_size(mut self, start: Vec2) -> Self {
        self.size.start = Some(start);
        self
    }

    pub fn with_end_size(mut self, end: Vec2) -> Self {
        self.size.end = Some(end);
        self
    }

    pub fn with_angle(mut self, start: Option<f32>, end: Option<f32>) -> Self {
        self.angle = Endpoints::new(start, end);
        self
    }

    pub fn with_start_angle(mut self, start: f32) -> Self {
        self.angle.start = Some(start);
        self
    }

    pub fn with_end_angle(mut self, end: f32) -> Self {
        self.angle.end = Some(end);
        self
    }

    pub fn with_transparency(mut self, start: Option<f32>, end: Option<f32>) -> Self {
        self.transparency = Endpoints::new(start, end);
        self
    }

    pub fn with_start_transparency(mut self, start: f32) -> Self {
        self.transparency.start = Some(start);
        self
    }

    pub fn with_end_transparency(mut self, end: f32) -> Self {
        self.transparency.end = Some(end);
        self
    }

    /// The point, relative to the scene's top left corner, that stays in place while rotating.
    /// Defaults to the middle of the current size.
    pub fn with_rotation_origin(mut self, origin: Vec2) -> Self {
        self.rotation_origin = Some(origin);
        self
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
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub(crate) fn on_start(&self, sink: &EventSink) {
        sink.notify(NotificationKind::SectionStart, self.id, self.tag.as_ref());
    }

    pub(crate) fn on_end(&self, sink: &EventSink) {
        sink.notify(NotificationKind::SectionEnd, self.id, self.tag.as_ref());
    }
}

/// Loose description of a section where every option, including the duration, may be left out.
/// Converting it into a [Section] checks that the required values are there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionSpec {
    pub duration: Option<f32>,
    pub start_position: Option<Vec2>,
    pub end_position: Option<Vec2>,
    pub start_size: Option<Vec2>,
    pub end_size: Option<Vec2>,
    pub start_angle: Option<f32>,
    pub end_angle: Option<f32>,
    pub rotation_origin: Option<Vec2>,
    pub start_transparency: Option<f32>,
    pub end_transparency: Option<f32>,
    pub tag: Option<String>,
}

impl SectionSpec {
    pub fn into_section(self, index: usize) -> Result<Section, TransitionError> {
        let duration = self
            .duration
            .ok_or(TransitionError::MissingDuration { index })?;

        let mut section = Section::new(duration)
            .map_err(|err| TransitionError::InvalidSection {
                index,
                source: Box::new(err),
            })?
            .with_position(self.start_position, self.end_position)
            .with_size(self.start_size, self.end_size)
            .with_angle(self.start_angle, self.end_angle)
            .with_transparency(self.start_transparency, self.end_transparency);

        if let Some(origin) = self.rotation_origin {
            section = section.with_rotation_origin(origin);
        }
        if let Some(tag) = self.tag {
            section = section.with_tag(tag);
        }

        Ok(section)
    }
}

impl TryFrom<SectionSpec> for Section {
    type Error = TransitionError;

    fn try_from(value: SectionSpec) -> Result<Self, Self::Error> {
        value.into_section(0)
    }
}
