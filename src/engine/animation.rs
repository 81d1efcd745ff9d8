use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use canvas::{Surface, SurfaceError};
use glam::IVec2;

use super::events::{EventSink, NotificationKind, ObjectId};

#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    #[error("Could not load animation frame {index} ({source})")]
    InvalidFrame {
        index: usize,
        #[source]
        source: SurfaceError,
    },

    #[error("Invalid frame rate ({0})")]
    InvalidFrameRate(f32),

    #[error("Animation has no frames")]
    Empty,

    #[error("Animation not found: {0}")]
    NotFound(String),
}

const INFINITE_LOOPS: i32 = -1;

/// A single update skipping more passes than this posts only this many loop notifications.
const MAX_LOOP_NOTIFICATIONS: u64 = 1024;

/// Where a frame comes from when building an [AnimationSequence].
#[derive(Clone, Debug)]
pub enum FrameSource {
    Surface(Arc<Surface>),
    Path(PathBuf),
}

impl FrameSource {
    fn resolve(self, index: usize) -> Result<Arc<Surface>, AnimationError> {
        match self {
            FrameSource::Surface(surface) => Ok(surface),
            FrameSource::Path(path) => Surface::load(&path)
                .map(Arc::new)
                .map_err(|source| AnimationError::InvalidFrame { index, source }),
        }
    }
}

impl From<Arc<Surface>> for FrameSource {
    fn from(value: Arc<Surface>) -> Self {
        Self::Surface(value)
    }
}

impl From<Surface> for FrameSource {
    fn from(value: Surface) -> Self {
        Self::Surface(Arc::new(value))
    }
}

impl From<PathBuf> for FrameSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for FrameSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<&str> for FrameSource {
    fn from(value: &str) -> Self {
        Self::Path(PathBuf::from(value))
    }
}

/// Plays a list of frames at a fixed frame rate.
///
/// Posts [NotificationKind::AnimationLoop] every time playback wraps around and
/// [NotificationKind::AnimationEnd] once when a non looping sequence reaches its last frame.
#[derive(Debug)]
pub struct AnimationSequence {
    id: ObjectId,
    tag: Option<Arc<str>>,
    sink: EventSink,

    frames: Vec<Arc<Surface>>,
    frame_index: usize,

    frame_period: f32,
    /// Time left before the next frame. Goes negative while catching up on several frames.
    countdown: f32,

    looping: bool,
    /// Number of extra passes configured, -1 for infinite.
    loop_count: i32,
    remaining_loops: i32,

    paused: bool,
    finished: bool,
}

impl AnimationSequence {
    /// Create a looping sequence playing `framerate` frames per second.
    pub fn new<I>(frames: I, framerate: f32, sink: EventSink) -> Result<Self, AnimationError>
    where
        I: IntoIterator,
        I::Item: Into<FrameSource>,
    {
        let frame_period = Self::period_from_framerate(framerate)?;

        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(index, frame)| frame.into().resolve(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: ObjectId::next(),
            tag: None,
            sink,
            frames,
            frame_index: 0,
            frame_period,
            countdown: frame_period,
            looping: true,
            loop_count: INFINITE_LOOPS,
            remaining_loops: INFINITE_LOOPS,
            paused: false,
            finished: false,
        })
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Number of times the sequence wraps around before it finishes, -1 for infinite. Other
    /// negative counts are treated as -1. Only has an effect while looping.
    pub fn with_loop_count(mut self, loop_count: i32) -> Self {
        let loop_count = loop_count.max(INFINITE_LOOPS);
        self.loop_count = loop_count;
        self.remaining_loops = loop_count;
        self
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
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
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn remaining_loops(&self) -> i32 {
        self.remaining_loops
    }

    /// Pause at the current frame.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    #[inline]
    pub fn framerate(&self) -> f32 {
        1.0 / self.frame_period
    }

    pub fn set_framerate(&mut self, framerate: f32) -> Result<(), AnimationError> {
        self.frame_period = Self::period_from_framerate(framerate)?;
        Ok(())
    }

    /// Seconds each frame stays on screen.
    #[inline]
    pub fn frame_period(&self) -> f32 {
        self.frame_period
    }

    pub fn set_frame_period(&mut self, frame_period: f32) -> Result<(), AnimationError> {
        if !frame_period.is_finite() || frame_period <= 0.0 {
            return Err(AnimationError::InvalidFrameRate(1.0 / frame_period));
        }
        self.frame_period = frame_period;
        Ok(())
    }

    /// Advance playback by `delta_time` seconds. Large steps skip as many frames as they cover.
    pub fn update(&mut self, delta_time: f32) {
        if self.paused || self.finished || self.frames.is_empty() {
            return;
        }

        // `max` also turns a NaN step into 0.
        self.countdown -= delta_time.max(0.0);
        if self.countdown > 0.0 {
            return;
        }

        let overdue = -f64::from(self.countdown);
        let period = f64::from(self.frame_period);
        let steps = (overdue / period).floor() + 1.0;
        // Rounding must never leave the countdown at or below zero.
        self.countdown = ((steps * period - overdue) as f32).max(f32::MIN_POSITIVE);

        self.advance(steps as u64);
    }

    /// Move `steps` frames forward, wrapping or finishing at the last frame.
    fn advance(&mut self, mut steps: u64) {
        let last = self.frames.len() as u64 - 1;
        let pass = last + 1;

        while steps > 0 {
            let index = self.frame_index as u64;
            if steps <= last - index {
                self.frame_index = (index + steps) as usize;
                return;
            }
            steps -= pass - index;

            if !self.looping || self.remaining_loops == 0 {
                self.frame_index = last as usize;
                self.finished = true;
                tracing::debug!(animation = %self.id, tag = ?self.tag, "Animation finished");
                self.sink
                    .notify(NotificationKind::AnimationEnd, self.id, self.tag.as_ref());
                return;
            }
            self.wrap(1);

            // Whole passes are skipped at once.
            let mut passes = steps / pass;
            if self.remaining_loops > 0 {
                passes = passes.min(self.remaining_loops as u64);
            }
            if passes > 0 {
                steps -= passes * pass;
                self.wrap(passes);
            }
        }
    }

    /// Go back to the first frame after `passes` complete passes. `passes` never exceeds a
    /// positive `remaining_loops`.
    fn wrap(&mut self, passes: u64) {
        self.frame_index = 0;
        if self.remaining_loops > 0 {
            self.remaining_loops -= passes as i32;
        }

        tracing::trace!(
            animation = %self.id,
            passes,
            remaining = self.remaining_loops,
            "Animation looped",
        );
        for _ in 0..passes.min(MAX_LOOP_NOTIFICATIONS) {
            self.sink
                .notify(NotificationKind::AnimationLoop, self.id, self.tag.as_ref());
        }
    }

    /// Restart from the first frame with the configured loop count. Leaves the paused state
    /// alone.
    pub fn replay(&mut self) {
        self.frame_index = 0;
        self.countdown = self.frame_period;
        self.remaining_loops = self.loop_count;
        self.finished = false;
    }

    /// The image for the current frame.
    pub fn get_frame(&self) -> Result<&Arc<Surface>, AnimationError> {
        self.frames
            .get(self.frame_index)
            .ok_or(AnimationError::Empty)
    }

    /// Blit the current frame with its top left corner at `position`.
    pub fn draw(&self, surface: &mut Surface, position: IVec2) {
        if let Ok(frame) = self.get_frame() {
            surface.blit(frame, position);
        }
    }

    fn period_from_framerate(framerate: f32) -> Result<f32, AnimationError> {
        if !framerate.is_finite() || framerate <= 0.0 {
            return Err(AnimationError::InvalidFrameRate(framerate));
        }
        Ok(1.0 / framerate)
    }
}
