use std::sync::Arc;

use canvas::Surface;
use glam::IVec2;

use super::animation::{AnimationError, AnimationSequence};

/// A set of named [AnimationSequence]s of which one plays at a time, e.g. "idle" and "walk" for a
/// single sprite.
#[derive(Debug, Default)]
pub struct MultiAnimation {
    // Kept in insertion order, the first entry is the default.
    animations: Vec<(String, AnimationSequence)>,
    active: Option<String>,
}

impl MultiAnimation {
    pub fn new<K>(
        animations: impl IntoIterator<Item = (K, AnimationSequence)>,
        start: Option<&str>,
    ) -> Result<Self, AnimationError>
    where
        K: Into<String>,
    {
        let mut result = Self::default();
        for (key, animation) in animations {
            result.add(key, animation);
        }

        if let Some(start) = start {
            result.switch(start)?;
        }

        Ok(result)
    }

    /// Add an animation. An existing animation with the same key is replaced in place.
    pub fn add(&mut self, key: impl Into<String>, animation: AnimationSequence) {
        let key = key.into();
        match self.position(&key) {
            Some(index) => self.animations[index].1 = animation,
            None => self.animations.push((key, animation)),
        }
    }

    /// Remove and return an animation. Removing the active animation clears the active key.
    pub fn remove(&mut self, key: &str) -> Result<AnimationSequence, AnimationError> {
        let index = self
            .position(key)
            .ok_or_else(|| AnimationError::NotFound(key.to_string()))?;

        if self.active.as_deref() == Some(key) {
            self.active = None;
        }

        Ok(self.animations.remove(index).1)
    }

    /// Make `key` the active animation. Its progress is left where it was.
    pub fn switch(&mut self, key: &str) -> Result<(), AnimationError> {
        if self.position(key).is_none() {
            return Err(AnimationError::NotFound(key.to_string()));
        }

        if self.active.as_deref() != Some(key) {
            tracing::trace!(from = ?self.active, to = key, "Switching animation");
            self.active = Some(key.to_string());
        }

        Ok(())
    }

    #[inline]
    pub fn active_key(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&AnimationSequence> {
        let index = self.position(self.active.as_deref()?)?;
        Some(&self.animations[index].1)
    }

    pub fn active_mut(&mut self) -> Option<&mut AnimationSequence> {
        let index = self.position(self.active.as_deref()?)?;
        Some(&mut self.animations[index].1)
    }

    pub fn get(&self, key: &str) -> Option<&AnimationSequence> {
        self.position(key).map(|index| &self.animations[index].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut AnimationSequence> {
        self.position(key).map(|index| &mut self.animations[index].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.animations.iter().map(|(key, _)| key.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Advance the active animation, picking the first one if none was chosen yet.
    pub fn update(&mut self, delta_time: f32) {
        if self.active.is_none() {
            let Some((first, _)) = self.animations.first() else {
                return;
            };
            self.active = Some(first.clone());
        }

        if let Some(animation) = self.active_mut() {
            animation.update(delta_time);
        }
    }

    /// The current frame of the active animation, `None` if there is no active animation.
    pub fn get_frame(&self) -> Result<Option<&Arc<Surface>>, AnimationError> {
        self.active().map(AnimationSequence::get_frame).transpose()
    }

    pub fn draw(&self, surface: &mut Surface, position: IVec2) {
        if let Some(animation) = self.active() {
            animation.draw(surface, position);
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.animations.iter().position(|(k, _)| k == key)
    }
}
