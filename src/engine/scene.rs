use canvas::Surface;
use glam::Vec2;

use super::{events::Notification, transition::Transition};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Keys a host can report. Printable keys are passed through as characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum Key {
    Character(char),
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

#[allow(unused)]
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    MouseDown { position: Vec2, button: MouseButton },
    MouseMove { position: Vec2 },
    MouseUp { position: Vec2, button: MouseButton },
    KeyDown { key: Key },
    KeyUp { key: Key },
    Quit,
    /// An engine notification forwarded by the host after draining its receiver.
    Notification(Notification),
}

/// A screen worth of content that the [super::scene_manager::SceneManager] updates, draws and
/// transitions between.
#[allow(unused)]
pub trait Scene {
    /// Called when an event is routed to this scene. This includes input events and engine
    /// notifications.
    fn handle_event(&mut self, event: &SceneEvent) {}

    /// Called each frame with the `delta_time` in seconds.
    fn update(&mut self, delta_time: f32) {}

    /// Render the scene onto `surface`, which has the size of the screen.
    fn draw(&mut self, surface: &mut Surface);
}

/// Non-owning reference to a scene registered with a scene manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub generational_arena::Index);

/// The transitions a scene plays when it becomes, or stops being, the current scene.
#[derive(Debug, Default)]
pub struct SceneTransitions {
    pub enter: Option<Transition>,
    pub exit: Option<Transition>,
    /// Keep updating the scene while one of its transitions runs. Without this the scene is
    /// frozen for the duration of the transition.
    pub requires_update: bool,
}

impl SceneTransitions {
    pub fn with_enter(mut self, transition: Transition) -> Self {
        self.enter = Some(transition);
        self
    }

    pub fn with_exit(mut self, transition: Transition) -> Self {
        self.exit = Some(transition);
        self
    }

    pub fn with_requires_update(mut self, requires_update: bool) -> Self {
        self.requires_update = requires_update;
        self
    }
}
