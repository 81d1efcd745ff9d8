use ahash::{HashMap, HashSet};
use canvas::{Color, Surface};
use generational_arena::Arena;
use glam::UVec2;

use super::{
    events::{NotificationKind, ObjectId},
    scene::{Scene, SceneEvent, SceneHandle, SceneTransitions},
    transition::Transition,
};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Scene not found: {0}")]
    NotFound(String),

    #[error("A scene named {0} already exists")]
    Duplicate(String),
}

#[derive(Clone, Debug)]
pub struct SceneManagerConfig {
    /// Size of the surface scenes are rendered to.
    pub screen_size: UVec2,
    /// Color the frame is cleared to before any scene is drawn.
    pub background: Color,
    /// Forward events to the current scene while transitions are running.
    pub handle_events_during_transition: bool,
}

impl Default for SceneManagerConfig {
    fn default() -> Self {
        Self {
            screen_size: UVec2::new(1280, 720),
            background: Color::BLACK,
            handle_events_during_transition: false,
        }
    }
}

impl SceneManagerConfig {
    pub fn with_screen_size(mut self, screen_size: UVec2) -> Self {
        self.screen_size = screen_size;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_handle_events_during_transition(mut self, handle: bool) -> Self {
        self.handle_events_during_transition = handle;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionSlot {
    Enter,
    Exit,
}

/// A transition that was started by a scene change and has not been released yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunningTransition {
    /// The scene owning the transition, which is also the scene it animates.
    pub scene: SceneHandle,
    pub slot: TransitionSlot,
    pub id: ObjectId,
}

struct SceneSlot {
    key: String,
    scene: Box<dyn Scene>,
    transitions: SceneTransitions,
}

impl SceneTransitions {
    fn get(&self, slot: TransitionSlot) -> Option<&Transition> {
        match slot {
            TransitionSlot::Enter => self.enter.as_ref(),
            TransitionSlot::Exit => self.exit.as_ref(),
        }
    }

    fn get_mut(&mut self, slot: TransitionSlot) -> Option<&mut Transition> {
        match slot {
            TransitionSlot::Enter => self.enter.as_mut(),
            TransitionSlot::Exit => self.exit.as_mut(),
        }
    }
}

fn transition_of<'a>(
    scenes: &'a Arena<SceneSlot>,
    entry: &RunningTransition,
) -> Option<&'a Transition> {
    scenes
        .get(entry.scene.0)
        .and_then(|slot| slot.transitions.get(entry.slot))
}

/// Owns all scenes, tracks which one is current, and runs the enter and exit transitions when
/// switching between them.
pub struct SceneManager {
    config: SceneManagerConfig,

    scenes: Arena<SceneSlot>,
    keys: HashMap<String, SceneHandle>,

    current: Option<SceneHandle>,
    previous: Option<SceneHandle>,

    /// In the order they were started.
    running: Vec<RunningTransition>,
}

impl SceneManager {
    pub fn new(config: SceneManagerConfig) -> Self {
        Self {
            config,
            scenes: Arena::new(),
            keys: HashMap::default(),
            current: None,
            previous: None,
            running: Vec::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &SceneManagerConfig {
        &self.config
    }

    /// Register a scene under `key`. The first scene added becomes the current scene.
    pub fn add_scene(
        &mut self,
        key: impl Into<String>,
        scene: impl Scene + 'static,
        transitions: SceneTransitions,
    ) -> Result<SceneHandle, SceneError> {
        let key = key.into();
        if self.keys.contains_key(&key) {
            return Err(SceneError::Duplicate(key));
        }

        let handle = SceneHandle(self.scenes.insert(SceneSlot {
            key: key.clone(),
            scene: Box::new(scene),
            transitions,
        }));
        tracing::debug!(scene = %key, "Scene added");
        self.keys.insert(key, handle);

        if self.current.is_none() {
            self.current = Some(handle);
        }

        Ok(handle)
    }

    /// Make `key` the current scene immediately. Transitions still in flight are terminated.
    pub fn set_current_scene(&mut self, key: &str) -> Result<(), SceneError> {
        let target = self.handle(key)?;

        for entry in std::mem::take(&mut self.running) {
            if let Some(transition) = self
                .scenes
                .get_mut(entry.scene.0)
                .and_then(|slot| slot.transitions.get_mut(entry.slot))
            {
                transition.terminate();
            }
        }

        tracing::info!(from = ?self.current_key(), to = key, "Setting current scene");

        self.previous = self.current;
        self.current = Some(target);

        Ok(())
    }

    /// Switch to the scene registered under `key`, playing the exit transition of the current
    /// scene and the enter transition of the new one. Nothing changes if `key` is unknown.
    pub fn change_scene(&mut self, key: &str) -> Result<(), SceneError> {
        let target = self.handle(key)?;

        tracing::info!(from = ?self.current_key(), to = key, "Changing scene");

        self.previous = self.current;
        if let Some(previous) = self.previous {
            self.start_transition(previous, TransitionSlot::Exit);
        }

        self.current = Some(target);
        self.start_transition(target, TransitionSlot::Enter);

        Ok(())
    }

    pub fn current_key(&self) -> Option<&str> {
        self.key_of(self.current?)
    }

    pub fn previous_key(&self) -> Option<&str> {
        self.key_of(self.previous?)
    }

    pub fn key_of(&self, handle: SceneHandle) -> Option<&str> {
        self.scenes.get(handle.0).map(|slot| slot.key.as_str())
    }

    pub fn handle(&self, key: &str) -> Result<SceneHandle, SceneError> {
        self.keys
            .get(key)
            .copied()
            .ok_or_else(|| SceneError::NotFound(key.to_string()))
    }

    pub fn scene(&self, key: &str) -> Option<&dyn Scene> {
        let handle = self.keys.get(key)?;
        self.scenes.get(handle.0).map(|slot| slot.scene.as_ref())
    }

    pub fn scene_mut(&mut self, key: &str) -> Option<&mut (dyn Scene + 'static)> {
        let handle = self.keys.get(key)?;
        self.scenes.get_mut(handle.0).map(|slot| slot.scene.as_mut())
    }

    pub fn transitions(&self, key: &str) -> Option<&SceneTransitions> {
        let handle = self.keys.get(key)?;
        self.scenes.get(handle.0).map(|slot| &slot.transitions)
    }

    #[inline]
    pub fn is_transitioning(&self) -> bool {
        !self.running.is_empty()
    }

    #[inline]
    pub fn running_transitions(&self) -> &[RunningTransition] {
        &self.running
    }

    /// Route an event. A [NotificationKind::TransitionEnd] releases the transition that posted
    /// it. The event is then passed to the current scene, unless transitions are running and the
    /// config says to hold events back.
    pub fn handle_event(&mut self, event: &SceneEvent) {
        if let SceneEvent::Notification(notification) = event
            && notification.is(NotificationKind::TransitionEnd)
        {
            self.release_transition(notification.source);
        }

        let Some(current) = self.current else {
            return;
        };

        if self.is_transitioning() && !self.config.handle_events_during_transition {
            tracing::trace!(?event, "Dropping event during transition");
            return;
        }

        if let Some(slot) = self.scenes.get_mut(current.0) {
            slot.scene.handle_event(event);
        }
    }

    /// Advance running transitions and the scenes they don't cover. A scene is updated at most
    /// once per call.
    pub fn update(&mut self, delta_time: f32) {
        let Some(current) = self.current else {
            return;
        };

        let mut covered = HashSet::default();
        let mut updated = HashSet::default();

        for entry in self.running.iter() {
            let Some(slot) = self.scenes.get_mut(entry.scene.0) else {
                tracing::warn!(?entry, "Running transition refers to a missing scene");
                continue;
            };

            let SceneSlot {
                key,
                scene,
                transitions,
            } = slot;
            let requires_update = transitions.requires_update;

            let Some(transition) = transitions.get_mut(entry.slot) else {
                continue;
            };
            transition.update(delta_time);

            if transition.target().is_none() {
                continue;
            }

            covered.insert(entry.scene);
            if requires_update && updated.insert(entry.scene) {
                tracing::trace!(scene = %key, "Updating scene under transition");
                scene.update(delta_time);
            }
        }

        if let Some(previous) = self.previous {
            self.update_uncovered(previous, delta_time, &covered, &mut updated);
        }
        self.update_uncovered(current, delta_time, &covered, &mut updated);
    }

    /// Clear `surface` and draw the current scene. While transitions run, the previous scene is
    /// drawn too and every transition composes its scene on top, with the current scene's
    /// transitions last.
    pub fn draw(&mut self, surface: &mut Surface) {
        surface.fill(self.config.background);

        let Some(current) = self.current else {
            return;
        };

        if !self.is_transitioning() {
            if let Some(slot) = self.scenes.get_mut(current.0) {
                slot.scene.draw(surface);
            }
            return;
        }

        let covered: HashSet<SceneHandle> = self
            .running
            .iter()
            .filter(|entry| {
                transition_of(&self.scenes, entry)
                    .and_then(Transition::target)
                    .is_some()
            })
            .map(|entry| entry.scene)
            .collect();

        if let Some(previous) = self.previous
            && previous != current
            && !covered.contains(&previous)
            && let Some(slot) = self.scenes.get_mut(previous.0)
        {
            slot.scene.draw(surface);
        }

        if !covered.contains(&current)
            && let Some(slot) = self.scenes.get_mut(current.0)
        {
            slot.scene.draw(surface);
        }

        let mut order = self.running.clone();
        order.sort_by_key(|entry| {
            if Some(entry.scene) == self.current {
                2
            } else if Some(entry.scene) == self.previous {
                1
            } else {
                0
            }
        });

        for entry in order {
            let Some(slot) = self.scenes.get_mut(entry.scene.0) else {
                continue;
            };
            let SceneSlot {
                scene, transitions, ..
            } = slot;
            if let Some(transition) = transitions.get(entry.slot) {
                transition.draw(scene.as_mut(), surface);
            }
        }
    }

    fn start_transition(&mut self, handle: SceneHandle, slot: TransitionSlot) {
        let screen_size = self.config.screen_size.as_vec2();

        let Some(scene) = self.scenes.get_mut(handle.0) else {
            return;
        };
        let Some(transition) = scene.transitions.get_mut(slot) else {
            return;
        };

        transition.start(handle, screen_size);
        let id = transition.id();

        if !self.running.iter().any(|entry| entry.id == id) {
            self.running.push(RunningTransition {
                scene: handle,
                slot,
                id,
            });
        }
    }

    /// Drop the running entry for the transition with `id` once it has stopped.
    fn release_transition(&mut self, id: ObjectId) {
        let scenes = &self.scenes;
        self.running.retain(|entry| {
            entry.id != id
                || transition_of(scenes, entry).is_some_and(Transition::is_running)
        });
    }

    fn update_uncovered(
        &mut self,
        handle: SceneHandle,
        delta_time: f32,
        covered: &HashSet<SceneHandle>,
        updated: &mut HashSet<SceneHandle>,
    ) {
        if covered.contains(&handle) || !updated.insert(handle) {
            return;
        }

        if let Some(slot) = self.scenes.get_mut(handle.0) {
            slot.scene.update(delta_time);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, sync::mpsc::Receiver};

    use super::*;
    use crate::engine::{
        events::{EventSink, Notification},
        scene::Key,
        transition::TransitionKind,
    };

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every call made on it into a shared log.
    struct ProbeScene {
        name: &'static str,
        color: Color,
        log: Log,
    }

    impl ProbeScene {
        fn new(name: &'static str, color: Color, log: &Log) -> Self {
            Self {
                name,
                color,
                log: Rc::clone(log),
            }
        }
    }

    impl Scene for ProbeScene {
        fn handle_event(&mut self, event: &SceneEvent) {
            if let SceneEvent::KeyDown { key } = event {
                self.log.borrow_mut().push(format!("{}:key:{key}", self.name));
            }
        }

        fn update(&mut self, _delta_time: f32) {
            self.log.borrow_mut().push(format!("{}:update", self.name));
        }

        fn draw(&mut self, surface: &mut Surface) {
            self.log.borrow_mut().push(format!("{}:draw", self.name));
            surface.fill(self.color);
        }
    }

    fn count(log: &Log, entry: &str) -> usize {
        log.borrow().iter().filter(|e| *e == entry).count()
    }

    fn take(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    const SCREEN: UVec2 = UVec2::new(8, 8);

    fn fades(sink: &EventSink, requires_update: bool) -> SceneTransitions {
        SceneTransitions::default()
            .with_enter(Transition::fade(TransitionKind::Enter, 1.0, sink.clone()).unwrap())
            .with_exit(Transition::fade(TransitionKind::Exit, 1.0, sink.clone()).unwrap())
            .with_requires_update(requires_update)
    }

    fn setup(requires_update: bool) -> (SceneManager, Log, Receiver<Notification>) {
        let (sink, receiver) = EventSink::channel();
        let log = Log::default();

        let mut manager = SceneManager::new(SceneManagerConfig::default().with_screen_size(SCREEN));
        manager
            .add_scene(
                "a",
                ProbeScene::new("a", Color::RED, &log),
                fades(&sink, requires_update),
            )
            .unwrap();
        manager
            .add_scene(
                "b",
                ProbeScene::new("b", Color::GREEN, &log),
                fades(&sink, requires_update),
            )
            .unwrap();
        manager
            .add_scene(
                "c",
                ProbeScene::new("c", Color::BLUE, &log),
                SceneTransitions::default(),
            )
            .unwrap();

        (manager, log, receiver)
    }

    fn forward_notifications(manager: &mut SceneManager, receiver: &Receiver<Notification>) {
        for notification in receiver.try_iter() {
            manager.handle_event(&SceneEvent::Notification(notification));
        }
    }

    #[test]
    fn first_scene_is_current_and_keys_are_unique() {
        let (mut manager, log, _receiver) = setup(false);
        assert_eq!(manager.current_key(), Some("a"));
        assert_eq!(manager.previous_key(), None);

        let result = manager.add_scene(
            "a",
            ProbeScene::new("x", Color::WHITE, &log),
            SceneTransitions::default(),
        );
        assert!(matches!(result, Err(SceneError::Duplicate(key)) if key == "a"));
        assert!(manager.scene("a").is_some());
        assert!(manager.scene_mut("z").is_none());
    }

    #[test]
    fn change_to_unknown_scene_changes_nothing() {
        let (mut manager, _log, _receiver) = setup(false);
        manager.change_scene("b").unwrap();
        let running = manager.running_transitions().to_vec();

        assert!(matches!(
            manager.change_scene("missing"),
            Err(SceneError::NotFound(key)) if key == "missing"
        ));
        assert_eq!(manager.current_key(), Some("b"));
        assert_eq!(manager.previous_key(), Some("a"));
        assert_eq!(manager.running_transitions(), running.as_slice());
    }

    #[test]
    fn change_scene_starts_exit_and_enter() {
        let (mut manager, _log, _receiver) = setup(false);
        manager.change_scene("b").unwrap();

        let running = manager.running_transitions();
        assert_eq!(running.len(), 2);
        assert_eq!(running[0].slot, TransitionSlot::Exit);
        assert_eq!(manager.key_of(running[0].scene), Some("a"));
        assert_eq!(running[1].slot, TransitionSlot::Enter);
        assert_eq!(manager.key_of(running[1].scene), Some("b"));

        let b = manager.transitions("b").unwrap();
        assert!(b.enter.as_ref().unwrap().is_running());
        assert!(!b.exit.as_ref().unwrap().is_running());
    }

    #[test]
    fn opted_in_scenes_update_exactly_once() {
        let (mut manager, log, _receiver) = setup(true);
        manager.change_scene("b").unwrap();

        manager.update(0.1);
        assert_eq!(count(&log, "a:update"), 1);
        assert_eq!(count(&log, "b:update"), 1);
        assert_eq!(count(&log, "c:update"), 0);

        // Changing to the current scene runs its exit and enter transition at the same time.
        manager.change_scene("b").unwrap();
        take(&log);
        manager.update(0.1);
        assert_eq!(count(&log, "b:update"), 1);
    }

    #[test]
    fn covered_scenes_are_frozen() {
        let (mut manager, log, _receiver) = setup(false);
        manager.change_scene("b").unwrap();

        manager.update(0.1);
        assert_eq!(count(&log, "a:update"), 0);
        assert_eq!(count(&log, "b:update"), 0);
    }

    #[test]
    fn uncovered_scenes_are_updated() {
        let (mut manager, log, _receiver) = setup(false);
        // "c" has no enter transition, only the exit of "a" runs.
        manager.change_scene("c").unwrap();
        assert_eq!(manager.running_transitions().len(), 1);

        manager.update(0.1);
        assert_eq!(count(&log, "a:update"), 0);
        assert_eq!(count(&log, "c:update"), 1);
    }

    #[test]
    fn previous_scene_keeps_updating_without_transitions() {
        let (mut manager, log, _receiver) = setup(false);
        manager.set_current_scene("c").unwrap();
        assert_eq!(manager.previous_key(), Some("a"));
        assert!(!manager.is_transitioning());

        manager.update(0.1);
        assert_eq!(count(&log, "a:update"), 1);
        assert_eq!(count(&log, "c:update"), 1);
        assert_eq!(count(&log, "b:update"), 0);
        take(&log);

        // Only the current scene is drawn.
        let mut surface = Surface::new(SCREEN);
        manager.draw(&mut surface);
        assert_eq!(take(&log), vec!["c:draw"]);
        assert_eq!(surface.pixel(UVec2::ZERO), Some(Color::BLUE));
    }

    #[test]
    fn change_between_scenes_without_transitions_updates_both() {
        let log = Log::default();
        let mut manager = SceneManager::new(SceneManagerConfig::default().with_screen_size(SCREEN));
        manager
            .add_scene(
                "a",
                ProbeScene::new("a", Color::RED, &log),
                SceneTransitions::default(),
            )
            .unwrap();
        manager
            .add_scene(
                "b",
                ProbeScene::new("b", Color::GREEN, &log),
                SceneTransitions::default(),
            )
            .unwrap();

        manager.change_scene("b").unwrap();
        assert!(!manager.is_transitioning());

        manager.update(0.1);
        assert_eq!(take(&log), vec!["a:update", "b:update"]);
    }

    #[test]
    fn transition_end_releases_finished_transitions() {
        let (mut manager, _log, receiver) = setup(false);
        manager.change_scene("b").unwrap();
        let exit = manager.running_transitions()[0].id;

        // Still running, a stray notification must not release it.
        manager.handle_event(&SceneEvent::Notification(Notification::new(
            NotificationKind::TransitionEnd,
            exit,
            None,
        )));
        assert_eq!(manager.running_transitions().len(), 2);

        manager.update(1.0);
        assert!(manager.is_transitioning());

        forward_notifications(&mut manager, &receiver);
        assert!(!manager.is_transitioning());
    }

    #[test]
    fn events_are_held_back_during_transitions() {
        let (mut manager, log, receiver) = setup(false);
        let key_down = SceneEvent::KeyDown { key: Key::Space };

        manager.change_scene("b").unwrap();
        manager.handle_event(&key_down);
        assert_eq!(count(&log, "b:key:Space"), 0);

        manager.update(1.0);
        forward_notifications(&mut manager, &receiver);
        manager.handle_event(&key_down);
        assert_eq!(count(&log, "b:key:Space"), 1);
    }

    #[test]
    fn events_can_be_forwarded_during_transitions() {
        let (mut manager, log, _receiver) = setup(false);
        manager.config.handle_events_during_transition = true;

        manager.change_scene("b").unwrap();
        manager.handle_event(&SceneEvent::KeyDown {
            key: Key::Character('x'),
        });
        assert_eq!(count(&log, "b:key:Character"), 1);
        assert_eq!(count(&log, "a:key:Character"), 0);
    }

    #[test]
    fn restarting_does_not_duplicate_running_entries() {
        let (mut manager, _log, _receiver) = setup(false);
        manager.change_scene("b").unwrap();
        manager.change_scene("a").unwrap();
        manager.change_scene("b").unwrap();

        // Exit and enter of both "a" and "b", each once.
        let running = manager.running_transitions();
        assert_eq!(running.len(), 4);
        let mut ids: Vec<_> = running.iter().map(|entry| entry.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn current_scene_transitions_draw_on_top() {
        let (mut manager, log, _receiver) = setup(false);
        manager.change_scene("b").unwrap();
        manager.update(0.25);
        manager.change_scene("c").unwrap();
        take(&log);

        // "a" is neither previous nor current, "b" is previous, "c" has no transitions.
        let mut surface = Surface::new(SCREEN);
        manager.draw(&mut surface);
        assert_eq!(take(&log), vec!["c:draw", "a:draw", "b:draw", "b:draw"]);
    }

    #[test]
    fn transitions_of_the_current_scene_are_drawn_last() {
        let (mut manager, log, _receiver) = setup(false);
        manager.change_scene("b").unwrap();
        manager.change_scene("a").unwrap();

        let slots: Vec<_> = manager
            .running_transitions()
            .iter()
            .map(|entry| (manager.key_of(entry.scene), entry.slot))
            .collect();
        assert_eq!(
            slots,
            vec![
                (Some("a"), TransitionSlot::Exit),
                (Some("b"), TransitionSlot::Enter),
                (Some("b"), TransitionSlot::Exit),
                (Some("a"), TransitionSlot::Enter),
            ]
        );

        // "a" is current again, so both of its transitions go on top of the previous scene "b".
        let mut surface = Surface::new(SCREEN);
        manager.draw(&mut surface);
        assert_eq!(take(&log), vec!["b:draw", "b:draw", "a:draw", "a:draw"]);
    }

    #[test]
    fn draw_composes_transitions_over_background() {
        let (mut manager, log, _receiver) = setup(false);
        manager.config.background = Color::WHITE;

        manager.change_scene("b").unwrap();
        manager.update(1.0);

        // Both fades are done but not released yet, so nothing covers either scene.
        let mut surface = Surface::new(SCREEN);
        manager.draw(&mut surface);
        assert_eq!(take(&log), vec!["a:draw", "b:draw"]);
        assert_eq!(surface.pixel(UVec2::new(3, 3)), Some(Color::GREEN));

    }

    #[test]
    fn nothing_happens_without_scenes() {
        let mut manager = SceneManager::new(SceneManagerConfig::default().with_screen_size(SCREEN));
        manager.update(1.0);
        manager.handle_event(&SceneEvent::Quit);

        let mut surface = Surface::new(SCREEN);
        manager.draw(&mut surface);
        assert_eq!(surface.pixel(UVec2::ZERO), Some(Color::BLACK));
        assert_eq!(manager.current_key(), None);
    }
}
