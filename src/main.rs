use std::path::PathBuf;

use clap::Parser;
use game::scenes::{GalleryScene, TitleScene, frame_paths};
use reel::engine::prelude::*;
use tracing::info;

mod game;

#[derive(clap::Parser)]
struct Opts {
    /// Directory the rendered frames are written to.
    #[arg(long, default_value = "frames")]
    output: PathBuf,

    /// Number of frames to render.
    #[arg(long, default_value_t = 150)]
    frames: u32,

    /// Frames per second of the fixed time step.
    #[arg(long, default_value_t = 30.0)]
    fps: f32,

    #[arg(long, default_value_t = 320)]
    width: u32,

    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Direction scenes slide in from (up, down, left or right).
    #[arg(long, default_value = "down")]
    direction: SlideDirection,

    /// Length of each transition in seconds.
    #[arg(long, default_value_t = 1.0)]
    duration: f32,

    /// Switch between the two scenes every this many frames.
    #[arg(long, default_value_t = 60)]
    change_every: u32,

    /// Pass input to the current scene while transitions are running.
    #[arg(long)]
    events_during_transition: bool,

    /// Directory with PNG frames to use for the gallery sprite.
    #[arg(long)]
    sprite_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Surface error: {0}")]
    Surface(#[from] canvas::SurfaceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frames per second must be positive ({0})")]
    InvalidFps(f32),
}

const SCENES: [&str; 2] = ["title", "gallery"];

fn run(opts: &Opts) -> Result<(), DemoError> {
    if !opts.fps.is_finite() || opts.fps <= 0.0 {
        return Err(DemoError::InvalidFps(opts.fps));
    }

    std::fs::create_dir_all(&opts.output)?;

    let screen_size = UVec2::new(opts.width, opts.height);
    let (sink, receiver) = EventSink::channel();

    let sprite_frames = match opts.sprite_dir {
        Some(ref dir) => frame_paths(dir)?
            .into_iter()
            .map(FrameSource::from)
            .collect(),
        None => vec![],
    };

    let mut manager = SceneManager::new(
        SceneManagerConfig::default()
            .with_screen_size(screen_size)
            .with_handle_events_during_transition(opts.events_during_transition),
    );

    let slide = |kind| {
        Transition::slide(
            opts.direction,
            kind,
            screen_size.as_vec2(),
            opts.duration,
            sink.clone(),
        )
    };

    manager.add_scene(
        "title",
        TitleScene::new(screen_size, sink.clone())?,
        SceneTransitions::default()
            .with_enter(slide(TransitionKind::Enter)?.with_tag("title-enter"))
            .with_exit(
                Transition::fade(TransitionKind::Exit, opts.duration, sink.clone())?
                    .with_tag("title-exit"),
            ),
    )?;

    manager.add_scene(
        "gallery",
        GalleryScene::new(screen_size, sprite_frames, sink.clone())?,
        SceneTransitions::default()
            .with_enter(slide(TransitionKind::Enter)?.with_tag("gallery-enter"))
            .with_exit(slide(TransitionKind::Exit)?.with_tag("gallery-exit"))
            .with_requires_update(true),
    )?;

    let delta_time = 1.0 / opts.fps;
    let mut surface = Surface::new(screen_size);
    let mut next_scene = 1;

    for frame in 0..opts.frames {
        for notification in receiver.try_iter() {
            tracing::trace!(
                kind = %notification.kind,
                source = %notification.source,
                tag = ?notification.tag,
                "Forwarding notification",
            );
            manager.handle_event(&SceneEvent::Notification(notification));
        }

        if opts.change_every > 0 && frame > 0 {
            if frame % opts.change_every == 0 {
                manager.change_scene(SCENES[next_scene])?;
                next_scene = (next_scene + 1) % SCENES.len();
            } else if frame % opts.change_every == opts.change_every / 2 {
                manager.handle_event(&SceneEvent::KeyDown { key: Key::Space });
            }
        }

        manager.update(delta_time);
        manager.draw(&mut surface);

        surface.save(opts.output.join(format!("frame_{frame:04}.png")))?;
    }

    info!(
        frames = opts.frames,
        output = %opts.output.display(),
        "Demo finished",
    );

    Ok(())
}

fn main() {
    tracing_subscriber::fmt().init();

    let opts = Opts::parse();

    if let Err(err) = run(&opts) {
        tracing::error!("Demo failed! - {err}");
        std::process::exit(1);
    }
}
