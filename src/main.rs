//! Block Tower headless driver
//!
//! Builds a tower in the Rapier world and plays a short scripted turn
//! through the game tick, logging game events and frame summaries.
//!
//! Usage: `block-tower [settings.json]`

use block_tower::Settings;
use block_tower::consts::SIM_DT;
use block_tower::platform::{InputEvent, Key};
use block_tower::renderer::build_frame;
use block_tower::sim::{
    GameEvent, GamePhase, GameSession, RapierWorld, SelectionResolver, StepClock, TickInput,
    TowerPhysics, project, tick,
};
use glam::Vec3;

const DEFAULT_SETTINGS_PATH: &str = "block-tower.json";
/// Frames to let the fresh tower settle before playing
const SETTLE_FRAMES: u32 = 120;

struct Driver {
    session: GameSession,
    world: RapierWorld,
    resolver: SelectionResolver,
    frames: u64,
    quit: bool,
}

impl Driver {
    fn new(settings: &Settings) -> Self {
        let clock = StepClock::new(settings.step_mode, settings.step_dt(), settings.max_substeps);
        Self {
            session: GameSession::from_settings(settings),
            world: RapierWorld::new(settings.block_count, settings.seed, clock),
            resolver: SelectionResolver::new(settings.viewport()),
            frames: 0,
            quit: false,
        }
    }

    /// Feed `events` on the first frame, then run idle frames
    fn run(&mut self, frames: u32, events: impl IntoIterator<Item = InputEvent>) {
        let mut input = TickInput::new(events);
        for _ in 0..frames {
            if self.quit {
                return;
            }
            // The very first frame has no previous timestamp
            let elapsed = if self.frames == 0 { 0.0 } else { SIM_DT };
            let events = tick(
                &mut self.session,
                &mut self.world,
                &self.resolver,
                &input,
                elapsed,
            );
            input.events.clear();
            self.frames += 1;
            for event in events {
                self.report(&event);
                if event == GameEvent::QuitRequested {
                    self.quit = true;
                }
            }
        }
    }

    fn report(&self, event: &GameEvent) {
        match event {
            GameEvent::PhaseChanged { from, to } => {
                log::info!("[{}] {} -> {}", self.frames, from.as_str(), to.as_str())
            }
            other => log::info!("[{}] {:?}", self.frames, other),
        }
    }

    /// Window point over the outward face of a block, if it is in view
    fn cursor_over(&self, index: usize) -> Option<glam::Vec2> {
        let pose = self.world.pose(index)?;
        let half = self.world.half_extents(index);
        let face = pose.position + pose.rotation * Vec3::new(0.0, 0.0, half.z * 0.9);
        let camera = &self.session.camera;
        let viewport = self.resolver.viewport;
        let (cursor, _) = project(
            face,
            camera.view_matrix(),
            camera.projection_matrix(viewport.aspect()),
            viewport,
        )?;
        viewport.contains(cursor).then_some(cursor)
    }

    fn summarize(&self) {
        let frame = build_frame(&self.session, &self.world);
        log::info!(
            "frame {}: phase {}, {} blocks, score {}, best {}, eye {:?}",
            self.frames,
            self.session.phase.as_str(),
            frame.blocks.len(),
            frame.score,
            frame.high_score,
            frame.eye,
        );
        if let Some(help) = frame.help.filter(|_| frame.help_visible) {
            log::info!("help: {} ({})", help.title(), help.controls());
        }
        if let Some(message) = frame.message {
            log::info!("message: {}", message.text());
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("Block Tower (headless) starting...");

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    let settings = Settings::load_or_default(&path);
    log::info!(
        "{} blocks, seed {:#x}, {} stepping at {} Hz",
        settings.block_count,
        settings.seed,
        settings.step_mode.as_str(),
        settings.step_rate
    );

    let mut driver = Driver::new(&settings);
    log::debug!("World clock: {} mode", driver.world.clock().mode().as_str());
    driver.run(SETTLE_FRAMES, []);
    driver.summarize();

    // Aim at a block a few layers below the removable limit
    let below = driver.session.removable_below();
    let candidate = (0..driver.world.block_count())
        .rev()
        .filter(|&i| driver.world.pose(i).is_some_and(|p| p.height() < below - 4.0))
        .find(|&i| i % 3 == 2 && driver.cursor_over(i).is_some());

    match candidate.and_then(|i| driver.cursor_over(i).map(|c| (i, c))) {
        Some((index, cursor)) => {
            log::info!("Moving cursor over block {} at {:?}", index, cursor);
            driver.run(2, [InputEvent::CursorMoved(cursor)]);
            log::info!("Hovering {:?}", driver.session.selection.hovered);

            driver.run(30, [InputEvent::Key(Key::Push)]);
            driver.run(1, [InputEvent::Key(Key::Confirm)]);
            if driver.session.phase == GamePhase::Select {
                driver.run(30, [InputEvent::Key(Key::Push), InputEvent::Key(Key::Push)]);
            }
        }
        None => log::warn!("No block in view to aim at"),
    }

    driver.run(60, [InputEvent::Key(Key::OrbitCamera), InputEvent::CursorLeft]);
    driver.summarize();

    driver.run(1, [InputEvent::Key(Key::Quit)]);
    log::info!("Stopped after {} frames", driver.frames);
}
