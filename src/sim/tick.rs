//! Per-frame game tick
//!
//! One call handles the frame's input, steps the physics world, eases the
//! camera, resolves the cursor, watches for collapse and judges placements.

use super::physics::TowerPhysics;
use super::selection::{Picker, SelectionResolver};
use super::stability;
use super::state::{GameEvent, GamePhase, GameSession, RejectReason};
use crate::consts::*;
use crate::platform::input::{InputEvent, Key};

/// Half span of the drag plane while taking a block out
const REMOVE_HALF_SPAN: f32 = PLAY_HALF_SPAN;
/// Half span of the drag plane while placing
const PLACE_HALF_SPAN: f32 = PLAY_HALF_SPAN / 2.0;
/// Lowest vertical grab offset while placing (block held highest)
const PLACE_LIFT_LIMIT: f32 = -LAYER_RISE;
/// Vertical grab offset above which the block can't be lowered further
const PLACE_DROP_LIMIT: f32 = PLACE_CLEARANCE - HALF_RISE;
/// A placed block resting this far below the tower height was dropped too low
const TOO_LOW_BAND: f32 = 3.0 * HALF_RISE;
/// A placed block resting this far above the tower height was left too high
const TOO_HIGH_BAND: f32 = 2.0 * HALF_RISE;

const COLLAPSE_ZOOM_STEP: f32 = 0.1;
const COLLAPSE_ORBIT_STEP: f32 = 0.5;
/// Cap on the per-tick camera height change from edge scrolling
const EDGE_SCROLL_MAX: f32 = 0.3;
/// Pixels past the scroll band per unit of height change
const EDGE_SCROLL_RATE: f32 = 500.0;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Events received since the previous tick, in order
    pub events: Vec<InputEvent>,
}

impl TickInput {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

/// Advance the game by one frame of `elapsed` seconds
pub fn tick<P: Picker>(
    session: &mut GameSession,
    physics: &mut dyn TowerPhysics,
    resolver: &SelectionResolver<P>,
    input: &TickInput,
    elapsed: f32,
) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // Input sees the cursor resolution from the previous frame
    for &event in &input.events {
        handle_input(session, physics, event, &mut events);
    }

    physics.step_simulation(elapsed);
    session.time_ticks += 1;
    if session.phase != GamePhase::Collapse {
        session.game_ticks += 1;
    }

    session.camera.update_view();

    track_drag_planes(session, &*physics, resolver, &mut events);

    let focus = session.selection.focus(session.phase);
    let report = stability::evaluate(&*physics, session.tower_height, focus);
    for &index in &report.strays {
        physics.recenter(index);
    }

    resolve_hover(session, &*physics, resolver);

    if matches!(
        session.phase,
        GamePhase::Choose | GamePhase::Select | GamePhase::Collapse
    ) {
        session.countdown = session.countdown.saturating_sub(1);
    }

    if session.phase == GamePhase::Collapse {
        session
            .camera
            .increase_distance(COLLAPSE_ZOOM_STEP, CAMERA_COLLAPSE_MAX_DISTANCE);
        session.camera.adjust_angle_x(COLLAPSE_ORBIT_STEP);
    } else if report.collapsed() {
        let turns = session.turn;
        log::info!(
            "Tower collapsed after {} turns (standing: {}, fallen: {:?})",
            turns,
            report.standing,
            report.fallen
        );
        session.enter(GamePhase::Collapse, GAME_OVER_TICKS, &*physics, &mut events);
        events.push(GameEvent::Collapsed { turns });
    }

    steer_held_block(session, physics);
    edge_scroll(session, resolver.viewport.height);

    if session.phase == GamePhase::Place {
        track_place_offset(session, &*physics);
    }
    if session.phase == GamePhase::Check {
        check_placement(session, &*physics, &mut events);
    }

    events
}

fn handle_input(
    session: &mut GameSession,
    physics: &mut dyn TowerPhysics,
    event: InputEvent,
    events: &mut Vec<GameEvent>,
) {
    match event {
        InputEvent::CursorMoved(position) => session.cursor = Some(position),
        InputEvent::CursorLeft => session.cursor = None,
        InputEvent::PrimaryDown => {
            primary_down(session, &*physics, events);
            session.button_held = true;
        }
        InputEvent::PrimaryUp => {
            primary_up(session, physics, events);
            session.button_held = false;
        }
        InputEvent::Key(key) => handle_key(session, physics, key, events),
    }
}

fn primary_down(session: &mut GameSession, physics: &dyn TowerPhysics, events: &mut Vec<GameEvent>) {
    if session.phase != GamePhase::Select || !session.selection.hovering_active() {
        return;
    }
    let clearance = session.camera.eye().y - GRAB_EYE_CLEARANCE;
    if session.selection.plane_height < clearance {
        session.enter(GamePhase::Remove, 0, physics, events);
    } else {
        log::debug!(
            "Grab ignored: drag plane {:.2} too close to eye",
            session.selection.plane_height
        );
    }
}

fn primary_up(session: &mut GameSession, physics: &mut dyn TowerPhysics, events: &mut Vec<GameEvent>) {
    let next = match session.phase {
        GamePhase::Remove | GamePhase::Raise => (GamePhase::Select, 0),
        GamePhase::Place => (GamePhase::Check, CHECK_WAIT_TICKS),
        _ => return,
    };
    if let Some(active) = session.selection.active {
        physics.stop(active);
    }
    session.enter(next.0, next.1, &*physics, events);
}

fn handle_key(
    session: &mut GameSession,
    physics: &mut dyn TowerPhysics,
    key: Key,
    events: &mut Vec<GameEvent>,
) {
    let phase = session.phase;
    match key {
        Key::Confirm => match phase {
            GamePhase::Choose => {
                if let Some(index) = removable_hovered(session, &*physics) {
                    log::info!("Block {} chosen", index);
                    session.selection.active = Some(index);
                    events.push(GameEvent::BlockChosen { index });
                    session.enter(GamePhase::Select, 0, &*physics, events);
                }
            }
            GamePhase::Select => {
                session.enter(GamePhase::Check, CHECK_WAIT_TICKS, &*physics, events);
            }
            GamePhase::Collapse if session.countdown == 0 => session.reset(physics, events),
            _ => log::debug!("Confirm ignored in {}", phase.as_str()),
        },
        Key::Push => match phase {
            GamePhase::Choose | GamePhase::Select => nudge(session, physics, -PUSH_IMPULSE),
            GamePhase::Remove => {
                let free = session
                    .selection
                    .active
                    .is_some_and(|i| !physics.has_lateral_contact(i));
                if free {
                    session.enter(GamePhase::Raise, 0, &*physics, events);
                }
            }
            GamePhase::Place => {
                let offset = &mut session.selection.grab_offset;
                if offset.y > PLACE_LIFT_LIMIT {
                    offset.y -= HALF_RISE;
                }
            }
            _ => {}
        },
        Key::Pull => match phase {
            GamePhase::Choose | GamePhase::Select => nudge(session, physics, PUSH_IMPULSE),
            GamePhase::Place => {
                let offset = &mut session.selection.grab_offset;
                if offset.y <= PLACE_DROP_LIMIT {
                    offset.y += HALF_RISE;
                }
            }
            _ => {}
        },
        Key::RotateLeft | Key::RotateRight => {
            if matches!(phase, GamePhase::Remove | GamePhase::Place) {
                let torque = if key == Key::RotateLeft {
                    TURN_IMPULSE
                } else {
                    -TURN_IMPULSE
                };
                if let Some(active) = session.selection.active {
                    physics.apply_torque(active, torque);
                }
            }
        }
        Key::OrbitCamera => {
            if matches!(
                phase,
                GamePhase::Choose | GamePhase::Select | GamePhase::Place
            ) {
                session.camera.adjust_angle_x(CAMERA_ORBIT_STEP);
            }
        }
        Key::ToggleHelp => {
            if phase != GamePhase::Collapse {
                session.help_visible = !session.help_visible;
            }
        }
        Key::Quit => {
            log::info!("Quit requested");
            events.push(GameEvent::QuitRequested);
        }
    }
}

/// Hovered block, if it sits low enough to be taken out
fn removable_hovered(session: &GameSession, physics: &dyn TowerPhysics) -> Option<usize> {
    session
        .selection
        .hovered
        .filter(|&i| session.is_removable(i, physics))
}

/// Push or pull the block under the cursor
fn nudge(session: &GameSession, physics: &mut dyn TowerPhysics, magnitude: f32) {
    let target = match session.phase {
        GamePhase::Choose => removable_hovered(session, &*physics),
        GamePhase::Select if session.selection.hovering_active() => session.selection.active,
        _ => None,
    };
    let Some(index) = target else {
        return;
    };
    if let Some(pose) = physics.pose(index) {
        physics.apply_impulse(index, session.selection.cursor_point - pose.position, magnitude);
    }
}

/// Move the cursor point onto the drag plane of the current phase, and move
/// on to the next phase once the held block is high enough
fn track_drag_planes<P: Picker>(
    session: &mut GameSession,
    physics: &dyn TowerPhysics,
    resolver: &SelectionResolver<P>,
    events: &mut Vec<GameEvent>,
) {
    let Some(active) = session.selection.active else {
        return;
    };
    let Some(origin) = physics.pose(active).map(|p| p.position) else {
        return;
    };
    let cursor = session.cursor.filter(|c| resolver.viewport.contains(*c));

    if session.phase == GamePhase::Remove {
        if origin.y > session.tower_height {
            session.enter(GamePhase::Raise, 0, physics, events);
        } else {
            let plane = session.selection.plane_height;
            if let Some(point) = cursor.and_then(|c| {
                resolver.horizontal_point(c, &session.camera, plane, REMOVE_HALF_SPAN)
            }) {
                session.selection.cursor_point = point;
            }
            session.selection.cursor_point.y = plane;
        }
    }

    if session.phase == GamePhase::Raise {
        if origin.y >= session.tower_height + PLACE_CLEARANCE {
            session.enter(GamePhase::Place, 0, physics, events);
        } else if let Some(point) =
            cursor.and_then(|c| resolver.vertical_point(c, &session.camera, origin))
        {
            session.selection.cursor_point = point;
        }
    }

    if session.phase == GamePhase::Place {
        let plane = session.selection.plane_height;
        if let Some(point) =
            cursor.and_then(|c| resolver.horizontal_point(c, &session.camera, plane, PLACE_HALF_SPAN))
        {
            session.selection.cursor_point = point;
        }
        session.selection.cursor_point.y = plane;
    }
}

/// Update the hovered block and cursor point while choosing or selecting
fn resolve_hover<P: Picker>(
    session: &mut GameSession,
    physics: &dyn TowerPhysics,
    resolver: &SelectionResolver<P>,
) {
    if !matches!(session.phase, GamePhase::Choose | GamePhase::Select) || session.button_held {
        return;
    }
    let resolution = resolver.resolve(session.cursor, &session.camera, physics);
    session.selection.hovered = resolution.hovered;
    if let Some(point) = resolution.point {
        session.selection.cursor_point = point;
        session.selection.plane_height = point.y;
    }
}

fn steer_held_block(session: &GameSession, physics: &mut dyn TowerPhysics) {
    if !session.button_held {
        return;
    }
    let Some(active) = session.selection.active else {
        return;
    };
    match session.phase {
        GamePhase::Remove | GamePhase::Place => physics.set_velocity_toward_target(
            active,
            session.selection.cursor_point,
            session.selection.grab_offset,
        ),
        GamePhase::Raise => {
            physics.raise_velocity_toward(active, session.tower_height + RAISE_TARGET)
        }
        _ => {}
    }
}

/// Raise or lower the camera when the cursor sits near the top or bottom edge
fn edge_scroll(session: &mut GameSession, viewport_height: f32) {
    if !matches!(session.phase, GamePhase::Choose | GamePhase::Select) {
        return;
    }
    let Some(cursor) = session.cursor else {
        return;
    };
    let top = viewport_height / 5.0;
    let bottom = viewport_height * 4.0 / 5.0;
    let ceiling = session.tower_height;

    if cursor.y < top {
        let change = ((top - cursor.y) / EDGE_SCROLL_RATE).min(EDGE_SCROLL_MAX);
        session.camera.adjust_height(change, 0.0, ceiling);
    } else if cursor.y > bottom {
        let change = ((bottom - cursor.y) / EDGE_SCROLL_RATE).max(-EDGE_SCROLL_MAX);
        session.camera.adjust_height(change, 0.0, ceiling);
    }
}

/// Keep the placed block steady while the view turns, then let it converge
/// under the cursor
fn track_place_offset(session: &mut GameSession, physics: &dyn TowerPhysics) {
    let Some(origin) = session
        .selection
        .active
        .and_then(|i| physics.pose(i))
        .map(|p| p.position)
    else {
        return;
    };
    let relative = session.selection.cursor_point - origin;
    let offset = &mut session.selection.grab_offset;

    if session.camera.is_turning() {
        offset.x = relative.x;
        offset.z = relative.z;
        return;
    }

    // Each component may only shrink toward the cursor
    if (offset.x > 0.0 && offset.x > relative.x) || (offset.x < 0.0 && offset.x < relative.x) {
        offset.x = relative.x;
    }
    if (offset.z > 0.0 && offset.z > relative.z) || (offset.z < 0.0 && offset.z < relative.z) {
        offset.z = relative.z;
    }
}

/// Judge a placed block once the wait is over and the world is still
fn check_placement(session: &mut GameSession, physics: &dyn TowerPhysics, events: &mut Vec<GameEvent>) {
    if session.countdown > 0 {
        session.countdown -= 1;
        return;
    }

    let Some(height) = session
        .selection
        .active
        .and_then(|i| physics.pose(i))
        .map(|p| p.height())
    else {
        log::debug!("Check without a held block, back to Choose");
        session.enter(GamePhase::Choose, 0, physics, events);
        return;
    };

    if height < session.tower_height - TOO_LOW_BAND {
        reject(session, physics, RejectReason::TooLow, events);
        return;
    }
    if physics.any_active() {
        return;
    }
    if height > session.tower_height + TOO_HIGH_BAND {
        reject(session, physics, RejectReason::TooHigh, events);
        return;
    }

    session.enter(GamePhase::Choose, MESSAGE_TICKS, physics, events);
    session.turn += 1;
    if (session.turn as usize + session.block_count()) % BLOCKS_PER_LAYER == 0 {
        session.tower_height += LAYER_RISE;
    }
    log::info!(
        "Turn {} committed, tower height {:.2}",
        session.turn,
        session.tower_height
    );
    events.push(GameEvent::TurnCommitted {
        turn: session.turn,
        tower_height: session.tower_height,
    });
}

fn reject(
    session: &mut GameSession,
    physics: &dyn TowerPhysics,
    reason: RejectReason,
    events: &mut Vec<GameEvent>,
) {
    log::info!("Placement rejected: {:?}", reason);
    events.push(GameEvent::PlacementRejected { reason });
    session.enter(GamePhase::Select, MESSAGE_TICKS, physics, events);
}
