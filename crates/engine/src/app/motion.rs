use serde::Deserialize;

use super::events::{Event, EventBus};
use super::geometry::{Rect, Vec2};
use super::input::{KeyBindings, KeyStates};
use super::world::{ObjectId, Patrol, World, LAYER_COUNT};

/// Exactly one motion state is active per entity at a time. Entities start
/// unsupported, so the initial state is `FallingDown`; there is no terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Standing,
    WalkingLeft,
    WalkingRight,
    JumpingUp,
    JumpingLeft,
    JumpingRight,
    FallingDown,
    FallingLeft,
    FallingRight,
}

fn default_walk_speed() -> f32 {
    5.0
}

fn default_jump_force() -> f32 {
    3.5
}

fn default_gravity_force() -> f32 {
    0.5
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MotionTuning {
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    #[serde(default = "default_jump_force")]
    pub jump_force: f32,
    #[serde(default = "default_gravity_force")]
    pub gravity_force: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            walk_speed: default_walk_speed(),
            jump_force: default_jump_force(),
            gravity_force: default_gravity_force(),
        }
    }
}

/// Per-entity motion component: the state machine plus its force
/// accumulator and tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub state: MotionState,
    pub force: Vec2,
    pub on_ground: bool,
    pub walk_speed: f32,
    pub jump_force: f32,
    pub gravity_force: f32,
    /// Remaining jump impulse; loaded on jump start, decayed by gravity
    /// every physics step, reset to zero on landing.
    pub actual_jump_force: f32,
    /// One-frame horizontal force injected by moving-platform contact,
    /// cleared at the end of every physics step.
    pub additional_force: f32,
    pub bindings: KeyBindings,
}

impl Motion {
    pub fn new(tuning: MotionTuning, bindings: KeyBindings) -> Self {
        Self {
            state: MotionState::FallingDown,
            force: Vec2::default(),
            on_ground: false,
            walk_speed: tuning.walk_speed,
            jump_force: tuning.jump_force,
            gravity_force: tuning.gravity_force,
            actual_jump_force: 0.0,
            additional_force: 0.0,
            bindings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerticalRule {
    Zero,
    Gravity,
    JumpImpulse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ForceStep {
    force_x: f32,
    vertical: VerticalRule,
}

/// Force selection is a pure function of the state (plus the pending
/// platform push); the vertical component is a rule because falling and
/// jumping accumulate into `force.y` rather than overwrite it.
fn plan_force(state: MotionState, additional_force: f32, walk_speed: f32) -> ForceStep {
    let (base_x, vertical) = match state {
        MotionState::Standing => (0.0, VerticalRule::Zero),
        MotionState::WalkingLeft => (-walk_speed, VerticalRule::Zero),
        MotionState::WalkingRight => (walk_speed, VerticalRule::Zero),
        MotionState::JumpingUp => (0.0, VerticalRule::JumpImpulse),
        MotionState::JumpingLeft => (-walk_speed, VerticalRule::JumpImpulse),
        MotionState::JumpingRight => (walk_speed, VerticalRule::JumpImpulse),
        MotionState::FallingDown => (0.0, VerticalRule::Gravity),
        MotionState::FallingLeft => (-walk_speed, VerticalRule::Gravity),
        MotionState::FallingRight => (walk_speed, VerticalRule::Gravity),
    };
    ForceStep {
        force_x: base_x + additional_force,
        vertical,
    }
}

fn apply_state_force(motion: &mut Motion) {
    let step = plan_force(motion.state, motion.additional_force, motion.walk_speed);
    motion.force.x = step.force_x;
    match step.vertical {
        VerticalRule::Zero => motion.force.y = 0.0,
        VerticalRule::Gravity => motion.force.y += motion.gravity_force,
        VerticalRule::JumpImpulse => {
            motion.force.y -= motion.actual_jump_force;
            motion.actual_jump_force -= motion.gravity_force;
        }
    }
}

/// Applies the per-state keyboard transition table. Conditions are checked
/// in fixed order (ground loss first, then the state's key conditions) and
/// the first match wins for this frame.
///
/// Key tests are tri-state: a key absent from the snapshot matches neither
/// the pressed nor the released condition.
pub fn apply_keyboard(motion: &mut Motion, keys: &KeyStates) {
    let up = keys.pressed(motion.bindings.up);
    let left = keys.pressed(motion.bindings.left);
    let right = keys.pressed(motion.bindings.right);

    match motion.state {
        MotionState::FallingDown => {
            if motion.on_ground {
                motion.actual_jump_force = 0.0;
                motion.state = MotionState::Standing;
            } else if left == Some(true) {
                motion.state = MotionState::FallingLeft;
            } else if right == Some(true) {
                motion.state = MotionState::FallingRight;
            }
        }
        MotionState::FallingLeft => {
            if motion.on_ground {
                motion.actual_jump_force = 0.0;
                motion.state = MotionState::Standing;
            } else if left == Some(false) {
                motion.state = MotionState::FallingDown;
            } else if right == Some(true) {
                motion.state = MotionState::FallingRight;
            }
        }
        MotionState::FallingRight => {
            if motion.on_ground {
                motion.actual_jump_force = 0.0;
                motion.state = MotionState::Standing;
            } else if right == Some(false) {
                motion.state = MotionState::FallingDown;
            } else if left == Some(true) {
                motion.state = MotionState::FallingLeft;
            }
        }
        MotionState::JumpingUp => {
            if motion.actual_jump_force <= 0.0 {
                motion.actual_jump_force = 0.0;
                motion.state = MotionState::FallingDown;
            } else if left == Some(true) {
                motion.state = MotionState::JumpingLeft;
            } else if right == Some(true) {
                motion.state = MotionState::JumpingRight;
            }
        }
        MotionState::JumpingLeft => {
            if motion.actual_jump_force <= 0.0 {
                motion.actual_jump_force = 0.0;
                motion.state = MotionState::FallingLeft;
            } else if left == Some(false) {
                motion.state = MotionState::JumpingUp;
            } else if right == Some(true) {
                motion.state = MotionState::JumpingRight;
            }
        }
        MotionState::JumpingRight => {
            if motion.actual_jump_force <= 0.0 {
                motion.actual_jump_force = 0.0;
                motion.state = MotionState::FallingRight;
            } else if right == Some(false) {
                motion.state = MotionState::JumpingUp;
            } else if left == Some(true) {
                motion.state = MotionState::JumpingLeft;
            }
        }
        MotionState::WalkingLeft => {
            if !motion.on_ground {
                motion.state = MotionState::FallingLeft;
            } else if left == Some(false) {
                motion.state = MotionState::Standing;
            } else if right == Some(true) {
                motion.state = MotionState::WalkingRight;
            }
        }
        MotionState::WalkingRight => {
            if !motion.on_ground {
                motion.state = MotionState::FallingRight;
            } else if right == Some(false) {
                motion.state = MotionState::Standing;
            } else if left == Some(true) {
                motion.state = MotionState::WalkingLeft;
            }
        }
        MotionState::Standing => {
            if !motion.on_ground {
                motion.state = MotionState::FallingDown;
            } else if up == Some(true) {
                motion.actual_jump_force = motion.jump_force;
                motion.state = MotionState::JumpingUp;
                motion.on_ground = false;
            } else if left == Some(true) {
                motion.state = MotionState::WalkingLeft;
                motion.on_ground = false;
            } else if right == Some(true) {
                motion.state = MotionState::WalkingRight;
                motion.on_ground = false;
            }
        }
    }
}

/// Any horizontal collision interrupts the current state uniformly: the
/// entity is snapped flush and left `Standing`.
fn collide_x(rect: &mut Rect, motion: &mut Motion, block: &Rect) {
    if motion.force.x < 0.0 {
        motion.state = MotionState::Standing;
        rect.set_left(block.right());
        motion.force.x = 0.0;
    } else if motion.force.x > 0.0 {
        motion.state = MotionState::Standing;
        rect.set_right(block.left());
        motion.force.x = 0.0;
    }
}

fn collide_y(rect: &mut Rect, motion: &mut Motion, block: &Rect) {
    if motion.force.y < 0.0 {
        motion.state = MotionState::FallingDown;
        rect.set_top(block.bottom());
        motion.force.y = 0.0;
    } else if motion.force.y > 0.0 {
        motion.on_ground = true;
        motion.force.y = 0.0;
        motion.state = MotionState::Standing;
        rect.set_bottom(block.top());
    }
}

#[derive(Debug, Clone, Copy)]
struct SolidSnapshot {
    id: ObjectId,
    rect: Rect,
    patrol: Option<Patrol>,
}

/// Collision candidates in layer-then-insertion order. Overlaps against
/// multiple blocks in one step are resolved sequentially in this order and
/// the last resolution is final (a known source of corner jitter, accepted
/// rather than patched).
fn collect_solids(world: &World) -> Vec<SolidSnapshot> {
    let mut solids = Vec::new();
    for layer in 0..LAYER_COUNT {
        for object in world.objects() {
            if object.layer == layer && object.is_block() {
                solids.push(SolidSnapshot {
                    id: object.id,
                    rect: object.rect,
                    patrol: object.patrol,
                });
            }
        }
    }
    solids
}

/// Runs one physics step for every entity in the world.
pub fn run_physics(world: &mut World, bus: &mut EventBus) {
    for id in world.entity_ids() {
        physics_step(world, bus, id);
    }
}

/// One axis-separated physics step: state force, X move + resolve, Y move +
/// resolve, clear the platform push, then the ground probe. Contact with a
/// moving platform publishes a `Collision` event, at most once per
/// (entity, block) pair per step.
fn physics_step(world: &mut World, bus: &mut EventBus, id: ObjectId) {
    let solids = collect_solids(world);
    let Some(object) = world.find_mut(id) else {
        return;
    };
    let Some(motion) = object.motion.as_mut() else {
        return;
    };
    let rect = &mut object.rect;

    apply_state_force(motion);

    rect.x += motion.force.x;
    for solid in &solids {
        if rect.intersects(&solid.rect) {
            motion.on_ground = false;
            collide_x(rect, motion, &solid.rect);
        }
    }

    rect.y += motion.force.y;
    let mut published = Vec::new();
    for solid in &solids {
        if rect.intersects(&solid.rect) {
            if solid.patrol.is_some() && !published.contains(&solid.id) {
                bus.publish(Event::Collision {
                    entity: id,
                    block: solid.id,
                });
                published.push(solid.id);
            }
            motion.on_ground = false;
            collide_y(rect, motion, &solid.rect);
        }
    }

    motion.additional_force = 0.0;

    // Ground-contact probe: the rect shifted one unit down. Support grounds
    // the entity; losing support drops it unless it is still on the way up.
    let probe = rect.translated(0.0, 1.0);
    match solids.iter().find(|solid| probe.intersects(&solid.rect)) {
        None => {
            if motion.state != MotionState::JumpingUp {
                motion.on_ground = false;
                motion.state = MotionState::FallingDown;
            }
        }
        Some(support) => {
            if support.patrol.is_some() && !published.contains(&support.id) {
                bus.publish(Event::Collision {
                    entity: id,
                    block: support.id,
                });
            }
            motion.on_ground = true;
            motion.state = MotionState::Standing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::Channel;
    use crate::app::input::Key;

    fn bindings() -> KeyBindings {
        KeyBindings {
            up: Key::W,
            left: Key::A,
            right: Key::D,
        }
    }

    fn motion() -> Motion {
        Motion::new(MotionTuning::default(), bindings())
    }

    fn keys(pairs: &[(Key, bool)]) -> KeyStates {
        let mut states = KeyStates::default();
        for (key, is_down) in pairs {
            states.set(*key, *is_down);
        }
        states
    }

    fn world_with_floor() -> World {
        let mut world = World::default();
        world.add_block(Rect::new(0.0, 100.0, 1000.0, 20.0), 0, [128, 128, 128, 255]);
        world
    }

    #[test]
    fn plan_force_is_pure() {
        let first = plan_force(MotionState::WalkingLeft, 2.0, 5.0);
        let second = plan_force(MotionState::WalkingLeft, 2.0, 5.0);
        assert_eq!(first, second);
    }

    #[test]
    fn plan_force_matches_state_table() {
        assert_eq!(
            plan_force(MotionState::Standing, 0.0, 5.0),
            ForceStep {
                force_x: 0.0,
                vertical: VerticalRule::Zero,
            }
        );
        assert_eq!(
            plan_force(MotionState::WalkingRight, 0.0, 5.0).force_x,
            5.0
        );
        assert_eq!(plan_force(MotionState::FallingLeft, 0.0, 5.0).force_x, -5.0);
        assert_eq!(
            plan_force(MotionState::FallingDown, 0.0, 5.0).vertical,
            VerticalRule::Gravity
        );
        assert_eq!(
            plan_force(MotionState::JumpingRight, 0.0, 5.0).vertical,
            VerticalRule::JumpImpulse
        );
    }

    #[test]
    fn additional_force_shifts_force_x() {
        let step = plan_force(MotionState::Standing, 2.0, 5.0);
        assert!((step.force_x - 2.0).abs() < 0.0001);
        let step = plan_force(MotionState::WalkingLeft, 2.0, 5.0);
        assert!((step.force_x + 3.0).abs() < 0.0001);
    }

    #[test]
    fn jump_impulse_decays_by_gravity_each_step() {
        let mut motion = motion();
        motion.state = MotionState::JumpingUp;
        motion.actual_jump_force = 3.5;

        apply_state_force(&mut motion);
        assert!((motion.force.y + 3.5).abs() < 0.0001);
        assert!((motion.actual_jump_force - 3.0).abs() < 0.0001);

        apply_state_force(&mut motion);
        assert!((motion.force.y + 6.5).abs() < 0.0001);
        assert!((motion.actual_jump_force - 2.5).abs() < 0.0001);
    }

    #[test]
    fn falling_force_grows_monotonically() {
        let mut motion = motion();
        let mut previous = motion.force.y;
        for _ in 0..10 {
            apply_state_force(&mut motion);
            assert!(motion.force.y > previous);
            previous = motion.force.y;
        }
    }

    #[test]
    fn standing_jump_loads_impulse_and_leaves_ground() {
        let mut motion = motion();
        motion.state = MotionState::Standing;
        motion.on_ground = true;

        apply_keyboard(&mut motion, &keys(&[(Key::W, true)]));
        assert_eq!(motion.state, MotionState::JumpingUp);
        assert!((motion.actual_jump_force - 3.5).abs() < 0.0001);
        assert!(!motion.on_ground);
    }

    #[test]
    fn walking_left_losing_ground_falls_left_not_standing() {
        let mut motion = motion();
        motion.state = MotionState::WalkingLeft;
        motion.on_ground = false;

        apply_keyboard(&mut motion, &keys(&[(Key::A, true)]));
        assert_eq!(motion.state, MotionState::FallingLeft);
    }

    #[test]
    fn exhausted_jump_turns_into_matching_fall() {
        let mut motion = motion();
        motion.state = MotionState::JumpingLeft;
        motion.actual_jump_force = 0.0;

        apply_keyboard(&mut motion, &keys(&[(Key::A, true)]));
        assert_eq!(motion.state, MotionState::FallingLeft);
        assert_eq!(motion.actual_jump_force, 0.0);
    }

    #[test]
    fn landing_resets_jump_impulse() {
        let mut motion = motion();
        motion.state = MotionState::FallingRight;
        motion.on_ground = true;
        motion.actual_jump_force = 1.5;

        apply_keyboard(&mut motion, &keys(&[]));
        assert_eq!(motion.state, MotionState::Standing);
        assert_eq!(motion.actual_jump_force, 0.0);
    }

    #[test]
    fn absent_key_matches_neither_pressed_nor_released() {
        let mut motion = motion();
        motion.state = MotionState::FallingLeft;

        // No opinion about the left key: the state holds instead of
        // treating the absence as a release.
        apply_keyboard(&mut motion, &keys(&[]));
        assert_eq!(motion.state, MotionState::FallingLeft);

        apply_keyboard(&mut motion, &keys(&[(Key::A, false)]));
        assert_eq!(motion.state, MotionState::FallingDown);
    }

    #[test]
    fn first_matching_condition_wins() {
        let mut motion = motion();
        motion.state = MotionState::FallingDown;
        motion.on_ground = true;

        // Ground check precedes the key checks.
        apply_keyboard(&mut motion, &keys(&[(Key::A, true)]));
        assert_eq!(motion.state, MotionState::Standing);
    }

    #[test]
    fn falling_entity_lands_flush_and_grounded() {
        let mut world = world_with_floor();
        let entity = world.add_entity(
            Rect::new(100.0, 40.0, 40.0, 40.0),
            2,
            [0, 0, 255, 255],
            motion(),
        );
        world.apply_pending();
        let mut bus = EventBus::default();

        for _ in 0..40 {
            run_physics(&mut world, &mut bus);
        }

        let object = world.find(entity).expect("entity");
        let state = object.motion.as_ref().expect("motion");
        assert!((object.rect.bottom() - 100.0).abs() < 0.0001);
        assert!(state.on_ground);
        assert_eq!(state.state, MotionState::Standing);
        assert_eq!(state.force.y, 0.0);
    }

    #[test]
    fn fall_is_monotonic_until_landing() {
        let mut world = world_with_floor();
        let entity = world.add_entity(
            Rect::new(100.0, 0.0, 40.0, 40.0),
            2,
            [0, 0, 255, 255],
            motion(),
        );
        world.apply_pending();
        let mut bus = EventBus::default();

        let mut previous_force_y = 0.0;
        loop {
            run_physics(&mut world, &mut bus);
            let state = world
                .find(entity)
                .and_then(|object| object.motion.as_ref())
                .expect("motion")
                .clone();
            if state.on_ground {
                break;
            }
            assert!(state.force.y > previous_force_y);
            previous_force_y = state.force.y;
        }
    }

    #[test]
    fn horizontal_hit_snaps_flush_and_interrupts_state() {
        let mut world = World::default();
        world.add_block(Rect::new(0.0, 0.0, 1000.0, 20.0), 0, [128, 128, 128, 255]);
        world.add_block(Rect::new(200.0, 0.0, 20.0, 200.0), 0, [128, 128, 128, 255]);
        let mut walker = motion();
        walker.state = MotionState::WalkingRight;
        walker.on_ground = true;
        let entity = world.add_entity(
            Rect::new(158.0, 20.0, 40.0, 40.0),
            2,
            [0, 0, 255, 255],
            walker,
        );
        world.apply_pending();
        let mut bus = EventBus::default();

        run_physics(&mut world, &mut bus);

        let object = world.find(entity).expect("entity");
        let state = object.motion.as_ref().expect("motion");
        assert!((object.rect.right() - 200.0).abs() < 0.0001);
        assert_eq!(state.force.x, 0.0);
        let wall = Rect::new(200.0, 0.0, 20.0, 200.0);
        assert!(!object.rect.intersects(&wall));
    }

    #[test]
    fn additional_force_lasts_exactly_one_step() {
        let mut world = world_with_floor();
        let mut rider = motion();
        rider.state = MotionState::Standing;
        rider.on_ground = true;
        rider.additional_force = 2.0;
        let entity = world.add_entity(
            Rect::new(100.0, 60.0, 40.0, 40.0),
            2,
            [0, 0, 255, 255],
            rider,
        );
        world.apply_pending();
        let mut bus = EventBus::default();

        run_physics(&mut world, &mut bus);
        let object = world.find(entity).expect("entity");
        assert!((object.rect.x - 102.0).abs() < 0.0001);
        assert_eq!(
            object.motion.as_ref().expect("motion").additional_force,
            0.0
        );

        run_physics(&mut world, &mut bus);
        let object = world.find(entity).expect("entity");
        assert!((object.rect.x - 102.0).abs() < 0.0001);
    }

    #[test]
    fn platform_contact_publishes_collision_once_per_step() {
        let mut world = World::default();
        let platform = world.add_moving_block(
            Rect::new(80.0, 100.0, 200.0, 40.0),
            1,
            [128, 128, 128, 255],
            600.0,
            2.0,
        );
        let mut rider = motion();
        rider.state = MotionState::Standing;
        rider.on_ground = true;
        let entity = world.add_entity(
            Rect::new(100.0, 60.0, 40.0, 40.0),
            2,
            [0, 0, 255, 255],
            rider,
        );
        world.apply_pending();

        let mut bus = EventBus::default();
        bus.register(Channel::Collision, entity);
        run_physics(&mut world, &mut bus);

        bus.publish_normal(0, KeyStates::default());
        let mut collisions = 0;
        bus.dispatch(|_, event| {
            if let Event::Collision { block, .. } = event {
                assert_eq!(*block, platform);
                collisions += 1;
            }
            Vec::new()
        });
        assert_eq!(collisions, 1);
    }

    #[test]
    fn probe_does_not_drop_an_ascending_jump() {
        let mut world = world_with_floor();
        let mut jumper = motion();
        jumper.state = MotionState::JumpingUp;
        jumper.actual_jump_force = 3.5;
        let entity = world.add_entity(
            Rect::new(100.0, 60.0, 40.0, 40.0),
            2,
            [0, 0, 255, 255],
            jumper,
        );
        world.apply_pending();
        let mut bus = EventBus::default();

        run_physics(&mut world, &mut bus);
        let state = world
            .find(entity)
            .and_then(|object| object.motion.as_ref())
            .expect("motion");
        assert_eq!(state.state, MotionState::JumpingUp);
        assert!(!state.on_ground);
    }
}
