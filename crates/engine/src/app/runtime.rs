use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::camera::Camera;
use super::events::{Channel, Event, EventBus};
use super::input::{InputFrame, KeyStates};
use super::level::{LevelDesc, LevelError};
use super::motion::{self, run_physics};
use super::world::{ObjectId, World};

/// One live simulation: the world, its event bus, the camera, and the
/// per-frame bookkeeping. Constructed from a level description and advanced
/// one `step` per frame by the loop runner.
pub struct Runtime {
    world: World,
    bus: EventBus,
    camera: Camera,
    keys: KeyStates,
    rng: SmallRng,
    player: ObjectId,
    last_clicked_label: Option<ObjectId>,
}

impl Runtime {
    pub fn new(
        level: &LevelDesc,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Result<Self, LevelError> {
        let mut world = World::default();
        let spawned = level.populate(&mut world)?;
        world.apply_pending();

        let mut bus = EventBus::default();
        for block in &spawned.moving_blocks {
            bus.register(Channel::Tick, *block);
        }
        bus.register(Channel::Keyboard, spawned.player);
        bus.register(Channel::Collision, spawned.player);
        for label in &spawned.labels {
            bus.register(Channel::MouseClick, *label);
        }

        Ok(Self {
            world,
            bus,
            camera: Camera::new(viewport_width, viewport_height, level.width, level.height),
            keys: KeyStates::default(),
            rng: SmallRng::from_entropy(),
            player: spawned.player,
            last_clicked_label: None,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn player(&self) -> ObjectId {
        self.player
    }

    /// The label most recently hit by a mouse click, if any.
    pub fn last_clicked_label(&self) -> Option<ObjectId> {
        self.last_clicked_label
    }

    /// Advances the simulation one frame: fold the frame's input into the
    /// key snapshot, publish the heartbeat events, dispatch, run physics,
    /// apply buffered world changes, then track the player with the camera.
    pub fn step(&mut self, input: &InputFrame) {
        for (key, is_down) in &input.key_events {
            self.keys.set(*key, *is_down);
        }

        let random_value = self.rng.gen_range(0..99u8);
        self.bus.publish_normal(random_value, self.keys.clone());
        if let Some((x, y)) = input.mouse_click {
            self.bus.enqueue(Event::MouseClick { x, y });
        }

        let world = &mut self.world;
        let last_clicked = &mut self.last_clicked_label;
        self.bus.dispatch(|listener, event| {
            let follow_ups = deliver(world, listener, event);
            if let Some(Event::LabelClicked { label }) = follow_ups.first() {
                *last_clicked = Some(*label);
            }
            follow_ups
        });

        run_physics(&mut self.world, &mut self.bus);
        self.world.apply_pending();

        if let Some(player) = self.world.find(self.player) {
            let focus = player.rect;
            self.camera.update(&focus);
        }
    }
}

/// Routes one event to one listener. Reactions mutate the world in place;
/// raised events come back as follow-ups for the bus's side queue.
fn deliver(world: &mut World, listener: ObjectId, event: &Event) -> Vec<Event> {
    match event {
        Event::Tick => {
            if let Some(object) = world.find_mut(listener) {
                if let Some(mut patrol) = object.patrol.take() {
                    patrol.advance(&mut object.rect);
                    object.patrol = Some(patrol);
                }
            }
        }
        Event::Keyboard { keys } => {
            if let Some(object) = world.find_mut(listener) {
                if let Some(motion) = object.motion.as_mut() {
                    motion::apply_keyboard(motion, keys);
                }
            }
        }
        Event::Collision { entity, block } => {
            // Contact with a moving platform: inherit its horizontal speed
            // for exactly one physics step.
            if listener == *entity {
                let push = world
                    .find(*block)
                    .and_then(|object| object.patrol.as_ref())
                    .map(|patrol| patrol.signed_speed());
                if let Some(push) = push {
                    if let Some(motion) =
                        world.find_mut(*entity).and_then(|object| object.motion.as_mut())
                    {
                        motion.on_ground = false;
                        motion.additional_force = push;
                    }
                }
            }
        }
        Event::MouseClick { x, y } => {
            // GUI items live in screen space, so the click needs no camera
            // translation.
            if let Some(object) = world.find(listener) {
                if object.visible && object.rect.contains_point(*x, *y) {
                    debug!(label = listener.0, "label_clicked");
                    return vec![Event::LabelClicked { label: listener }];
                }
            }
        }
        Event::RandomNumber { .. } | Event::LabelClicked { .. } => {}
    }
    Vec::new()
}
