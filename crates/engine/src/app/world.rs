use tracing::debug;

use super::geometry::Rect;
use super::motion::Motion;

pub const LAYER_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

#[derive(Debug, Default)]
pub struct ObjectIdAllocator {
    next: u64,
}

impl ObjectIdAllocator {
    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolDirection {
    Left,
    Right,
}

/// Oscillating horizontal patrol for a moving block. Advanced once per tick
/// event, independently of and before entity physics within a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patrol {
    pub initial_x: f32,
    pub direction: PatrolDirection,
    pub distance: f32,
    pub speed: f32,
}

impl Patrol {
    pub fn new(initial_x: f32, distance: f32, speed: f32) -> Self {
        Self {
            initial_x,
            direction: PatrolDirection::Left,
            distance,
            speed,
        }
    }

    /// The platform's current horizontal velocity, signed by direction.
    pub fn signed_speed(&self) -> f32 {
        match self.direction {
            PatrolDirection::Left => -self.speed,
            PatrolDirection::Right => self.speed,
        }
    }

    /// Moves `speed` units toward the current direction. Past
    /// `initial_x ± distance` the direction flips instead; the reversal
    /// consumes the tick without moving.
    pub fn advance(&mut self, rect: &mut Rect) {
        match self.direction {
            PatrolDirection::Left => {
                if rect.x < self.initial_x - self.distance {
                    self.direction = PatrolDirection::Right;
                } else {
                    rect.x -= self.speed;
                }
            }
            PatrolDirection::Right => {
                if rect.x > self.initial_x + self.distance {
                    self.direction = PatrolDirection::Left;
                } else {
                    rect.x += self.speed;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gui {
    HealthBar,
    Label { text: String },
}

/// A world object is a rect on a layer plus optional capabilities: `motion`
/// makes it a simulated entity, `patrol` a moving block, `gui` a screen-space
/// overlay item. Solid objects without motion are the collision geometry.
#[derive(Debug, Clone)]
pub struct WorldObject {
    pub id: ObjectId,
    pub rect: Rect,
    pub layer: usize,
    pub solid: bool,
    pub visible: bool,
    pub color: [u8; 4],
    pub motion: Option<Motion>,
    pub patrol: Option<Patrol>,
    pub gui: Option<Gui>,
}

impl WorldObject {
    pub fn is_block(&self) -> bool {
        self.solid && self.motion.is_none()
    }

    pub fn is_entity(&self) -> bool {
        self.motion.is_some()
    }
}

/// Layered container owning every block, entity, and GUI item.
///
/// Structural mutations are buffered: `add_*` and `remove` only record the
/// change, and `apply_pending` (called between frames) mutates the live
/// list. Physics and rendering may therefore iterate without an add/remove
/// from an event reaction invalidating the iteration.
#[derive(Debug, Default)]
pub struct World {
    allocator: ObjectIdAllocator,
    objects: Vec<WorldObject>,
    pending_adds: Vec<WorldObject>,
    pending_removals: Vec<ObjectId>,
}

impl World {
    pub fn add_block(&mut self, rect: Rect, layer: usize, color: [u8; 4]) -> ObjectId {
        self.push(WorldObject {
            id: ObjectId(0),
            rect,
            layer,
            solid: true,
            visible: true,
            color,
            motion: None,
            patrol: None,
            gui: None,
        })
    }

    pub fn add_moving_block(
        &mut self,
        rect: Rect,
        layer: usize,
        color: [u8; 4],
        distance: f32,
        speed: f32,
    ) -> ObjectId {
        let patrol = Patrol::new(rect.x, distance, speed);
        self.push(WorldObject {
            id: ObjectId(0),
            rect,
            layer,
            solid: true,
            visible: true,
            color,
            motion: None,
            patrol: Some(patrol),
            gui: None,
        })
    }

    pub fn add_entity(
        &mut self,
        rect: Rect,
        layer: usize,
        color: [u8; 4],
        motion: Motion,
    ) -> ObjectId {
        self.push(WorldObject {
            id: ObjectId(0),
            rect,
            layer,
            solid: true,
            visible: true,
            color,
            motion: Some(motion),
            patrol: None,
            gui: None,
        })
    }

    pub fn add_gui(&mut self, rect: Rect, layer: usize, color: [u8; 4], gui: Gui) -> ObjectId {
        self.push(WorldObject {
            id: ObjectId(0),
            rect,
            layer,
            solid: false,
            visible: true,
            color,
            motion: None,
            patrol: None,
            gui: Some(gui),
        })
    }

    fn push(&mut self, mut object: WorldObject) -> ObjectId {
        assert!(
            object.layer < LAYER_COUNT,
            "layer {} out of range",
            object.layer
        );
        let id = self.allocator.allocate();
        object.id = id;
        self.pending_adds.push(object);
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> bool {
        let exists_now = self.objects.iter().any(|object| object.id == id);
        let pending_add = self.pending_adds.iter().any(|object| object.id == id);
        if !exists_now && !pending_add {
            return false;
        }
        self.pending_removals.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_removals.is_empty() {
            self.pending_removals.sort_by_key(|id| id.0);
            self.pending_removals.dedup();
            let pending = &self.pending_removals;
            self.objects.retain(|object| {
                pending
                    .binary_search_by_key(&object.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_adds.retain(|object| {
                pending
                    .binary_search_by_key(&object.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_removals.clear();
            debug!(object_count = self.objects.len(), "world_removals_applied");
        }

        if !self.pending_adds.is_empty() {
            self.objects.append(&mut self.pending_adds);
        }
    }

    pub fn objects(&self) -> &[WorldObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [WorldObject] {
        &mut self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn find(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut WorldObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    /// Ids of all live entities (objects carrying a motion component), in
    /// insertion order.
    pub fn entity_ids(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|object| object.is_entity())
            .map(|object| object.id)
            .collect()
    }
}
