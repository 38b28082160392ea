use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::geometry::Rect;
use super::input::{Key, KeyBindings};
use super::motion::{Motion, MotionTuning};
use super::world::{Gui, ObjectId, World, LAYER_COUNT};

/// Level construction failures. All of these are configuration mistakes and
/// are surfaced before the first frame runs.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level extent {width}x{height} must be positive")]
    InvalidExtent { width: f32, height: f32 },
    #[error("{object} has a negative extent {width}x{height}")]
    NegativeObjectExtent {
        object: String,
        width: f32,
        height: f32,
    },
    #[error("{object} is on layer {layer}, but only layers 0 through 4 exist")]
    LayerOutOfRange { object: String, layer: usize },
    #[error("unknown key name {name:?} in player bindings")]
    UnknownKey { name: String },
    #[error("motion tuning must be positive: walk_speed={walk_speed}, jump_force={jump_force}, gravity_force={gravity_force}")]
    InvalidTuning {
        walk_speed: f32,
        jump_force: f32,
        gravity_force: f32,
    },
    #[error("patrol needs a non-negative distance and positive speed, got distance={distance} speed={speed}")]
    InvalidPatrol { distance: f32, speed: f32 },
}

fn default_color() -> [u8; 3] {
    [128, 128, 128]
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockDesc {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub layer: usize,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovingBlockDesc {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub layer: usize,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    pub distance: f32,
    pub speed: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuiDesc {
    HealthBar {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        layer: usize,
    },
    Label {
        text: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        layer: usize,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyNames {
    pub up: String,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerDesc {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub layer: usize,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    pub keys: KeyNames,
}

/// Declarative level description, deserialized from configuration. The
/// coordinate space is the level's own: `(0, 0)` top-left, y growing down.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelDesc {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub blocks: Vec<BlockDesc>,
    #[serde(default)]
    pub moving_blocks: Vec<MovingBlockDesc>,
    #[serde(default)]
    pub gui: Vec<GuiDesc>,
    pub player: PlayerDesc,
    #[serde(default)]
    pub tuning: Option<MotionTuning>,
}

/// Ids of the objects a built level wires into the event bus.
#[derive(Debug)]
pub struct SpawnedLevel {
    pub player: ObjectId,
    pub moving_blocks: Vec<ObjectId>,
    pub labels: Vec<ObjectId>,
}

fn rgba(color: [u8; 3]) -> [u8; 4] {
    [color[0], color[1], color[2], 255]
}

fn check_object(object: &str, width: f32, height: f32, layer: usize) -> Result<(), LevelError> {
    if width < 0.0 || height < 0.0 {
        return Err(LevelError::NegativeObjectExtent {
            object: object.to_owned(),
            width,
            height,
        });
    }
    if layer >= LAYER_COUNT {
        return Err(LevelError::LayerOutOfRange {
            object: object.to_owned(),
            layer,
        });
    }
    Ok(())
}

impl LevelDesc {
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(LevelError::InvalidExtent {
                width: self.width,
                height: self.height,
            });
        }
        for (index, block) in self.blocks.iter().enumerate() {
            check_object(
                &format!("block #{index}"),
                block.width,
                block.height,
                block.layer,
            )?;
        }
        for (index, block) in self.moving_blocks.iter().enumerate() {
            let object = format!("moving block #{index}");
            check_object(&object, block.width, block.height, block.layer)?;
            if block.distance < 0.0 || block.speed <= 0.0 {
                return Err(LevelError::InvalidPatrol {
                    distance: block.distance,
                    speed: block.speed,
                });
            }
        }
        for (index, gui) in self.gui.iter().enumerate() {
            let object = format!("gui item #{index}");
            match gui {
                GuiDesc::HealthBar {
                    width,
                    height,
                    layer,
                    ..
                }
                | GuiDesc::Label {
                    width,
                    height,
                    layer,
                    ..
                } => check_object(&object, *width, *height, *layer)?,
            }
        }
        check_object(
            "player",
            self.player.width,
            self.player.height,
            self.player.layer,
        )?;
        self.bindings()?;
        if let Some(tuning) = &self.tuning {
            if tuning.walk_speed <= 0.0 || tuning.jump_force <= 0.0 || tuning.gravity_force <= 0.0 {
                return Err(LevelError::InvalidTuning {
                    walk_speed: tuning.walk_speed,
                    jump_force: tuning.jump_force,
                    gravity_force: tuning.gravity_force,
                });
            }
        }
        Ok(())
    }

    fn bindings(&self) -> Result<KeyBindings, LevelError> {
        let resolve = |name: &str| {
            Key::from_name(name).ok_or_else(|| LevelError::UnknownKey {
                name: name.to_owned(),
            })
        };
        Ok(KeyBindings {
            up: resolve(&self.player.keys.up)?,
            left: resolve(&self.player.keys.left)?,
            right: resolve(&self.player.keys.right)?,
        })
    }

    /// Validates and then spawns every described object into the world. The
    /// spawned objects are still pending until `apply_pending` runs.
    pub fn populate(&self, world: &mut World) -> Result<SpawnedLevel, LevelError> {
        self.validate()?;
        let bindings = self.bindings()?;
        let tuning = self.tuning.unwrap_or_default();

        for block in &self.blocks {
            world.add_block(
                Rect::new(block.x, block.y, block.width, block.height),
                block.layer,
                rgba(block.color),
            );
        }

        let mut moving_blocks = Vec::new();
        for block in &self.moving_blocks {
            moving_blocks.push(world.add_moving_block(
                Rect::new(block.x, block.y, block.width, block.height),
                block.layer,
                rgba(block.color),
                block.distance,
                block.speed,
            ));
        }

        let mut labels = Vec::new();
        for gui in &self.gui {
            match gui {
                GuiDesc::HealthBar {
                    x,
                    y,
                    width,
                    height,
                    layer,
                } => {
                    world.add_gui(
                        Rect::new(*x, *y, *width, *height),
                        *layer,
                        [200, 30, 30, 255],
                        Gui::HealthBar,
                    );
                }
                GuiDesc::Label {
                    text,
                    x,
                    y,
                    width,
                    height,
                    layer,
                } => {
                    labels.push(world.add_gui(
                        Rect::new(*x, *y, *width, *height),
                        *layer,
                        [230, 230, 230, 255],
                        Gui::Label { text: text.clone() },
                    ));
                }
            }
        }

        let player = world.add_entity(
            Rect::new(
                self.player.x,
                self.player.y,
                self.player.width,
                self.player.height,
            ),
            self.player.layer,
            rgba(self.player.color),
            Motion::new(tuning, bindings),
        );

        info!(
            blocks = self.blocks.len(),
            moving_blocks = moving_blocks.len(),
            gui = self.gui.len(),
            "level_populated"
        );
        Ok(SpawnedLevel {
            player,
            moving_blocks,
            labels,
        })
    }
}
