mod camera;
mod events;
mod geometry;
mod input;
mod level;
mod loop_runner;
mod metrics;
mod motion;
mod rendering;
mod runtime;
mod world;

pub use camera::Camera;
pub use events::{Channel, Event, EventBus};
pub use geometry::{Rect, Vec2};
pub use input::{InputFrame, Key, KeyBindings, KeyStates};
pub use level::{
    BlockDesc, GuiDesc, KeyNames, LevelDesc, LevelError, MovingBlockDesc, PlayerDesc, SpawnedLevel,
};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use motion::{apply_keyboard, run_physics, Motion, MotionState, MotionTuning};
pub use rendering::Renderer;
pub use runtime::Runtime;
pub use world::{Gui, ObjectId, Patrol, PatrolDirection, World, WorldObject, LAYER_COUNT};
