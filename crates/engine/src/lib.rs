pub mod app;

pub use app::{
    apply_keyboard, run_app, run_physics, AppError, BlockDesc, Camera, Channel, Event, EventBus,
    Gui, GuiDesc, InputFrame, Key, KeyBindings, KeyNames, KeyStates, LevelDesc, LevelError,
    LoopConfig, LoopMetricsSnapshot, Motion, MotionState, MotionTuning, MovingBlockDesc, ObjectId,
    Patrol, PatrolDirection, PlayerDesc, Rect, Renderer, Runtime, SpawnedLevel, Vec2, World,
    WorldObject, LAYER_COUNT,
};
