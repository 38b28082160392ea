use engine::{LevelDesc, LoopConfig, Runtime};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LEVEL_JSON: &str = include_str!("level.json");

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) runtime: Runtime,
}

pub(crate) fn build_app() -> Result<AppWiring, String> {
    init_tracing();
    info!("=== Platformer Startup ===");

    let level = load_level(LEVEL_JSON)?;
    let config = LoopConfig::default();
    let runtime = Runtime::new(
        &level,
        config.window_width as f32,
        config.window_height as f32,
    )
    .map_err(|error| format!("failed to build level: {error}"))?;
    info!(
        object_count = runtime.world().object_count(),
        level_width = level.width,
        level_height = level.height,
        "level_ready"
    );

    Ok(AppWiring { config, runtime })
}

/// Parses and validates a level description, reporting the JSON path of any
/// deserialization failure.
pub(crate) fn load_level(raw: &str) -> Result<LevelDesc, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let level: LevelDesc = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|error| format!("level JSON invalid at {}: {}", error.path(), error.inner()))?;
    level
        .validate()
        .map_err(|error| format!("level rejected: {error}"))?;
    Ok(level)
}

#[cfg(test)]
pub(crate) fn embedded_level() -> LevelDesc {
    load_level(LEVEL_JSON).expect("embedded level must be valid")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
