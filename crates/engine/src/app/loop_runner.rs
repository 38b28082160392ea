use std::mem;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::{InputFrame, Key};
use super::metrics::MetricsAccumulator;
use super::rendering::Renderer;
use super::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_fps: u32,
    pub metrics_log_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Platformer".to_string(),
            window_width: 1000,
            window_height: 600,
            target_fps: 60,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Drives the windowed frame loop: collect input, step the runtime once,
/// render, sleep to hold the target frame rate.
pub fn run_app(config: LoopConfig, mut runtime: Runtime) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let frame_target = target_frame_duration(config.target_fps.max(1));
    let mut input_collector = InputCollector::default();
    let mut metrics_accumulator = MetricsAccumulator::new(normalize_non_zero_duration(
        config.metrics_log_interval,
        Duration::from_secs(1),
    ));
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();

    info!(
        target_fps = config.target_fps,
        window_width = config.window_width,
        window_height = config.window_height,
        object_count = runtime.world().object_count(),
        "loop_config"
    );

    let window_for_loop = Arc::clone(&window);
    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        input_collector.set_cursor_position(position.x as f32, position.y as f32);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        input_collector.clear_cursor_position();
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        input_collector.handle_mouse_input(button, state);
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                        if input_collector.quit_requested {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        // Single sleep point holding the fixed frame rate;
                        // the simulation advances one step per frame.
                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep = compute_cap_sleep(elapsed_since_last_present, frame_target);
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        let input = input_collector.take_frame();
                        runtime.step(&input);

                        if let Err(error) = renderer.render_world(runtime.world(), runtime.camera())
                        {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();
                        metrics_accumulator.record_frame(raw_frame_dt);

                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            info!(
                                fps = snapshot.fps,
                                frame_time_ms = snapshot.frame_time_ms,
                                object_count = runtime.world().object_count(),
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Accumulates window events between frames and drains them into one
/// `InputFrame` per simulation step.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    key_events: Vec<(Key, bool)>,
    cursor_position: Option<(f32, f32)>,
    left_mouse_is_down: bool,
    pending_click: Option<(f32, f32)>,
}

impl InputCollector {
    fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        // OS key repeats would read as extra press transitions.
        if key_event.repeat {
            return;
        }
        if let Some(key) = map_physical_key(key_event.physical_key) {
            self.record_key(key, key_event.state == ElementState::Pressed);
        }
    }

    fn record_key(&mut self, key: Key, is_down: bool) {
        self.key_events.push((key, is_down));
        if key == Key::Escape && is_down {
            self.quit_requested = true;
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    self.pending_click = self.cursor_position;
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => self.left_mouse_is_down = false,
        }
    }

    fn set_cursor_position(&mut self, x: f32, y: f32) {
        self.cursor_position = Some((x, y));
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position = None;
    }

    fn take_frame(&mut self) -> InputFrame {
        InputFrame {
            quit: self.quit_requested,
            key_events: mem::take(&mut self.key_events),
            mouse_click: self.pending_click.take(),
        }
    }
}

fn map_physical_key(key: PhysicalKey) -> Option<Key> {
    match key {
        PhysicalKey::Code(KeyCode::KeyW) => Some(Key::W),
        PhysicalKey::Code(KeyCode::KeyA) => Some(Key::A),
        PhysicalKey::Code(KeyCode::KeyS) => Some(Key::S),
        PhysicalKey::Code(KeyCode::KeyD) => Some(Key::D),
        PhysicalKey::Code(KeyCode::ArrowUp) => Some(Key::Up),
        PhysicalKey::Code(KeyCode::ArrowDown) => Some(Key::Down),
        PhysicalKey::Code(KeyCode::ArrowLeft) => Some(Key::Left),
        PhysicalKey::Code(KeyCode::ArrowRight) => Some(Key::Right),
        PhysicalKey::Code(KeyCode::Space) => Some(Key::Space),
        PhysicalKey::Code(KeyCode::Escape) => Some(Key::Escape),
        _ => None,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn target_frame_duration(target_fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / target_fps as f64)
}

fn compute_cap_sleep(elapsed: Duration, frame_target: Duration) -> Duration {
    if elapsed < frame_target {
        frame_target - elapsed
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(60);
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(60));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(60));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn take_frame_drains_key_transitions() {
        let mut input = InputCollector::default();
        input.record_key(Key::D, true);
        input.record_key(Key::D, false);

        let first = input.take_frame();
        let second = input.take_frame();

        assert_eq!(first.key_events, vec![(Key::D, true), (Key::D, false)]);
        assert!(second.key_events.is_empty());
    }

    #[test]
    fn escape_press_requests_quit() {
        let mut input = InputCollector::default();
        input.record_key(Key::Escape, true);
        assert!(input.take_frame().quit);
    }

    #[test]
    fn click_captures_cursor_position_for_single_frame() {
        let mut input = InputCollector::default();
        input.set_cursor_position(120.0, 240.0);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);

        let first = input.take_frame();
        let second = input.take_frame();

        assert_eq!(first.mouse_click, Some((120.0, 240.0)));
        assert_eq!(second.mouse_click, None);
    }

    #[test]
    fn held_click_does_not_retrigger() {
        let mut input = InputCollector::default();
        input.set_cursor_position(10.0, 10.0);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let _ = input.take_frame();

        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert_eq!(input.take_frame().mouse_click, None);

        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert_eq!(input.take_frame().mouse_click, Some((10.0, 10.0)));
    }

    #[test]
    fn click_without_cursor_position_is_ignored() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert_eq!(input.take_frame().mouse_click, None);
    }
}
