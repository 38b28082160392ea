use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::camera::Camera;
use crate::app::geometry::Rect;
use crate::app::world::{Gui, World, LAYER_COUNT};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const LABEL_BORDER_COLOR: [u8; 4] = [90, 90, 90, 255];
const LABEL_BORDER_PX: i32 = 2;

#[derive(Debug, Clone, Copy)]
struct Viewport {
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
}

impl ScreenRectPx {
    fn from_rect(rect: &Rect) -> Self {
        Self {
            left: rect.x.floor() as i32,
            right: rect.right().ceil() as i32,
            top: rect.y.floor() as i32,
            bottom: rect.bottom().ceil() as i32,
        }
    }

    fn shrunk(&self, amount: i32) -> Self {
        Self {
            left: self.left + amount,
            right: self.right - amount,
            top: self.top + amount,
            bottom: self.bottom - amount,
        }
    }
}

/// Flat-color rect renderer over a CPU pixel buffer. Solid objects are drawn
/// through the camera transform in layer order; GUI items are drawn last in
/// screen space, untouched by the camera.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render_world(&mut self, world: &World, camera: &Camera) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        for layer in 0..LAYER_COUNT {
            for object in world.objects() {
                if object.layer != layer || !object.visible || object.gui.is_some() {
                    continue;
                }
                if !camera.sees(&object.rect) {
                    continue;
                }
                let screen = ScreenRectPx::from_rect(&camera.apply(&object.rect));
                fill_rect(frame, viewport, screen, object.color);
            }
        }

        for layer in 0..LAYER_COUNT {
            for object in world.objects() {
                let Some(gui) = &object.gui else { continue };
                if object.layer != layer || !object.visible {
                    continue;
                }
                let screen = ScreenRectPx::from_rect(&object.rect);
                match gui {
                    Gui::HealthBar => fill_rect(frame, viewport, screen, object.color),
                    Gui::Label { .. } => {
                        fill_rect(frame, viewport, screen, LABEL_BORDER_COLOR);
                        fill_rect(
                            frame,
                            viewport,
                            screen.shrunk(LABEL_BORDER_PX),
                            object.color,
                        );
                    }
                }
            }
        }

        self.pixels.render()
    }
}

/// Writes a solid rect into the RGBA frame, clipped against the viewport.
fn fill_rect(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    let x_min = rect.left.max(0);
    let x_max = rect.right.min(viewport.width as i32);
    let y_min = rect.top.max(0);
    let y_max = rect.bottom.min(viewport.height as i32);
    if x_min >= x_max || y_min >= y_max {
        return;
    }

    for y in y_min..y_max {
        let row_start = (y as usize * viewport.width as usize + x_min as usize) * 4;
        let row_end = (y as usize * viewport.width as usize + x_max as usize) * 4;
        for pixel in frame[row_start..row_end].chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }
}
