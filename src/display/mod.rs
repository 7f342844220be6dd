//! SDL2 window display for the analysis overlay.
//! Uses the sdl2 crate for window management and rendering.

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;
use tracing::info;

use crate::error::{Error, Result};

/// Advisory frame presenter. Presentation never affects the stored
/// recording; it exists so a human can watch the overlay.
pub trait VideoDisplay {
    /// Shows one RGB24 frame. Returns `false` once the user asked to close.
    fn present(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<bool>;

    /// Blocks until the user acknowledges with a keypress or window close.
    fn wait_for_ack(&mut self) -> Result<()>;
}

/// SDL2 Window Display
/// Handles window creation, the event pump, and frame rendering.
pub struct Sdl2Display {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    event_pump: EventPump,
}

impl Sdl2Display {
    pub fn new(sdl_context: &sdl2::Sdl, width: u32, height: u32) -> Result<Self> {
        let video_subsystem = sdl_context.video().map_err(Error::Display)?;

        let window = video_subsystem
            .window("Flight Recording Analysis", width, height)
            .position_centered()
            .build()
            .map_err(|e| Error::Display(e.to_string()))?;

        let canvas = window
            .into_canvas()
            .present_vsync()
            .build()
            .map_err(|e| Error::Display(e.to_string()))?;
        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump().map_err(Error::Display)?;

        Ok(Self {
            canvas,
            texture_creator,
            event_pump,
        })
    }
}

impl VideoDisplay for Sdl2Display {
    fn present(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<bool> {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => {
                    info!("close requested");
                    return Ok(false);
                }
                _ => {}
            }
        }

        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::RGB24, width, height)
            .map_err(|e| Error::Display(e.to_string()))?;

        texture
            .update(None, pixels, (width * 3) as usize)
            .map_err(|e| Error::Display(e.to_string()))?;

        self.canvas.clear();
        self.canvas.copy(&texture, None, None).map_err(Error::Display)?;
        self.canvas.present();
        Ok(true)
    }

    fn wait_for_ack(&mut self) -> Result<()> {
        loop {
            match self.event_pump.wait_event() {
                Event::Quit { .. } | Event::KeyDown { .. } => return Ok(()),
                _ => {}
            }
        }
    }
}
