use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use typed_builder::TypedBuilder;

pub use fantasy_common;
pub use fantasy_common::app::App;
pub use sdl2;

use fantasy_common::key::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB24,
}

#[derive(TypedBuilder)]
pub struct SdlInitInfo {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub title: String,
    #[builder(default = 60)]
    pub fps: u32,
    #[builder(default = PixelFormat::RGB24)]
    pub pixel_format: PixelFormat,
}

impl SdlInitInfo {
    /// Window settings taken from the app itself.
    pub fn for_app(app: &impl App) -> Self {
        Self::builder()
            .width(app.width())
            .height(app.height())
            .scale(app.scale())
            .title(app.title())
            .fps(app.fps())
            .build()
    }
}

/// Destination rectangle that fits a `canvas`-sized image inside `window`,
/// keeping the aspect ratio and centering the leftover space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

pub fn letterbox(canvas: (u32, u32), window: (u32, u32)) -> LetterBox {
    let (canvas_w, canvas_h) = (canvas.0.max(1) as f32, canvas.1.max(1) as f32);
    let (window_w, window_h) = (window.0 as f32, window.1 as f32);
    let scale = (window_w / canvas_w).min(window_h / canvas_h);
    let w = scale * canvas_w;
    let h = scale * canvas_h;
    LetterBox {
        x: ((window_w - w) * 0.5) as i32,
        y: ((window_h - h) * 0.5) as i32,
        width: w as u32,
        height: h as u32,
    }
}

pub struct SdlContext;

impl SdlContext {
    pub fn run(sdl_init_info: SdlInitInfo, mut app: impl App) -> Result<()> {
        let SdlInitInfo {
            width,
            height,
            scale,
            title,
            fps,
            pixel_format,
        } = sdl_init_info;

        let sdl_context = sdl2::init().map_err(|e| anyhow!(e))?;
        let video_subsystem = sdl_context.video().map_err(|e| anyhow!(e))?;
        let window = video_subsystem
            .window(&title, width * scale, height * scale)
            .position_centered()
            .resizable()
            .build()?;
        log::info!(
            "opened \"{title}\" at {}x{} ({width}x{height} x{scale}, {fps} fps)",
            width * scale,
            height * scale
        );
        let mut canvas = window.into_canvas().present_vsync().build()?;
        let creator = canvas.texture_creator();
        let mut texture =
            creator.create_texture_streaming(map_pixel_format(pixel_format), width, height)?;

        let color_size = map_pixel_format_size(pixel_format);
        let mut screen_state = vec![0u8; (width * color_size * height) as usize];
        let mut event_pump = sdl_context.event_pump().map_err(|e| anyhow!(e))?;

        let target_frame = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        let mut last_frame = Instant::now();

        app.init();
        loop {
            if app.should_exit() {
                log::info!("exit requested");
                app.exit();
                break;
            }

            for event in event_pump.poll_iter() {
                match event {
                    Event::Quit { .. } => {
                        log::info!("window closed");
                        app.exit();
                        return Ok(());
                    }
                    Event::KeyDown {
                        keycode: Some(keycode),
                        repeat: false,
                        ..
                    } => {
                        app.handle_key_event(map_keycode(keycode), true);
                    }
                    Event::KeyUp {
                        keycode: Some(keycode),
                        ..
                    } => {
                        app.handle_key_event(map_keycode(keycode), false);
                    }
                    _ => {}
                }
            }

            app.update(&mut screen_state);

            texture.update(None, &screen_state, (width * color_size) as usize)?;
            let window_size = canvas.output_size().map_err(|e| anyhow!(e))?;
            let dst = letterbox((width, height), window_size);
            canvas.set_draw_color(sdl2::pixels::Color::RGB(0, 0, 0));
            canvas.clear();
            canvas
                .copy(
                    &texture,
                    None,
                    sdl2::rect::Rect::new(dst.x, dst.y, dst.width, dst.height),
                )
                .map_err(|e| anyhow!(e))?;
            canvas.present();

            let elapsed = last_frame.elapsed();
            if elapsed < target_frame {
                std::thread::sleep(target_frame - elapsed);
            }
            last_frame = Instant::now();
        }

        Ok(())
    }
}

pub fn map_pixel_format(pixel_format: PixelFormat) -> PixelFormatEnum {
    match pixel_format {
        PixelFormat::RGB24 => PixelFormatEnum::RGB24,
    }
}

pub fn map_pixel_format_size(pixel_format: PixelFormat) -> u32 {
    match pixel_format {
        PixelFormat::RGB24 => 3,
    }
}

pub fn map_keycode(keycode: Keycode) -> Key {
    match keycode {
        Keycode::Num1 | Keycode::Kp1 => Key::Num1,
        Keycode::Num2 | Keycode::Kp2 => Key::Num2,
        Keycode::Num3 | Keycode::Kp3 => Key::Num3,
        Keycode::Num4 | Keycode::Kp4 => Key::Num4,
        Keycode::Q => Key::Q,
        Keycode::W => Key::W,
        Keycode::E => Key::E,
        Keycode::R => Key::R,
        Keycode::A => Key::A,
        Keycode::S => Key::S,
        Keycode::D => Key::D,
        Keycode::F => Key::F,
        Keycode::Z => Key::Z,
        Keycode::X => Key::X,
        Keycode::C => Key::C,
        Keycode::V => Key::V,
        Keycode::P => Key::P,
        Keycode::T => Key::T,
        Keycode::J => Key::J,
        Keycode::K => Key::K,
        Keycode::L => Key::L,
        Keycode::Left => Key::Left,
        Keycode::Right => Key::Right,
        Keycode::Up => Key::Up,
        Keycode::Down => Key::Down,
        Keycode::Space => Key::Space,
        Keycode::Return | Keycode::KpEnter => Key::Enter,
        Keycode::Escape => Key::Escape,
        Keycode::Backspace => Key::Backspace,
        _ => Key::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_fills_matching_aspect() {
        assert_eq!(
            letterbox((128, 128), (512, 512)),
            LetterBox {
                x: 0,
                y: 0,
                width: 512,
                height: 512
            }
        );
    }

    #[test]
    fn letterbox_centers_on_the_short_axis() {
        assert_eq!(
            letterbox((128, 128), (800, 512)),
            LetterBox {
                x: 144,
                y: 0,
                width: 512,
                height: 512
            }
        );
        assert_eq!(
            letterbox((160, 120), (320, 480)),
            LetterBox {
                x: 0,
                y: 120,
                width: 320,
                height: 240
            }
        );
    }

    #[test]
    fn keycodes_map_to_console_buttons() {
        assert_eq!(map_keycode(Keycode::Z), Key::Z);
        assert_eq!(map_keycode(Keycode::Return), Key::Enter);
        assert_eq!(map_keycode(Keycode::F12), Key::None);
    }
}
