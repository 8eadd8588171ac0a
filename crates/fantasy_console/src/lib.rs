pub mod app;
pub mod bridge;
pub mod cartridge;
pub mod graphics;
pub mod headless;
pub mod input;
pub mod profile;
pub mod session;

pub use app::ConsoleApp;
pub use bridge::{BridgeError, BridgeErrorPolicy, DrawCommand};
pub use cartridge::{Cartridge, LoadError, SpriteMap, SpriteSheet};
pub use graphics::{Framebuffer, Image, Rect, Renderer};
pub use headless::HeadlessContext;
pub use input::InputState;
pub use profile::{ConsoleProfile, Palette, PaletteError};
pub use session::{FrameOutcome, ScriptError, Session, SessionOptions, SessionState, StopReason};

/// Default integer scaling factor for windowed frontends.
pub const SCREEN_SCALE: u32 = 4;
