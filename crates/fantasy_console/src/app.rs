use fantasy_common::app::App;
use fantasy_common::key::Key;

use crate::cartridge::Cartridge;
use crate::graphics::Framebuffer;
use crate::input::InputState;
use crate::profile::ConsoleProfile;
use crate::session::{FrameOutcome, Session, SessionOptions};
use crate::SCREEN_SCALE;

/// Frontend-facing wrapper that runs one cartridge session.
///
/// This type implements the shared `App` trait so that any frontend
/// (`fantasy_sdl2`, or the headless driver) can drive a cartridge the same
/// way: the frontend polls its close signal, then calls `update` once per
/// frame with the screen buffer to fill.
pub struct ConsoleApp {
    should_exit: bool,
    cartridge: Cartridge,
    session: Session,
    framebuffer: Framebuffer,
    input: InputState,
}

impl ConsoleApp {
    pub fn new(profile: ConsoleProfile, cartridge: Cartridge, options: SessionOptions) -> Self {
        let framebuffer = Framebuffer::new(profile.width(), profile.height());
        Self {
            should_exit: false,
            cartridge,
            session: Session::new(profile, options),
            framebuffer,
            input: InputState::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }
}

impl App for ConsoleApp {
    fn init(&mut self) {
        log::info!("starting cartridge '{}'", self.cartridge.name);
        if self.session.load(&self.cartridge).is_err() {
            self.should_exit = true;
        }
    }

    fn update(&mut self, screen_state: &mut [u8]) {
        if self.session.frame(&mut self.framebuffer, &self.input) == FrameOutcome::Stopped {
            self.should_exit = true;
        }
        self.input.end_frame();
        self.framebuffer.write_rgb24(screen_state);
    }

    fn handle_key_event(&mut self, key: Key, is_down: bool) {
        if key == Key::Escape && is_down {
            self.should_exit = true;
            return;
        }
        self.input.handle_key_event(key, is_down);
    }

    fn should_exit(&self) -> bool {
        self.should_exit
    }

    fn exit(&mut self) {
        self.session.request_close();
        log::info!(
            "cartridge '{}' exited after {} frames",
            self.cartridge.name,
            self.session.frame_count()
        );
    }

    fn width(&self) -> u32 {
        self.session.profile().width()
    }

    fn height(&self) -> u32 {
        self.session.profile().height()
    }

    fn scale(&self) -> u32 {
        SCREEN_SCALE
    }

    fn title(&self) -> String {
        self.cartridge.name.clone()
    }

    fn fps(&self) -> u32 {
        self.session.profile().fps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionState, StopReason};

    #[test]
    fn escape_requests_exit() {
        let mut app = ConsoleApp::new(
            ConsoleProfile::default_profile(),
            Cartridge::demo(),
            SessionOptions::default(),
        );
        app.init();
        assert!(!app.should_exit());
        app.handle_key_event(Key::Escape, true);
        assert!(app.should_exit());
        app.exit();
        assert_eq!(
            app.session().state(),
            &SessionState::Stopped(StopReason::CloseRequested)
        );
    }

    #[test]
    fn failed_load_exits_immediately() {
        let mut cartridge = Cartridge::demo();
        cartridge.script = "this is not lua".to_string();
        let mut app = ConsoleApp::new(
            ConsoleProfile::default_profile(),
            cartridge,
            SessionOptions::default(),
        );
        app.init();
        assert!(app.should_exit());
    }

    #[test]
    fn geometry_comes_from_the_profile() {
        let app = ConsoleApp::new(
            ConsoleProfile::alt_profile(),
            Cartridge::demo(),
            SessionOptions::default(),
        );
        assert_eq!((app.width(), app.height(), app.fps()), (128, 128, 30));
        assert_eq!(app.title(), "Demo game");
    }
}
