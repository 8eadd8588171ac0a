use std::cell::RefCell;
use std::rc::Rc;

use fantasy_common::Color;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::bridge::{BridgeError, BridgeErrorPolicy, DrawCommand, HostState, ScriptEngine, SharedHost};
use crate::cartridge::{Cartridge, LoadError};
use crate::graphics::{Image, Renderer};
use crate::input::InputState;
use crate::profile::ConsoleProfile;

/// Per-run settings that are not part of the console itself.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct SessionOptions {
    /// Where the sprite sheet is composited every frame.
    #[builder(default = (0, 32))]
    pub sprite_origin: (i32, i32),
    #[builder(default = Color::BLACK)]
    pub background: Color,
    #[builder(default)]
    pub error_policy: BridgeErrorPolicy,
    /// Stop after this many completed frames.
    #[builder(default, setter(strip_option))]
    pub frame_limit: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A Lua error raised while running a cartridge entry point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("script error in `{entry_point}`: {message}")]
pub struct ScriptError {
    pub entry_point: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    CloseRequested,
    FrameLimit,
    LoadFailed(String),
    Script(ScriptError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Running,
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    Stopped,
}

/// One run of one cartridge.
///
/// A session owns its Lua state and decoded sprite sheet exclusively;
/// both are released when it stops. Nothing carries over to the next
/// session, so two runs of the same cartridge never see each other's globals.
pub struct Session {
    profile: ConsoleProfile,
    options: SessionOptions,
    state: SessionState,
    name: String,
    engine: Option<ScriptEngine>,
    host: Option<SharedHost>,
    sprite_sheet: Option<Image>,
    frame_count: u64,
}

impl Session {
    pub fn new(profile: ConsoleProfile, options: SessionOptions) -> Self {
        Self {
            profile,
            options,
            state: SessionState::Idle,
            name: String::new(),
            engine: None,
            host: None,
            sprite_sheet: None,
            frame_count: 0,
        }
    }

    /// Create a session and load `cartridge` into it.
    pub fn start(
        profile: ConsoleProfile,
        cartridge: &Cartridge,
        options: SessionOptions,
    ) -> Result<Self, LoadError> {
        let mut session = Self::new(profile, options);
        session.load(cartridge)?;
        Ok(session)
    }

    /// `Idle -> Loading -> Running`. On failure the session ends up
    /// `Stopped` with nothing left allocated.
    pub fn load(&mut self, cartridge: &Cartridge) -> Result<(), LoadError> {
        if self.state != SessionState::Idle {
            log::warn!("session for '{}' already used, ignoring load", self.name);
            return Ok(());
        }
        self.name.clone_from(&cartridge.name);
        self.set_state(SessionState::Loading);
        match self.try_load(cartridge) {
            Ok(()) => {
                self.set_state(SessionState::Running);
                Ok(())
            }
            Err(err) => {
                log::error!("failed to load '{}': {err}", self.name);
                self.stop(StopReason::LoadFailed(err.to_string()));
                Err(err)
            }
        }
    }

    fn try_load(&mut self, cartridge: &Cartridge) -> Result<(), LoadError> {
        let sheet = cartridge.validate(&self.profile)?;
        let host = Rc::new(RefCell::new(HostState::new(
            self.profile.palette().clone(),
            sheet.tile_count(),
            cartridge.sprite_map.clone(),
            self.options.error_policy,
        )));
        // Keep the host even if the script fails so its log output survives.
        self.host = Some(Rc::clone(&host));
        let engine = ScriptEngine::new(host)?;
        engine
            .exec(&cartridge.name, &cartridge.script)
            .map_err(|err| LoadError::Script {
                name: cartridge.name.clone(),
                message: err.to_string(),
            })?;
        self.engine = Some(engine);
        self.sprite_sheet = Some(sheet);
        Ok(())
    }

    /// Run one frame: reset per-frame state, `draw`, composite, present,
    /// then `update`. `draw` always sees the state the previous `update`
    /// left behind.
    ///
    /// The close signal is the driver's business and is polled before this
    /// is called.
    pub fn frame(&mut self, renderer: &mut dyn Renderer, input: &InputState) -> FrameOutcome {
        if self.state != SessionState::Running {
            return FrameOutcome::Stopped;
        }
        if self
            .options
            .frame_limit
            .is_some_and(|limit| self.frame_count >= limit)
        {
            self.stop(StopReason::FrameLimit);
            return FrameOutcome::Stopped;
        }
        let (Some(engine), Some(sheet)) = (&self.engine, &self.sprite_sheet) else {
            return FrameOutcome::Stopped;
        };

        engine.reset_frame();
        {
            let mut host = engine.host().borrow_mut();
            host.set_input(input);
            host.set_frame(self.frame_count);
        }

        // A failed draw throws its display list away; nothing reaches the
        // renderer for this frame.
        if let Err(err) = engine.call_entry("draw") {
            self.fail("draw", err);
            return FrameOutcome::Stopped;
        }
        let commands = engine.host().borrow_mut().take_commands();
        renderer.begin_frame(self.options.background);
        replay(renderer, sheet, &commands);
        let (x, y) = self.options.sprite_origin;
        renderer.draw_image(sheet, sheet.bounds(), x, y);
        renderer.end_frame();

        if let Err(err) = engine.call_entry("update") {
            self.fail("update", err);
            return FrameOutcome::Stopped;
        }

        self.frame_count += 1;
        FrameOutcome::Presented
    }

    /// Stop in response to the frontend's close signal.
    pub fn request_close(&mut self) {
        if matches!(self.state, SessionState::Running | SessionState::Loading) {
            self.stop(StopReason::CloseRequested);
        }
    }

    fn fail(&mut self, entry_point: &'static str, err: mlua::Error) {
        let error = ScriptError {
            entry_point,
            message: err.to_string(),
        };
        log::error!("'{}' stopped: {error}", self.name);
        self.stop(StopReason::Script(error));
    }

    /// `-> Stopped`, releasing the Lua state and the sprite texture.
    pub fn stop(&mut self, reason: StopReason) {
        if let Some(engine) = self.engine.take() {
            log::debug!(
                "releasing script engine for '{}' ({} bytes in use)",
                self.name,
                engine.memory_used()
            );
        }
        self.sprite_sheet = None;
        self.set_state(SessionState::Stopped(reason));
    }

    fn set_state(&mut self, state: SessionState) {
        log::info!("session '{}': {:?} -> {:?}", self.name, self.state, state);
        self.state = state;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> &ConsoleProfile {
        &self.profile
    }

    /// Number of frames whose `draw` and `update` both completed.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn sprite_sheet(&self) -> Option<&Image> {
        self.sprite_sheet.as_ref()
    }

    /// Messages the script passed to `log` since the last call.
    pub fn take_transcript(&mut self) -> Vec<String> {
        self.host
            .as_ref()
            .map(|host| host.borrow_mut().take_transcript())
            .unwrap_or_default()
    }

    /// Every bridge conversion failure seen so far.
    pub fn diagnostics(&self) -> Vec<BridgeError> {
        self.host
            .as_ref()
            .map(|host| host.borrow().diagnostics().to_vec())
            .unwrap_or_default()
    }
}

fn replay(renderer: &mut dyn Renderer, sheet: &Image, commands: &[DrawCommand]) {
    for command in commands {
        match command {
            DrawCommand::Clear(color) => renderer.clear(*color),
            DrawCommand::Rect { rect, color } => renderer.fill_rect(*rect, *color),
            DrawCommand::Text { text, x, y, color } => renderer.draw_text(text, *x, *y, *color),
            DrawCommand::Sprite { tile, x, y } => {
                if let Some(src) = sheet.tile_rect(*tile) {
                    renderer.draw_image(sheet, src, *x, *y);
                }
            }
        }
    }
}
