//! Host functions exposed to cartridge scripts.
//!
//! Every session owns one [`ScriptEngine`], a fresh Lua state with the
//! bindings below installed as globals. Draw calls never touch the renderer:
//! they append to a display list that the session replays once `draw`
//! returns, so a failing `draw` leaves nothing half-rendered.
//!
//! | global | arguments |
//! |---|---|
//! | `log(message)` | any value; extra arguments are ignored |
//! | `text(message, x, y, colorIndex)` | any value, int, int, palette index |
//! | `print(message, {x, y}, color)` | any value, vector, color |
//! | `rect(x, y, w, h, color)` | int, int, int, int, color |
//! | `clear(color)` | color |
//! | `spr(n, x, y)` | sprite tile, int, int |
//! | `mget(x, y)` | map cell |
//! | `btn(key)`, `btnp(key)` | key code |
//! | `frame()` | |
//!
//! Messages are rendered as Lua's `tostring` would. A color is a palette
//! index or an `{r, g, b, a}` table.

pub mod convert;

use std::cell::RefCell;
use std::rc::Rc;

use fantasy_common::{Color, Key};
use mlua::{Lua, MultiValue, Value};
use thiserror::Error;

use crate::cartridge::SpriteMap;
use crate::graphics::Rect;
use crate::input::InputState;
use crate::profile::Palette;
use convert::{
    color_arg, coord_arg, display, expect_arity, int_arg, key_arg, vector_from_table,
    ConversionError,
};

/// What happens when a script hands a host function malformed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeErrorPolicy {
    /// Log, record, skip the call and return `nil, message` to the script.
    #[default]
    SkipCall,
    /// Raise a Lua error; uncaught, it stops the session.
    Raise,
}

/// A conversion failure attributed to the host function that hit it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{function}: {source}")]
pub struct BridgeError {
    pub function: &'static str,
    #[source]
    pub source: ConversionError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    Clear(Color),
    Rect {
        rect: Rect,
        color: Color,
    },
    Text {
        text: String,
        x: i32,
        y: i32,
        color: Color,
    },
    Sprite {
        tile: u32,
        x: i32,
        y: i32,
    },
}

/// Native state the host functions read and write.
#[derive(Debug)]
pub struct HostState {
    palette: Palette,
    sprite_tiles: u32,
    sprite_map: Option<SpriteMap>,
    policy: BridgeErrorPolicy,
    commands: Vec<DrawCommand>,
    transcript: Vec<String>,
    diagnostics: Vec<BridgeError>,
    input: InputState,
    frame: u64,
}

impl HostState {
    pub fn new(
        palette: Palette,
        sprite_tiles: u32,
        sprite_map: Option<SpriteMap>,
        policy: BridgeErrorPolicy,
    ) -> Self {
        Self {
            palette,
            sprite_tiles,
            sprite_map,
            policy,
            commands: Vec::new(),
            transcript: Vec::new(),
            diagnostics: Vec::new(),
            input: InputState::default(),
            frame: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn take_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }

    pub fn diagnostics(&self) -> &[BridgeError] {
        &self.diagnostics
    }

    pub fn set_input(&mut self, input: &InputState) {
        self.input.clone_from(input);
    }

    pub fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }
}

pub type SharedHost = Rc<RefCell<HostState>>;

/// One isolated Lua environment with the console bindings installed.
pub struct ScriptEngine {
    lua: Lua,
    host: SharedHost,
}

impl ScriptEngine {
    pub fn new(host: SharedHost) -> mlua::Result<Self> {
        let lua = Lua::new();
        install(&lua, &host)?;
        Ok(Self { lua, host })
    }

    /// Run a chunk at top level, defining the script's globals.
    pub fn exec(&self, name: &str, source: &str) -> mlua::Result<()> {
        self.lua.load(source).set_name(name).exec()
    }

    /// Call the global function `name` with no arguments, discarding its
    /// result. A missing entry point is not an error; `Ok(false)` reports it.
    pub fn call_entry(&self, name: &str) -> mlua::Result<bool> {
        match self.lua.globals().get::<Value>(name)? {
            Value::Nil => Ok(false),
            Value::Function(function) => {
                function.call::<()>(())?;
                Ok(true)
            }
            other => Err(mlua::Error::RuntimeError(format!(
                "`{name}` is a {}, not a function",
                other.type_name()
            ))),
        }
    }

    /// Drop state left over from the previous frame's calls.
    pub fn reset_frame(&self) {
        let stale = self.host.borrow_mut().take_commands();
        if !stale.is_empty() {
            log::debug!("discarding {} draw calls made outside draw", stale.len());
        }
        self.lua.expire_registry_values();
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    pub fn memory_used(&self) -> usize {
        self.lua.used_memory()
    }
}

type HostFn = fn(&Lua, &mut HostState, Vec<Value>) -> Result<Value, ConversionError>;

fn install(lua: &Lua, host: &SharedHost) -> mlua::Result<()> {
    // `None` accepts any argument count.
    let bindings: [(&'static str, Option<usize>, HostFn); 10] = [
        ("log", None, host_log),
        ("text", Some(4), host_text),
        ("print", Some(3), host_print),
        ("rect", Some(5), host_rect),
        ("clear", Some(1), host_clear),
        ("spr", Some(3), host_spr),
        ("mget", Some(2), host_mget),
        ("btn", Some(1), host_btn),
        ("btnp", Some(1), host_btnp),
        ("frame", Some(0), host_frame),
    ];
    for (name, arity, function) in bindings {
        register(lua, host, name, arity, function)?;
    }

    let buttons = lua.create_table()?;
    buttons.set("A", Key::Z.code())?;
    buttons.set("B", Key::X.code())?;
    buttons.set("up", Key::Up.code())?;
    buttons.set("down", Key::Down.code())?;
    buttons.set("left", Key::Left.code())?;
    buttons.set("right", Key::Right.code())?;
    lua.globals().set("buttons", buttons)?;
    Ok(())
}

fn register(
    lua: &Lua,
    host: &SharedHost,
    name: &'static str,
    arity: Option<usize>,
    function: HostFn,
) -> mlua::Result<()> {
    let host = Rc::clone(host);
    let binding = lua.create_function(move |lua, args: MultiValue| {
        let mut host = host.borrow_mut();
        let args: Vec<Value> = args.into_iter().collect();
        let checked = match arity {
            Some(expected) => expect_arity(args, expected),
            None => Ok(args),
        };
        match checked.and_then(|args| function(lua, &mut host, args)) {
            Ok(value) => Ok(MultiValue::from_vec(vec![value])),
            Err(source) => {
                let error = BridgeError {
                    function: name,
                    source,
                };
                log::warn!("{error}");
                host.diagnostics.push(error.clone());
                match host.policy {
                    BridgeErrorPolicy::SkipCall => {
                        let message = lua.create_string(error.to_string())?;
                        Ok(MultiValue::from_vec(vec![Value::Nil, Value::String(message)]))
                    }
                    BridgeErrorPolicy::Raise => Err(mlua::Error::external(error)),
                }
            }
        }
    })?;
    lua.globals().set(name, binding)
}

fn host_log(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let message = display(lua, args.first().unwrap_or(&Value::Nil));
    log::info!(target: "cartridge", "{message}");
    host.transcript.push(message);
    Ok(Value::Nil)
}

fn host_text(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let [message, x, y, color] = take::<4>(args);
    let text = display(lua, &message);
    let x = coord_arg(lua, x, "x")?;
    let y = coord_arg(lua, y, "y")?;
    let color = host.palette.color_at(int_arg(lua, color, "colorIndex")?)?;
    host.commands.push(DrawCommand::Text { text, x, y, color });
    Ok(Value::Boolean(true))
}

fn host_print(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let [message, position, color] = take::<3>(args);
    let text = display(lua, &message);
    let (x, y) = vector_from_table(&position)?;
    let color = color_arg(lua, color, &host.palette)?;
    host.commands.push(DrawCommand::Text { text, x, y, color });
    Ok(Value::Boolean(true))
}

fn host_rect(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let [x, y, w, h, color] = take::<5>(args);
    let rect = Rect::new(
        coord_arg(lua, x, "x")?,
        coord_arg(lua, y, "y")?,
        coord_arg(lua, w, "w")?,
        coord_arg(lua, h, "h")?,
    );
    let color = color_arg(lua, color, &host.palette)?;
    host.commands.push(DrawCommand::Rect { rect, color });
    Ok(Value::Boolean(true))
}

fn host_clear(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let [color] = take::<1>(args);
    let color = color_arg(lua, color, &host.palette)?;
    host.commands.push(DrawCommand::Clear(color));
    Ok(Value::Boolean(true))
}

fn host_spr(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let [n, x, y] = take::<3>(args);
    let sprite = int_arg(lua, n, "n")?;
    let tile = u32::try_from(sprite)
        .ok()
        .filter(|&tile| tile < host.sprite_tiles)
        .ok_or(ConversionError::UnknownSprite {
            sprite,
            tiles: host.sprite_tiles,
        })?;
    let x = coord_arg(lua, x, "x")?;
    let y = coord_arg(lua, y, "y")?;
    host.commands.push(DrawCommand::Sprite { tile, x, y });
    Ok(Value::Boolean(true))
}

fn host_mget(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let [x, y] = take::<2>(args);
    let x = int_arg(lua, x, "x")?;
    let y = int_arg(lua, y, "y")?;
    Ok(host
        .sprite_map
        .as_ref()
        .and_then(|map| map.get(x, y))
        .map_or(Value::Nil, |tile| Value::Integer(tile as i64)))
}

fn host_btn(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let [key] = take::<1>(args);
    let key = key_arg(lua, key)?;
    Ok(Value::Boolean(host.input.is_down(key)))
}

fn host_btnp(lua: &Lua, host: &mut HostState, args: Vec<Value>) -> Result<Value, ConversionError> {
    let [key] = take::<1>(args);
    let key = key_arg(lua, key)?;
    Ok(Value::Boolean(host.input.is_pressed(key)))
}

fn host_frame(_lua: &Lua, host: &mut HostState, _args: Vec<Value>) -> Result<Value, ConversionError> {
    Ok(Value::Integer(host.frame as i64))
}

/// Split arity-checked arguments into a fixed-size array.
fn take<const N: usize>(args: Vec<Value>) -> [Value; N] {
    let mut args = args.into_iter();
    std::array::from_fn(|_| args.next().unwrap_or(Value::Nil))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ConsoleProfile;

    fn engine(policy: BridgeErrorPolicy) -> ScriptEngine {
        let palette = ConsoleProfile::default_profile().palette().clone();
        let map = SpriteMap::new(2, 1, [0u8, 0]);
        let host = HostState::new(palette, 1, Some(map), policy);
        ScriptEngine::new(Rc::new(RefCell::new(host))).unwrap()
    }

    #[test]
    fn text_queues_a_palette_colored_command() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine.exec("t", "text('HI', 1, 2, 2)").unwrap();
        assert_eq!(
            engine.host().borrow().commands(),
            &[DrawCommand::Text {
                text: "HI".to_string(),
                x: 1,
                y: 2,
                color: Color::WHITE
            }]
        );
    }

    #[test]
    fn text_with_unknown_color_is_skipped_and_reported() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine
            .exec("t", "ok, err = text('HI', 0, 0, 42); log(ok); log(err)")
            .unwrap();
        let mut host = engine.host().borrow_mut();
        assert!(host.commands().is_empty());
        assert_eq!(host.diagnostics().len(), 1);
        assert_eq!(host.diagnostics()[0].function, "text");
        let transcript = host.take_transcript();
        assert_eq!(transcript[0], "nil");
        assert!(transcript[1].starts_with("text: palette index 42 out of range"));
    }

    #[test]
    fn raise_policy_turns_conversion_failures_into_lua_errors() {
        let engine = engine(BridgeErrorPolicy::Raise);
        let err = engine.exec("t", "rect(0, 0, 1, 1, { r = 1 })").unwrap_err();
        assert!(err.to_string().contains("missing field `g`"));
        assert!(engine.host().borrow().commands().is_empty());
    }

    #[test]
    fn raised_errors_can_be_caught_by_the_script() {
        let engine = engine(BridgeErrorPolicy::Raise);
        engine
            .exec("t", "local ok = pcall(clear, 77); log(ok)")
            .unwrap();
        assert_eq!(engine.host().borrow_mut().take_transcript(), vec!["false"]);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine.exec("t", "text('x', 0, 0)").unwrap();
        let host = engine.host().borrow();
        assert!(matches!(
            host.diagnostics()[0].source,
            ConversionError::Arity {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn log_takes_the_first_argument_or_nil() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine.exec("t", "log(); log('a', 'b'); log(1e100)").unwrap();
        let mut host = engine.host().borrow_mut();
        assert!(host.diagnostics().is_empty());
        assert_eq!(host.take_transcript(), vec!["nil", "a", "1e+100"]);
    }

    #[test]
    fn text_messages_are_coerced_like_tostring() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine
            .exec(
                "t",
                "text(true, 0, 0, 2); text(nil, 0, 0, 2); print(2.5, { x = 0, y = 0 }, 2)",
            )
            .unwrap();
        let host = engine.host().borrow();
        assert!(host.diagnostics().is_empty());
        let texts: Vec<&str> = host
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["true", "nil", "2.5"]);
    }

    #[test]
    fn print_rect_and_clear_accept_color_tables() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine
            .exec(
                "t",
                "clear(1)\n\
                 rect(1, 2, 3, 4, { r = 10, g = 20, b = 30, a = 40 })\n\
                 print('P', { x = 5, y = 6 }, 3)",
            )
            .unwrap();
        assert_eq!(
            engine.host().borrow().commands(),
            &[
                DrawCommand::Clear(Color::BLACK),
                DrawCommand::Rect {
                    rect: Rect::new(1, 2, 3, 4),
                    color: Color::new_rgba(10, 20, 30, 40)
                },
                DrawCommand::Text {
                    text: "P".to_string(),
                    x: 5,
                    y: 6,
                    color: Color::RED
                },
            ]
        );
    }

    #[test]
    fn spr_checks_tile_exists() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine.exec("t", "spr(0, 4, 4); spr(1, 0, 0)").unwrap();
        let host = engine.host().borrow();
        assert_eq!(
            host.commands(),
            &[DrawCommand::Sprite { tile: 0, x: 4, y: 4 }]
        );
        assert!(matches!(
            host.diagnostics()[0].source,
            ConversionError::UnknownSprite { sprite: 1, tiles: 1 }
        ));
    }

    #[test]
    fn input_queries_read_the_frame_snapshot() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        let mut input = InputState::new();
        input.handle_key_event(Key::Z, true);
        engine.host().borrow_mut().set_input(&input);
        engine
            .exec(
                "t",
                "log(btn(buttons.A)); log(btnp(buttons.A)); log(btn(buttons.left))",
            )
            .unwrap();
        assert_eq!(
            engine.host().borrow_mut().take_transcript(),
            vec!["true", "true", "false"]
        );
    }

    #[test]
    fn unknown_key_code_is_reported() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine.exec("t", "btn(12345)").unwrap();
        assert!(matches!(
            engine.host().borrow().diagnostics()[0].source,
            ConversionError::UnknownKey(12345)
        ));
    }

    #[test]
    fn mget_and_frame_return_values() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine.host().borrow_mut().set_frame(9);
        engine
            .exec("t", "log(mget(1, 0)); log(mget(5, 5)); log(frame())")
            .unwrap();
        assert_eq!(
            engine.host().borrow_mut().take_transcript(),
            vec!["0", "nil", "9"]
        );
    }

    #[test]
    fn missing_entry_point_is_not_an_error() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        assert!(!engine.call_entry("update").unwrap());
        engine.exec("t", "function update() end").unwrap();
        assert!(engine.call_entry("update").unwrap());
    }

    #[test]
    fn non_function_entry_point_is_an_error() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine.exec("t", "draw = 3").unwrap();
        assert!(engine.call_entry("draw").is_err());
    }

    #[test]
    fn reset_frame_discards_pending_commands() {
        let engine = engine(BridgeErrorPolicy::SkipCall);
        engine.exec("t", "clear(1)").unwrap();
        engine.reset_frame();
        assert!(engine.host().borrow().commands().is_empty());
    }
}
