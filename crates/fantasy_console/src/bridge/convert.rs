//! Script value to native value conversions used at every host-function
//! boundary. Malformed input is an error, never a default.

use fantasy_common::{Color, Key};
use mlua::{Lua, Table, Value};
use thiserror::Error;

use crate::profile::{Palette, PaletteError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("expected {expected} arguments, got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("`{name}` must be a number, got {type_name}")]
    NotANumber {
        name: &'static str,
        type_name: &'static str,
    },
    #[error("`{name}` must be an integer, got {value}")]
    NotAnInteger { name: &'static str, value: f64 },
    #[error("`{name}` is {value}, expected {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("`{name}` must be a table, got {type_name}")]
    NotATable {
        name: &'static str,
        type_name: &'static str,
    },
    #[error("unknown key code {0}")]
    UnknownKey(i64),
    #[error("sprite {sprite} does not exist (sheet has {tiles} tiles)")]
    UnknownSprite { sprite: i64, tiles: u32 },
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error("script engine: {0}")]
    Engine(String),
}

impl From<mlua::Error> for ConversionError {
    fn from(err: mlua::Error) -> Self {
        ConversionError::Engine(err.to_string())
    }
}

/// Check a call's argument count against the function's fixed arity.
pub fn expect_arity(args: Vec<Value>, expected: usize) -> Result<Vec<Value>, ConversionError> {
    if args.len() != expected {
        return Err(ConversionError::Arity {
            expected,
            actual: args.len(),
        });
    }
    Ok(args)
}

/// Render any value the way Lua's `tostring` does for scalars; tables,
/// functions and userdata render as their type name. Never fails.
pub fn display(lua: &Lua, value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(_) | Value::Number(_) | Value::String(_) => lua
            .coerce_string(value.clone())
            .ok()
            .flatten()
            .map_or_else(|| value.type_name().to_string(), |s| s.to_string_lossy().to_string()),
        other => other.type_name().to_string(),
    }
}

/// Coerce an argument to an integer: integers, integral floats and numeric
/// strings are accepted.
pub fn int_arg(lua: &Lua, value: Value, name: &'static str) -> Result<i64, ConversionError> {
    let type_name = value.type_name();
    let float = match value {
        Value::Number(n) => Some(n),
        _ => None,
    };
    match lua.coerce_integer(value)? {
        Some(i) => Ok(i),
        None => Err(match float {
            Some(value) => ConversionError::NotAnInteger { name, value },
            None => ConversionError::NotANumber { name, type_name },
        }),
    }
}

/// Screen coordinate or extent.
pub fn coord_arg(lua: &Lua, value: Value, name: &'static str) -> Result<i32, ConversionError> {
    let value = int_arg(lua, value, name)?;
    narrow(value, name, i32::MIN as i64, i32::MAX as i64).map(|v| v as i32)
}

pub fn key_arg(lua: &Lua, value: Value) -> Result<Key, ConversionError> {
    let code = int_arg(lua, value, "key")?;
    Key::from_code(code).ok_or(ConversionError::UnknownKey(code))
}

/// A color argument: either a palette index or an `{r, g, b, a}` table.
pub fn color_arg(
    lua: &Lua,
    value: Value,
    palette: &Palette,
) -> Result<Color, ConversionError> {
    match value {
        Value::Table(_) => color_from_table(&value),
        other => {
            let index = int_arg(lua, other, "color")?;
            Ok(palette.color_at(index)?)
        }
    }
}

/// Read `{r, g, b, a}`. Every channel must be present and an integer in
/// `0..=255`.
pub fn color_from_table(value: &Value) -> Result<Color, ConversionError> {
    let table = as_table(value, "color")?;
    let channel = |name: &'static str| narrow(integer_field(table, name)?, name, 0, 255).map(|v| v as u8);
    Ok(Color::new_rgba(
        channel("r")?,
        channel("g")?,
        channel("b")?,
        channel("a")?,
    ))
}

/// Read `{x, y}`. Both fields must be present and integer-valued.
pub fn vector_from_table(value: &Value) -> Result<(i32, i32), ConversionError> {
    let table = as_table(value, "vector")?;
    let component = |name: &'static str| {
        narrow(integer_field(table, name)?, name, i32::MIN as i64, i32::MAX as i64)
            .map(|v| v as i32)
    };
    Ok((component("x")?, component("y")?))
}

fn as_table<'a>(value: &'a Value, name: &'static str) -> Result<&'a Table, ConversionError> {
    match value {
        Value::Table(table) => Ok(table),
        other => Err(ConversionError::NotATable {
            name,
            type_name: other.type_name(),
        }),
    }
}

/// Strict numeric field read: no string coercion, no metamethods.
fn integer_field(table: &Table, name: &'static str) -> Result<i64, ConversionError> {
    match table.raw_get::<Value>(name)? {
        Value::Nil => Err(ConversionError::MissingField(name)),
        Value::Integer(i) => Ok(i),
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 => {
            if n < i64::MIN as f64 || n >= i64::MAX as f64 {
                return Err(ConversionError::NotAnInteger { name, value: n });
            }
            Ok(n as i64)
        }
        Value::Number(n) => Err(ConversionError::NotAnInteger { name, value: n }),
        other => Err(ConversionError::NotANumber {
            name,
            type_name: other.type_name(),
        }),
    }
}

fn narrow(value: i64, name: &'static str, min: i64, max: i64) -> Result<i64, ConversionError> {
    if value < min || value > max {
        return Err(ConversionError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
