//! Developer console variables.
//!
//! The host owns one [`Console`] and routes any line it does not handle
//! itself through [`Console::exec`]. A bare cvar name prints the value and a
//! name followed by text assigns it. Values keep the type they were
//! registered with, so `sv_paused 1` stores `true`.
//!
//! ```ignore
//! let mut console = Console::new();
//! console.register_cvar("sv_paused", CvarValue::Bool(false), "Freeze ship control", CvarFlags::NOTIFY);
//! console.exec("sv_paused 1")?;
//! assert!(console.cvar_bool("sv_paused"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Context};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl CvarValue {
    /// Guesses a type from free text: int, float, bool, then string.
    pub fn parse(text: &str) -> Self {
        if let Ok(v) = text.parse::<i64>() {
            return CvarValue::Int(v);
        }
        if let Ok(v) = text.parse::<f64>() {
            return CvarValue::Float(v);
        }
        match parse_bool(text) {
            Some(v) => CvarValue::Bool(v),
            None => CvarValue::String(text.trim_matches('"').to_string()),
        }
    }

    /// Parses `text` as the same variant as `self`.
    pub fn parse_like(&self, text: &str) -> anyhow::Result<Self> {
        let text = text.trim();
        Ok(match self {
            CvarValue::Int(_) => CvarValue::Int(text.parse().with_context(|| format!("expected an integer, got {text:?}"))?),
            CvarValue::Float(_) => CvarValue::Float(text.parse().with_context(|| format!("expected a number, got {text:?}"))?),
            CvarValue::Bool(_) => match parse_bool(text) {
                Some(v) => CvarValue::Bool(v),
                None => bail!("expected a boolean, got {text:?}"),
            },
            CvarValue::String(_) => CvarValue::String(text.trim_matches('"').to_string()),
        })
    }

    pub fn as_bool(&self) -> bool {
        match self {
            CvarValue::Bool(v) => *v,
            CvarValue::Int(v) => *v != 0,
            CvarValue::Float(v) => *v != 0.0,
            CvarValue::String(s) => parse_bool(s).unwrap_or(!s.is_empty()),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl fmt::Display for CvarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CvarValue::Int(v) => write!(f, "{v}"),
            CvarValue::Float(v) => write!(f, "{v}"),
            CvarValue::Bool(v) => write!(f, "{v}"),
            CvarValue::String(v) => write!(f, "\"{v}\""),
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CvarFlags: u32 {
        const NONE = 0;
        /// Fixed at startup.
        const READ_ONLY = 1 << 0;
        /// Changes are logged at info level.
        const NOTIFY = 1 << 1;
    }
}

#[derive(Debug, Clone)]
pub struct Cvar {
    pub value: CvarValue,
    pub default: CvarValue,
    pub description: String,
    pub flags: CvarFlags,
}

/// Cvar table plus the `cvarlist`, `set`, `reset` and `echo` built-ins.
#[derive(Debug, Default)]
pub struct Console {
    cvars: BTreeMap<String, Cvar>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cvar, replacing any previous one of that name.
    pub fn register_cvar(&mut self, name: &str, default: CvarValue, description: &str, flags: CvarFlags) {
        self.cvars.insert(
            name.to_string(),
            Cvar {
                value: default.clone(),
                default,
                description: description.to_string(),
                flags,
            },
        );
    }

    pub fn get_cvar(&self, name: &str) -> Option<&CvarValue> {
        self.cvars.get(name).map(|c| &c.value)
    }

    /// Unknown cvars read as false.
    pub fn cvar_bool(&self, name: &str) -> bool {
        self.get_cvar(name).is_some_and(CvarValue::as_bool)
    }

    /// Assigns a value, coerced to the cvar's registered type.
    pub fn set_cvar(&mut self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        let Some(cvar) = self.cvars.get_mut(name) else {
            bail!("unknown cvar: {name}");
        };
        if cvar.flags.contains(CvarFlags::READ_ONLY) {
            bail!("cvar {name} is read-only");
        }
        let value = match (&cvar.default, value) {
            (CvarValue::String(_), v) => CvarValue::String(v.to_string().trim_matches('"').to_string()),
            (default, v) if std::mem::discriminant(default) == std::mem::discriminant(&v) => v,
            (default, v) => default.parse_like(&v.to_string())?,
        };
        if cvar.flags.contains(CvarFlags::NOTIFY) && cvar.value != value {
            info!(cvar = name, %value, "cvar changed");
        }
        cvar.value = value;
        Ok(())
    }

    /// Executes one line and returns what it printed. Comments and blank
    /// lines print nothing.
    pub fn exec(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let tokens = tokenize(line);
        let Some((head, args)) = tokens.split_first() else {
            return Ok(Vec::new());
        };
        if head.starts_with("//") {
            return Ok(Vec::new());
        }

        match (head.as_str(), args) {
            ("echo", _) => Ok(vec![args.join(" ")]),
            ("cvarlist", _) => Ok(self
                .cvars
                .iter()
                .map(|(name, c)| format!("  {name} = {} (default {}) {}", c.value, c.default, c.description))
                .collect()),
            ("set", [name, rest @ ..]) if !rest.is_empty() => self.assign(name, &rest.join(" ")),
            ("set", _) => bail!("usage: set <cvar> <value>"),
            ("reset", [name]) => {
                let default = self
                    .cvars
                    .get(name.as_str())
                    .map(|c| c.default.clone())
                    .with_context(|| format!("unknown cvar: {name}"))?;
                self.set_cvar(name, default.clone())?;
                Ok(vec![format!("{name} = {default}")])
            }
            ("reset", _) => bail!("usage: reset <cvar>"),
            (name, []) => Ok(vec![match self.get_cvar(name) {
                Some(value) => format!("{name} = {value}"),
                None => format!("Unknown command: {name}"),
            }]),
            (name, rest) if self.cvars.contains_key(name) => self.assign(name, &rest.join(" ")),
            (name, _) => Ok(vec![format!("Unknown command: {name}")]),
        }
    }

    fn assign(&mut self, name: &str, text: &str) -> anyhow::Result<Vec<String>> {
        let Some(current) = self.get_cvar(name) else {
            bail!("unknown cvar: {name}");
        };
        let value = current.parse_like(text).with_context(|| format!("set {name}"))?;
        self.set_cvar(name, value.clone())?;
        Ok(vec![format!("{name} = {value}")])
    }
}

/// Whitespace split that keeps double-quoted runs together.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.trim().chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
