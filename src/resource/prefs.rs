//! Preference store access - `defaults export` for reads, `defaults write` for writes

use crate::runner::{self, RunError};
use declarative::ApplyError;
use plist::{Dictionary, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Scalar preference value
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PrefValue {
    /// Coerce a declared value to a preference value.
    ///
    /// `declared` is the optional `type` from the declaration file. Without
    /// one, the type follows the value as written.
    pub fn coerce(value: &serde_json::Value, declared: Option<&str>) -> Result<Self, String> {
        use serde_json::Value as J;

        match (declared.map(str::to_lowercase).as_deref(), value) {
            (None | Some("bool" | "boolean"), J::Bool(b)) => Ok(Self::Bool(*b)),
            (Some("bool" | "boolean"), J::String(s)) => {
                parse_bool(s).map(Self::Bool).ok_or_else(|| format!("invalid boolean: {s}"))
            }
            (Some("bool" | "boolean"), J::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Self::Bool(false)),
                Some(1) => Ok(Self::Bool(true)),
                _ => Err(format!("invalid boolean: {n}")),
            },
            (None | Some("int" | "integer"), J::Number(n)) if n.is_i64() || n.is_u64() => n
                .as_i64()
                .map(Self::Int)
                .ok_or_else(|| format!("integer out of range: {n}")),
            (Some("int" | "integer"), J::String(s)) => s
                .trim()
                .parse()
                .map(Self::Int)
                .map_err(|_| format!("invalid integer: {s}")),
            (None | Some("float" | "real"), J::Number(n)) => n
                .as_f64()
                .map(Self::Float)
                .ok_or_else(|| format!("invalid float: {n}")),
            (Some("float" | "real"), J::String(s)) => s
                .trim()
                .parse()
                .map(Self::Float)
                .map_err(|_| format!("invalid float: {s}")),
            (None | Some("string"), J::String(s)) => Ok(Self::String(s.clone())),
            (Some("string"), J::Number(n)) => Ok(Self::String(n.to_string())),
            (Some("string"), J::Bool(b)) => Ok(Self::String(b.to_string())),
            (Some(t @ ("bool" | "boolean" | "int" | "integer" | "float" | "real" | "string")), v) => {
                Err(format!("cannot use {v} as {t}"))
            }
            (Some(t), _) => Err(format!("unknown value type: {t}")),
            (None, v) => Err(format!("unsupported value: {v}")),
        }
    }

    /// `defaults write` type flag
    pub fn type_flag(&self) -> &'static str {
        match self {
            Self::Bool(_) => "-bool",
            Self::Int(_) => "-int",
            Self::Float(_) => "-float",
            Self::String(_) => "-string",
        }
    }

    /// Whether a stored plist value already holds this value.
    ///
    /// `defaults` stores booleans written by some apps as integers, so `true`
    /// matches `1` and `false` matches `0`.
    pub fn matches(&self, stored: &Value) -> bool {
        match (self, stored) {
            (Self::Bool(b), Value::Boolean(s)) => b == s,
            (Self::Bool(b), Value::Integer(i)) => i.as_signed() == Some(i64::from(*b)),
            (Self::Int(n), Value::Integer(i)) => i.as_signed() == Some(*n),
            (Self::Int(n), Value::Real(r)) => r.fract() == 0.0 && *r as i64 == *n,
            (Self::Float(f), Value::Real(r)) => (f - r).abs() < f64::EPSILON * f.abs().max(1.0),
            (Self::Float(f), Value::Integer(i)) => i.as_signed().is_some_and(|i| i as f64 == *f),
            (Self::String(s), Value::String(t)) => s == t,
            _ => false,
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Parse a boolean the way `defaults` users write them
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Short rendering of a stored plist value for diffs
pub fn describe(value: &Value) -> String {
    match value {
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::String(s) => format!("\"{s}\""),
        Value::Array(a) => format!("array({})", a.len()),
        Value::Dictionary(d) => format!("dict({})", d.len()),
        Value::Data(d) => format!("data({} bytes)", d.len()),
        Value::Date(d) => d.to_xml_format(),
        _ => "?".to_string(),
    }
}

/// Preference store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// `defaults` could not be run
    #[error("preference store unavailable: {0}")]
    Unavailable(String),

    #[error("defaults timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// `defaults` ran and refused the write
    #[error("defaults rejected the write: {0}")]
    Rejected(String),

    #[error("could not parse exported preferences: {0}")]
    Parse(String),
}

impl From<RunError> for StoreError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::Timeout { after, .. } => Self::Timeout(after),
            RunError::Spawn { .. } => Self::Unavailable(e.to_string()),
        }
    }
}

impl From<StoreError> for ApplyError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Timeout(after) => Self::TimedOut(after),
            StoreError::Rejected(_) => Self::permanent(e.to_string()),
            StoreError::Unavailable(_) | StoreError::Parse(_) => Self::transient(e.to_string()),
        }
    }
}

/// Read/write access to a preference domain
pub trait PreferenceStore: fmt::Debug {
    /// Every key of a domain; None if the domain does not exist
    fn export(&self, domain: &str, current_host: bool) -> Result<Option<Dictionary>, StoreError>;

    /// Set one scalar key
    fn write(
        &self,
        domain: &str,
        key: &str,
        value: &PrefValue,
        current_host: bool,
    ) -> Result<(), StoreError>;

    /// Set one entry of a dictionary-valued key, leaving the other entries alone
    fn dict_add(
        &self,
        domain: &str,
        key: &str,
        entry: &str,
        value: &Value,
        current_host: bool,
    ) -> Result<(), StoreError>;
}

/// Read a single key
pub fn read_key(
    store: &dyn PreferenceStore,
    domain: &str,
    key: &str,
    current_host: bool,
) -> Result<Option<Value>, StoreError> {
    Ok(store
        .export(domain, current_host)?
        .and_then(|mut dict| dict.remove(key)))
}

/// The `defaults` command line tool
#[derive(Debug, Clone)]
pub struct DefaultsCli {
    timeout: Duration,
}

impl DefaultsCli {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn base_args(current_host: bool) -> Vec<&'static str> {
        if current_host {
            vec!["-currentHost"]
        } else {
            Vec::new()
        }
    }

    fn run_write(&self, args: &[&str]) -> Result<(), StoreError> {
        let output = runner::output("defaults", args, self.timeout)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(StoreError::Rejected(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

impl PreferenceStore for DefaultsCli {
    fn export(&self, domain: &str, current_host: bool) -> Result<Option<Dictionary>, StoreError> {
        let mut args = Self::base_args(current_host);
        args.extend(["export", domain, "-"]);

        let output = runner::output("defaults", &args, self.timeout)?;
        if !output.status.success() {
            return Err(StoreError::Unavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_export(&output.stdout)
    }

    fn write(
        &self,
        domain: &str,
        key: &str,
        value: &PrefValue,
        current_host: bool,
    ) -> Result<(), StoreError> {
        let rendered = match value {
            PrefValue::Bool(b) => b.to_string(),
            PrefValue::Int(i) => i.to_string(),
            PrefValue::Float(f) => f.to_string(),
            PrefValue::String(s) => s.clone(),
        };
        let mut args = Self::base_args(current_host);
        args.extend(["write", domain, key, value.type_flag(), &rendered]);
        self.run_write(&args)
    }

    fn dict_add(
        &self,
        domain: &str,
        key: &str,
        entry: &str,
        value: &Value,
        current_host: bool,
    ) -> Result<(), StoreError> {
        let fragment = xml_fragment(value)?;
        let mut args = Self::base_args(current_host);
        args.extend(["write", domain, key, "-dict-add", entry, &fragment]);
        self.run_write(&args)
    }
}

/// Parse `defaults export <domain> -` output.
///
/// A domain that does not exist exports as an empty dictionary.
fn parse_export(stdout: &[u8]) -> Result<Option<Dictionary>, StoreError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match Value::from_reader_xml(stdout) {
        Ok(Value::Dictionary(dict)) if dict.is_empty() => Ok(None),
        Ok(Value::Dictionary(dict)) => Ok(Some(dict)),
        Ok(other) => Err(StoreError::Parse(format!(
            "expected a dictionary, got {}",
            describe(&other)
        ))),
        Err(e) => Err(StoreError::Parse(e.to_string())),
    }
}

/// Render a value as the bare XML element `defaults write` accepts as an argument
pub fn xml_fragment(value: &Value) -> Result<String, StoreError> {
    let mut buf = Vec::new();
    value
        .to_writer_xml(&mut buf)
        .map_err(|e| StoreError::Parse(e.to_string()))?;
    let xml = String::from_utf8_lossy(&buf);

    let start = xml
        .find("<plist version=\"1.0\">")
        .map(|i| i + "<plist version=\"1.0\">".len())
        .unwrap_or(0);
    let end = xml.rfind("</plist>").unwrap_or(xml.len());

    Ok(xml[start..end].trim().to_string())
}
