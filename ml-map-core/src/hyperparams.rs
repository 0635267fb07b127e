//! Hyperparameter records bound to a mapping before training

use std::fmt;
use std::mem::discriminant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HyperValue {
    /// Floating point value
    Float(f64),

    /// Integer value
    Int(i64),

    /// Boolean flag
    Bool(bool),

    /// Free text, typically a method name
    Text(String),

    /// Vector of floating point values
    Floats(Vec<f64>),

    /// Vector of column indices
    Indices(Vec<usize>),
}

impl HyperValue {
    fn kind(&self) -> &'static str {
        match self {
            HyperValue::Float(_) => "float",
            HyperValue::Int(_) => "int",
            HyperValue::Bool(_) => "bool",
            HyperValue::Text(_) => "text",
            HyperValue::Floats(_) => "floats",
            HyperValue::Indices(_) => "indices",
        }
    }
}

impl From<f64> for HyperValue {
    fn from(value: f64) -> Self {
        HyperValue::Float(value)
    }
}

impl From<i64> for HyperValue {
    fn from(value: i64) -> Self {
        HyperValue::Int(value)
    }
}

impl From<bool> for HyperValue {
    fn from(value: bool) -> Self {
        HyperValue::Bool(value)
    }
}

impl From<&str> for HyperValue {
    fn from(value: &str) -> Self {
        HyperValue::Text(value.to_string())
    }
}

impl From<String> for HyperValue {
    fn from(value: String) -> Self {
        HyperValue::Text(value)
    }
}

impl From<Vec<f64>> for HyperValue {
    fn from(value: Vec<f64>) -> Self {
        HyperValue::Floats(value)
    }
}

impl From<Vec<usize>> for HyperValue {
    fn from(value: Vec<usize>) -> Self {
        HyperValue::Indices(value)
    }
}

impl fmt::Display for HyperValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperValue::Float(v) => write!(f, "{v}"),
            HyperValue::Int(v) => write!(f, "{v}"),
            HyperValue::Bool(v) => write!(f, "{v}"),
            HyperValue::Text(v) => write!(f, "'{v}'"),
            HyperValue::Floats(v) => write!(f, "{v:?}"),
            HyperValue::Indices(v) => write!(f, "{v:?}"),
        }
    }
}

/// An ordered, fixed-arity record of named hyperparameter values
///
/// The names and value kinds are fixed by the mapping definition's defaults.
/// Values may be replaced before training, never added or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Entries in declaration order
    entries: Vec<(String, HyperValue)>,
}

impl Hyperparameters {
    /// Create a record from named values
    pub fn new<S, V>(entries: impl IntoIterator<Item = (S, V)>) -> Self
    where
        S: Into<String>,
        V: Into<HyperValue>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// A record with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HyperValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Get a value by name
    pub fn get(&self, name: &str) -> Option<&HyperValue> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// Replace the value of an existing entry
    ///
    /// The entry must exist and the new value must be of the same kind.
    pub fn with(mut self, name: &str, value: impl Into<HyperValue>) -> Result<Self> {
        let value = value.into();
        let slot = self
            .entries
            .iter_mut()
            .find(|(entry, _)| entry == name)
            .map(|(_, slot)| slot)
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown hyperparameter: {name}")))?;

        if discriminant(&*slot) != discriminant(&value) {
            return Err(Error::InvalidArgument(format!(
                "Hyperparameter '{name}' expects {}, got {}",
                slot.kind(),
                value.kind()
            )));
        }

        *slot = value;
        Ok(self)
    }

    /// Check that this record has the same names, order and value kinds as `defaults`
    pub fn conforms_to(&self, defaults: &Hyperparameters) -> Result<()> {
        if self.len() != defaults.len() {
            return Err(Error::InvalidArgument(format!(
                "Expected {} hyperparameters, got {}",
                defaults.len(),
                self.len()
            )));
        }

        for ((name, value), (expected, default)) in self.entries.iter().zip(&defaults.entries) {
            if name != expected || discriminant(value) != discriminant(default) {
                return Err(Error::InvalidArgument(format!(
                    "Hyperparameter '{name}' ({}) does not match '{expected}' ({})",
                    value.kind(),
                    default.kind()
                )));
            }
        }

        Ok(())
    }

    /// Get a float value by name
    pub fn float(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            HyperValue::Float(v) => Ok(*v),
            other => Err(Self::mistyped(name, "float", other)),
        }
    }

    /// Get an integer value by name
    pub fn int(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            HyperValue::Int(v) => Ok(*v),
            other => Err(Self::mistyped(name, "int", other)),
        }
    }

    /// Get a text value by name
    pub fn text(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            HyperValue::Text(v) => Ok(v),
            other => Err(Self::mistyped(name, "text", other)),
        }
    }

    /// Get an index vector by name
    pub fn indices(&self, name: &str) -> Result<&[usize]> {
        match self.require(name)? {
            HyperValue::Indices(v) => Ok(v),
            other => Err(Self::mistyped(name, "indices", other)),
        }
    }

    fn require(&self, name: &str) -> Result<&HyperValue> {
        self.get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("Missing hyperparameter: {name}")))
    }

    fn mistyped(name: &str, expected: &str, got: &HyperValue) -> Error {
        Error::InvalidArgument(format!(
            "Hyperparameter '{name}' expects {expected}, got {}",
            got.kind()
        ))
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}
