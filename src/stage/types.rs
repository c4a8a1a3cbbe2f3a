//! Core identity and metadata types for stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a stage in the tree.
///
/// Ids are caller-chosen strings so they survive a save/load cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub String);

impl StageId {
    /// Create a stage id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Descriptive metadata carried by a stage.
///
/// None of these fields take part in the electrical computation; they are
/// persisted so the editor can restore what the user typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Part number of the regulator IC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ic_name: Option<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Display colour, e.g. "ffffff"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Canvas placement `[x, y]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
}

/// Tag identifying the kind of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageType {
    /// Fixed supply (battery, wall adapter, bench supply)
    Source,
    /// Linear (low-dropout) regulator
    Ldo,
    /// Switching converter
    Dcdc,
    /// Terminal consumer
    Load,
}

impl StageType {
    /// Canonical persisted tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageType::Source => "SOURCE",
            StageType::Ldo => "LDO",
            StageType::Dcdc => "DCDC",
            StageType::Load => "LOAD",
        }
    }

    /// Parse a persisted tag. Matching is case-insensitive and accepts
    /// `INPUT` as a synonym for `SOURCE`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "SOURCE" | "INPUT" => Some(StageType::Source),
            "LDO" => Some(StageType::Ldo),
            "DCDC" | "DC-DC" => Some(StageType::Dcdc),
            "LOAD" => Some(StageType::Load),
            _ => None,
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
