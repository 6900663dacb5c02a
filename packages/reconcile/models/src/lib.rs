#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Candidate observation and resolution types for attribute reconciliation.
//!
//! Several upstream sources (a manual entry, a cadastre geometry, a
//! planning-layer attribute) may each report the same physical quantity.
//! Each report is a [`Candidate`]; reconciling them yields a [`Resolution`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How a candidate value was obtained.
///
/// Ordered by trust: a manual entry outranks anything measured from
/// geometry, which outranks a value read from a layer attribute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Method {
    /// Entered or confirmed by a person.
    Manual,
    /// Computed from a boundary polygon.
    #[serde(alias = "geometry_derived")]
    #[strum(to_string = "geometry", serialize = "geometry_derived")]
    Geometry,
    /// Read from a dataset attribute field.
    #[serde(alias = "attribute_derived")]
    #[strum(to_string = "attribute", serialize = "attribute_derived")]
    Attribute,
    /// Anything else (inferred, interpolated, defaulted).
    #[serde(alias = "other")]
    #[strum(to_string = "derived", serialize = "other")]
    Derived,
}

impl Method {
    /// Higher is more trusted.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Manual => 3,
            Self::Geometry => 2,
            Self::Attribute => 1,
            Self::Derived => 0,
        }
    }
}

/// One source's report of an attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Opaque source identifier (e.g. `"cadastre"`, `"planning_portal"`).
    pub source: String,
    /// How the value was obtained.
    pub method: Method,
    /// Free-text note for display.
    #[serde(default)]
    pub note: Option<String>,
    /// The reported value; absent when the source had nothing.
    #[serde(default)]
    pub value: Option<f64>,
}

impl Candidate {
    /// Creates a candidate without a note.
    #[must_use]
    pub fn new(source: impl Into<String>, method: Method, value: Option<f64>) -> Self {
        Self {
            source: source.into(),
            method,
            note: None,
            value,
        }
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// The value, if present and finite.
    #[must_use]
    pub fn usable_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// Trust level of a resolved value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionStatus {
    /// At least two independent sources agree.
    Verified,
    /// A single source, uncontradicted.
    Estimated,
    /// Sources disagree beyond tolerance; the value is a best guess.
    Conflict,
    /// No usable candidate.
    Missing,
}

/// The reconciled value of one attribute plus its audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Resolved value; absent exactly when [`Self::status`] is `Missing`.
    pub value: Option<f64>,
    /// How far the value can be trusted.
    pub status: ResolutionStatus,
    /// Sources whose values produced [`Self::value`], in input order.
    pub supporting_sources: Vec<String>,
    /// Every input candidate, usable or not, in input order.
    pub candidates: Vec<Candidate>,
}

impl Resolution {
    /// A resolution with no usable candidate.
    #[must_use]
    pub const fn missing(candidates: Vec<Candidate>) -> Self {
        Self {
            value: None,
            status: ResolutionStatus::Missing,
            supporting_sources: Vec::new(),
            candidates,
        }
    }
}

/// Tunables for attribute reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Two values agree when `|a − b| / max(|a|, |b|, 1)` is at most this.
    pub relative_tolerance: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 0.05,
        }
    }
}
