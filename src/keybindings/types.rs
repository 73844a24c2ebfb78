//! Keybinding rule shapes and their registered form.

use serde::{Deserialize, Serialize};

use crate::expression::WhenClause;

use super::chord::{KeyChord, Platform};

/// Where a binding came from. Source rank dominates `weight`: a user
/// binding always beats a default one, no matter the weights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    /// Shipped with the application.
    #[default]
    Default,
    /// Contributed by an extension/plugin.
    Extension,
    /// User-defined override (highest priority).
    User,
}

impl BindingSource {
    /// Rank for resolution; higher wins.
    pub fn rank(&self) -> u8 {
        match self {
            BindingSource::Default => 0,
            BindingSource::Extension => 1,
            BindingSource::User => 2,
        }
    }
}

/// Declarative keybinding: a chord (with optional per-platform overrides)
/// bound to a command, active while `when` holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeybindingRule {
    pub command_id: String,
    /// Chord used when no platform-specific override applies, e.g.
    /// `"ctrl+o"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    /// Condition for the binding to be active. Absent means always active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<WhenClause>,
    /// Sort weight within a source; higher wins.
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub source: BindingSource,
}

impl KeybindingRule {
    pub fn new(command_id: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            primary: Some(primary.into()),
            win: None,
            linux: None,
            mac: None,
            when: None,
            weight: 0,
            source: BindingSource::Default,
        }
    }

    pub fn with_win(mut self, chord: impl Into<String>) -> Self {
        self.win = Some(chord.into());
        self
    }

    pub fn with_linux(mut self, chord: impl Into<String>) -> Self {
        self.linux = Some(chord.into());
        self
    }

    pub fn with_mac(mut self, chord: impl Into<String>) -> Self {
        self.mac = Some(chord.into());
        self
    }

    pub fn with_when(mut self, when: WhenClause) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_source(mut self, source: BindingSource) -> Self {
        self.source = source;
        self
    }

    /// The chord string this rule binds on `platform`: the platform override
    /// when present, `primary` otherwise.
    pub fn chord_for_platform(&self, platform: Platform) -> Option<&str> {
        let specific = match platform {
            Platform::Windows => self.win.as_deref(),
            Platform::Linux => self.linux.as_deref(),
            Platform::MacOS => self.mac.as_deref(),
        };
        specific.or(self.primary.as_deref())
    }
}

/// A fully registered keybinding: the rule's platform chord parsed and
/// normalized, plus the sequence number assigned at registration (the final
/// tie-break for equal source and weight).
#[derive(Clone, Debug, PartialEq)]
pub struct RegisteredKeybinding {
    pub chord: KeyChord,
    pub command_id: String,
    pub when: Option<WhenClause>,
    pub weight: i32,
    pub source: BindingSource,
    pub seq: u64,
}
