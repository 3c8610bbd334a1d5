//! Flags the caller passes to the engine for every transcoding call.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Canonical row ordering for sortable tables (`dynamic_sort_subtable`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "SortModeRepr", into = "String")]
pub enum SortMode {
    /// Keep rows in remote order
    #[default]
    Disabled,
    /// Strings by byte order, numbers numerically
    Lexical,
    /// Like `Lexical`, but digit runs inside strings compare numerically
    Natural,
}

impl SortMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Compare two strings under this mode.
    pub fn compare_str(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Natural => natural_cmp(a, b),
            Self::Disabled | Self::Lexical => a.cmp(b),
        }
    }
}

impl From<bool> for SortMode {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Lexical } else { Self::Disabled }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "false"),
            Self::Lexical => write!(f, "true"),
            Self::Natural => write!(f, "natural"),
        }
    }
}

impl FromStr for SortMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "disable" | "disabled" => Ok(Self::Disabled),
            "true" | "enable" | "enabled" | "lexical" => Ok(Self::Lexical),
            "natural" => Ok(Self::Natural),
            other => Err(CoreError::invalid_sort_mode(other)),
        }
    }
}

impl From<SortMode> for String {
    fn from(mode: SortMode) -> Self {
        mode.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SortModeRepr {
    Flag(bool),
    Name(String),
}

impl TryFrom<SortModeRepr> for SortMode {
    type Error = CoreError;

    fn try_from(repr: SortModeRepr) -> Result<Self, Self::Error> {
        match repr {
            SortModeRepr::Flag(enabled) => Ok(enabled.into()),
            SortModeRepr::Name(name) => name.parse(),
        }
    }
}

/// Compare strings treating each run of ASCII digits as one number.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_trim = l_run.trim_start_matches('0');
                let r_trim = r_run.trim_start_matches('0');
                let ord = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim))
                    .then_with(|| l_run.len().cmp(&r_run.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Per-call engine flags supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Canonical ordering of sortable tables on the inbound path
    #[serde(default)]
    pub dynamic_sort_subtable: SortMode,

    /// Transcode top-level tables even when the caller's state never declared them
    #[serde(default, alias = "import_all")]
    pub get_all_tables: bool,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(mut self, mode: SortMode) -> Self {
        self.dynamic_sort_subtable = mode;
        self
    }

    pub fn with_all_tables(mut self, enabled: bool) -> Self {
        self.get_all_tables = enabled;
        self
    }
}
