#![forbid(unsafe_code)]

//! Lifecycle status record for an atom's associated async operation.
//!
//! A [`StatusRecord`] carries four flags (`init`, `loading`, `loaded`,
//! `error`) plus an optional error message. By convention exactly one flag
//! is true; nothing enforces it.
//!
//! Every update is resolved against [`StatusRecord::cleared()`] (all flags
//! false, no message), never against the previous record. See
//! [`StatusUpdate::resolve`].

use std::fmt;
use std::str::FromStr;

use crate::error::{AtomError, Result};

/// One of the four lifecycle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFlag {
    /// Nothing has been attempted yet.
    Init,
    /// Operation in flight.
    Loading,
    /// Operation succeeded.
    Loaded,
    /// Operation failed.
    Error,
}

impl StatusFlag {
    pub const ALL: [StatusFlag; 4] = [Self::Init, Self::Loading, Self::Loaded, Self::Error];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFlag {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "init" => Ok(Self::Init),
            "loading" => Ok(Self::Loading),
            "loaded" => Ok(Self::Loaded),
            "error" => Ok(Self::Error),
            other => Err(AtomError::invalid(format!(
                "unknown status flag `{other}` (expected init, loading, loaded or error)"
            ))),
        }
    }
}

/// Lifecycle state of an atom's async operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub init: bool,
    pub loading: bool,
    pub loaded: bool,
    pub error: bool,
    /// Only meaningful alongside `error`.
    pub error_message: Option<String>,
}

impl Default for StatusRecord {
    /// The status of a freshly created atom: `init` set, everything else
    /// clear.
    fn default() -> Self {
        Self {
            init: true,
            ..Self::cleared()
        }
    }
}

impl StatusRecord {
    /// The base every status update is resolved against.
    #[must_use]
    pub const fn cleared() -> Self {
        Self {
            init: false,
            loading: false,
            loaded: false,
            error: false,
            error_message: None,
        }
    }

    /// Cleared base with exactly `flag` set.
    #[must_use]
    pub fn only(flag: StatusFlag) -> Self {
        let mut record = Self::cleared();
        record.set_flag(flag, true);
        record
    }

    #[must_use]
    pub fn flag(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::Init => self.init,
            StatusFlag::Loading => self.loading,
            StatusFlag::Loaded => self.loaded,
            StatusFlag::Error => self.error,
        }
    }

    fn set_flag(&mut self, flag: StatusFlag, on: bool) {
        match flag {
            StatusFlag::Init => self.init = on,
            StatusFlag::Loading => self.loading = on,
            StatusFlag::Loaded => self.loaded = on,
            StatusFlag::Error => self.error = on,
        }
    }

    /// Flags currently set, in declaration order.
    pub fn active_flags(&self) -> impl Iterator<Item = StatusFlag> + '_ {
        StatusFlag::ALL.into_iter().filter(move |f| self.flag(*f))
    }

    /// Whether the one-flag convention holds.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.active_flags().count() == 1
    }
}

/// Partial status record. Unset fields fall back to the cleared base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPatch {
    pub init: Option<bool>,
    pub loading: Option<bool>,
    pub loaded: Option<bool>,
    pub error: Option<bool>,
    pub error_message: Option<String>,
}

impl StatusPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn init(mut self, on: bool) -> Self {
        self.init = Some(on);
        self
    }

    #[must_use]
    pub fn loading(mut self, on: bool) -> Self {
        self.loading = Some(on);
        self
    }

    #[must_use]
    pub fn loaded(mut self, on: bool) -> Self {
        self.loaded = Some(on);
        self
    }

    #[must_use]
    pub fn error(mut self, on: bool) -> Self {
        self.error = Some(on);
        self
    }

    #[must_use]
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// `error` set together with its message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new().error(true).error_message(message)
    }

    /// Overlay this patch on the cleared base.
    #[must_use]
    pub fn resolve(self) -> StatusRecord {
        let base = StatusRecord::cleared();
        StatusRecord {
            init: self.init.unwrap_or(base.init),
            loading: self.loading.unwrap_or(base.loading),
            loaded: self.loaded.unwrap_or(base.loaded),
            error: self.error.unwrap_or(base.error),
            error_message: self.error_message.or(base.error_message),
        }
    }
}

impl From<StatusFlag> for StatusPatch {
    fn from(flag: StatusFlag) -> Self {
        let mut patch = Self::new();
        match flag {
            StatusFlag::Init => patch.init = Some(true),
            StatusFlag::Loading => patch.loading = Some(true),
            StatusFlag::Loaded => patch.loaded = Some(true),
            StatusFlag::Error => patch.error = Some(true),
        }
        patch
    }
}

/// A status transition.
pub enum StatusUpdate {
    /// Exactly this flag set.
    Flag(StatusFlag),
    /// The given fields over the cleared base.
    Patch(StatusPatch),
    /// A patch computed from the current record.
    Transform(Box<dyn FnOnce(&StatusRecord) -> StatusPatch>),
}

impl StatusUpdate {
    pub fn transform(f: impl FnOnce(&StatusRecord) -> StatusPatch + 'static) -> Self {
        Self::Transform(Box::new(f))
    }

    /// The record this update produces when applied to `current`.
    ///
    /// `current` is only consulted by [`StatusUpdate::Transform`]; the result
    /// never inherits a field from it.
    #[must_use]
    pub fn resolve(self, current: &StatusRecord) -> StatusRecord {
        match self {
            Self::Flag(flag) => StatusRecord::only(flag),
            Self::Patch(patch) => patch.resolve(),
            Self::Transform(f) => f(current).resolve(),
        }
    }
}

impl fmt::Debug for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
            Self::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl From<StatusFlag> for StatusUpdate {
    fn from(flag: StatusFlag) -> Self {
        Self::Flag(flag)
    }
}

impl From<StatusPatch> for StatusUpdate {
    fn from(patch: StatusPatch) -> Self {
        Self::Patch(patch)
    }
}

impl TryFrom<&str> for StatusUpdate {
    type Error = AtomError;

    fn try_from(name: &str) -> Result<Self> {
        name.parse().map(Self::Flag)
    }
}
