// src/capability.rs
//! Optional capabilities: things that may or may not be usable in this process,
//! checked once before any operation that would need them.
//!
//! The keyed fallback tier of a chain and the AI summarizer are both gated this
//! way. An unavailable capability is never attempted.

use std::fmt;

/// Either a usable capability or the reason it is missing.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    Available(T),
    Unavailable(String),
}

impl<T> Capability<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Self::Available(v) => Capability::Available(f(v)),
            Self::Unavailable(r) => Capability::Unavailable(r),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Capability<U>) -> Capability<U> {
        match self {
            Self::Available(v) => f(v),
            Self::Unavailable(r) => Capability::Unavailable(r),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(r) => Some(r),
        }
    }
}

/// A secret read from the environment. `Debug`/`Display` never print it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(len={})", self.0.len())
    }
}

/// Read an env var for a credential. Unset or blank counts as absent.
pub fn credential_from_env(var: &str) -> Capability<Credential> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Capability::Available(Credential::new(v.trim())),
        Ok(_) => Capability::unavailable(format!("{var} is empty")),
        Err(_) => Capability::unavailable(format!("{var} is not set")),
    }
}
