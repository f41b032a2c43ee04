//! # Context Resolution
//!
//! Builds the per-call value map for a pattern: date tokens from an injected
//! [`Clock`], contextual tokens from the caller's [`EntityContext`] (falling back
//! to scheme defaults), random tokens from fresh random sources, and the
//! allocated sequence value.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

pub mod random;

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use chrono::{DateTime, Datelike, Utc};

use crate::{
    constants::{DEFAULT_RANDOM_LENGTH, MAX_ABBREVIATION_LEN},
    error::{Error, Result},
    pattern::{catalog, PatternDefinition, Segment, TokenKind},
};

// =============================================================================
// Clocks
// =============================================================================

/// Source of the current time. Never read the system clock directly in
/// resolution code; take a `Clock` instead.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests and previews.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// =============================================================================
// Entity Context
// =============================================================================

/// Caller-supplied values for contextual tokens (repository code, fonds code, ...).
///
/// Keys are stored uppercase so `repo` and `REPO` address the same token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityContext {
    fields: BTreeMap<String, String>,
}

impl EntityContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_uppercase(), value.into());
    }

    /// Returns a non-blank value for the field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(&field.to_uppercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Sets `REPO` from a repository's full name when no code was supplied.
    #[must_use]
    pub fn with_repository_name(mut self, name: &str) -> Self {
        if self.get("REPO").is_none() {
            let code = abbreviate(name);
            if !code.is_empty() {
                self.insert("REPO", code);
            }
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for EntityContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.insert(k.as_ref(), v);
        }
        ctx
    }
}

/// Abbreviates a name to uppercase word initials, at most 6 characters.
///
/// `"National Archives of South Africa"` becomes `"NAOSA"`.
pub fn abbreviate(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(MAX_ABBREVIATION_LEN)
        .collect()
}

// =============================================================================
// Resolved Context
// =============================================================================

/// Values for one generation call. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedContext {
    values: HashMap<String, String>,
    sequence: Option<u64>,
    /// Random values keyed by segment index, so repeated random tokens differ
    random: HashMap<usize, String>,
}

impl ResolvedContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(mut self, token: &str, value: impl Into<String>) -> Self {
        self.values.insert(token.to_string(), value.into());
        self
    }

    #[must_use]
    pub const fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    #[must_use]
    pub fn with_random(mut self, segment: usize, value: impl Into<String>) -> Self {
        self.random.insert(segment, value.into());
        self
    }

    pub fn value(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    pub const fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn random(&self, segment: usize) -> Option<&str> {
        self.random.get(&segment).map(String::as_str)
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves token values for a parsed pattern.
pub struct Resolver<'a> {
    clock: &'a dyn Clock,
    strict: bool,
    random_length: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            strict: false,
            random_length: DEFAULT_RANDOM_LENGTH,
        }
    }

    /// In strict mode a missing contextual value fails instead of rendering
    /// the token name as a placeholder.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Length used by `{RANDOM}` without a parameter.
    #[must_use]
    pub const fn random_length(mut self, len: usize) -> Self {
        self.random_length = len;
        self
    }

    /// Builds the value map for `definition`.
    ///
    /// Contextual values come from `entity`, then `defaults`; `sequence` is the
    /// freshly allocated (or preview stand-in) value.
    pub fn resolve(
        &self,
        definition: &PatternDefinition,
        entity: &EntityContext,
        defaults: &BTreeMap<String, String>,
        sequence: Option<u64>,
    ) -> Result<ResolvedContext> {
        self.resolve_at(definition, entity, defaults, sequence, self.clock.now())
    }

    /// [`resolve`](Self::resolve) with date tokens taken from `now` instead of the clock.
    pub fn resolve_at(
        &self,
        definition: &PatternDefinition,
        entity: &EntityContext,
        defaults: &BTreeMap<String, String>,
        sequence: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<ResolvedContext> {
        let mut ctx = ResolvedContext::new();
        ctx.sequence = sequence;

        for (index, segment) in definition.segments().iter().enumerate() {
            let Segment::TokenRef { name, param } = segment else {
                continue;
            };
            let Some(spec) = catalog::lookup(name) else {
                continue;
            };

            match spec.kind {
                TokenKind::Sequence => {}
                TokenKind::Date => {
                    ctx.values
                        .entry(name.clone())
                        .or_insert_with(|| date_value(name, now));
                }
                TokenKind::Contextual => {
                    if ctx.values.contains_key(name) {
                        continue;
                    }
                    let value = self.contextual_value(name, entity, defaults)?;
                    ctx.values.insert(name.clone(), value);
                }
                TokenKind::Random => {
                    let value = if name == catalog::UUID {
                        random::uuid()
                    } else {
                        let len = param.map_or(self.random_length, |p| p as usize);
                        random::alphanumeric(len)
                    };
                    ctx.random.insert(index, value);
                }
            }
        }

        Ok(ctx)
    }

    fn contextual_value(
        &self,
        name: &str,
        entity: &EntityContext,
        defaults: &BTreeMap<String, String>,
    ) -> Result<String> {
        if let Some(value) = entity.get(name) {
            return Ok(value.to_string());
        }
        if let Some(value) = defaults.get(name).filter(|v| !v.trim().is_empty()) {
            return Ok(value.clone());
        }
        if self.strict {
            return Err(Error::UnresolvedToken {
                token: name.to_string(),
            });
        }
        tracing::debug!(token = name, "no value for contextual token, using placeholder");
        Ok(name.to_uppercase())
    }
}

fn date_value(name: &str, now: DateTime<Utc>) -> String {
    match name {
        catalog::YEAR => format!("{:04}", now.year()),
        catalog::YY => format!("{:02}", now.year().rem_euclid(100)),
        catalog::MONTH => format!("{:02}", now.month()),
        catalog::DAY => format!("{:02}", now.day()),
        _ => name.to_string(),
    }
}
