//! # Identifier Generator
//!
//! Entry points for callers: real generation (allocates a sequence value and
//! persists it) and preview (side-effect free, uses stand-in sequence values).
//! Both paths share the same parser, resolver and renderer.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use regex::Regex;

use crate::{
    allocator::SequenceAllocator,
    constants::{DEFAULT_RANDOM_LENGTH, PREVIEW_SEQUENCE_START},
    context::{Clock, EntityContext, ResolvedContext, Resolver},
    error::{Error, Result},
    pattern::{self, PatternDefinition},
    render::{self, Rendered, Warning},
    scheme::{NumberingScheme, Sector},
    storage::SchemeStore,
};

/// A generated identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub identifier: String,
    pub scheme_id: String,
    /// Allocated sequence value, if the pattern uses `{SEQ}`
    pub sequence: Option<u64>,
    pub warnings: Vec<Warning>,
}

/// Numbering status of a sector, for settings screens and record forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingInfo {
    pub sector: Sector,
    /// An active default scheme exists
    pub enabled: bool,
    pub auto_generate: bool,
    pub scheme_id: Option<String>,
    pub pattern: Option<String>,
    /// What the next identifier would look like (nothing is allocated)
    pub next_preview: Option<String>,
}

/// Generates identifiers from numbering schemes
pub struct Generator<S, C> {
    allocator: SequenceAllocator<S, C>,
    cache: Mutex<HashMap<String, Arc<PatternDefinition>>>,
    strict: bool,
    random_length: usize,
    preview_counter: AtomicU64,
}

impl<S: SchemeStore, C: Clock> Generator<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            allocator: SequenceAllocator::new(store, clock),
            cache: Mutex::new(HashMap::new()),
            strict: false,
            random_length: DEFAULT_RANDOM_LENGTH,
            preview_counter: AtomicU64::new(PREVIEW_SEQUENCE_START),
        }
    }

    /// Fail instead of writing placeholders for missing contextual values.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub const fn random_length(mut self, len: usize) -> Self {
        self.random_length = len;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.allocator = self.allocator.with_retry(attempts, backoff);
        self
    }

    pub const fn allocator(&self) -> &SequenceAllocator<S, C> {
        &self.allocator
    }

    pub const fn store(&self) -> &S {
        self.allocator.store()
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.allocator.clock())
            .strict(self.strict)
            .random_length(self.random_length)
    }

    /// Parsed pattern for a scheme, cached until the scheme's pattern text changes.
    pub fn definition(&self, scheme: &NumberingScheme) -> Result<Arc<PatternDefinition>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(def) = cache.get(&scheme.id) {
            if def.source() == scheme.pattern {
                return Ok(Arc::clone(def));
            }
            tracing::debug!(scheme = %scheme.id, "pattern changed, re-parsing");
        }

        let def = Arc::new(pattern::parse(&scheme.pattern)?);
        cache.insert(scheme.id.clone(), Arc::clone(&def));
        Ok(def)
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Generates the next identifier for `scheme_id`.
    ///
    /// Contextual values are resolved before a sequence value is allocated, so
    /// a strict-mode failure does not consume a number.
    pub fn generate_identifier(&self, scheme_id: &str, entity: &EntityContext) -> Result<Generated> {
        let scheme = self.active_scheme(scheme_id)?;
        let definition = self.definition(&scheme)?;
        let validator = compile_validation(&scheme)?;

        let resolver = self.resolver();
        let ctx = resolver.resolve(&definition, entity, &scheme.defaults, None)?;
        if !definition.uses_sequence() {
            return Ok(finish(&scheme, &definition, validator.as_ref(), ctx, None));
        }

        // Dates must come from the instant the epoch was checked against
        let (sequence, at) = self.allocator.allocate(scheme_id)?;
        let ctx = resolver.resolve_at(&definition, entity, &scheme.defaults, None, at)?;
        Ok(finish(&scheme, &definition, validator.as_ref(), ctx, Some(sequence)))
    }

    /// Generates `count` identifiers from one contiguous block of sequence values.
    pub fn generate_batch(
        &self,
        scheme_id: &str,
        entity: &EntityContext,
        count: u64,
    ) -> Result<Vec<Generated>> {
        let scheme = self.active_scheme(scheme_id)?;
        let definition = self.definition(&scheme)?;
        let validator = compile_validation(&scheme)?;
        let resolver = self.resolver();

        // Fail on missing context before reserving anything
        resolver.resolve(&definition, entity, &scheme.defaults, None)?;

        if !definition.uses_sequence() {
            return (0..count)
                .map(|_| {
                    let ctx = resolver.resolve(&definition, entity, &scheme.defaults, None)?;
                    Ok(finish(&scheme, &definition, validator.as_ref(), ctx, None))
                })
                .collect();
        }

        let (block, at) = self.allocator.allocate_block(scheme_id, count)?;
        block
            .map(|seq| {
                let ctx = resolver.resolve_at(&definition, entity, &scheme.defaults, None, at)?;
                Ok(finish(&scheme, &definition, validator.as_ref(), ctx, Some(seq)))
            })
            .collect()
    }

    /// Generates with the sector's default scheme.
    pub fn next_reference(&self, sector: Sector, entity: &EntityContext) -> Result<Generated> {
        let scheme = self
            .default_scheme(sector)?
            .filter(|s| s.auto_generate)
            .ok_or_else(|| Error::NoDefaultScheme(sector.to_string()))?;
        self.generate_identifier(&scheme.id, entity)
    }

    /// The active default scheme of a sector, if any.
    pub fn default_scheme(&self, sector: Sector) -> Result<Option<NumberingScheme>> {
        Ok(self
            .store()
            .list()?
            .into_iter()
            .find(|s| s.sector == sector && s.is_default && s.is_active))
    }

    /// Reports whether numbering is enabled for a sector and what comes next.
    pub fn numbering_info(&self, sector: Sector) -> Result<NumberingInfo> {
        let Some(scheme) = self.default_scheme(sector)? else {
            return Ok(NumberingInfo {
                sector,
                enabled: false,
                auto_generate: false,
                scheme_id: None,
                pattern: None,
                next_preview: None,
            });
        };

        let definition = self.definition(&scheme)?;
        let next = scheme.next_value_at(self.allocator.clock().now());
        // Preview is lenient regardless of the strict setting
        let ctx = self.resolver().strict(false).resolve(
            &definition,
            &EntityContext::new(),
            &scheme.defaults,
            Some(next),
        )?;

        Ok(NumberingInfo {
            sector,
            enabled: true,
            auto_generate: scheme.auto_generate,
            scheme_id: Some(scheme.id.clone()),
            pattern: Some(scheme.pattern.clone()),
            next_preview: Some(render::render(&definition, &ctx).value),
        })
    }

    // =========================================================================
    // Preview
    // =========================================================================

    /// Renders an unsaved pattern without touching the allocator.
    ///
    /// Successive previews use stand-in sequence values 1, 2, 3, ...
    /// Missing contextual values always render as their token name.
    pub fn preview(&self, pattern: &str, entity: &EntityContext) -> Result<Rendered> {
        let stand_in = self.preview_counter.fetch_add(1, Ordering::Relaxed);
        self.preview_with(pattern, entity, stand_in)
    }

    /// Renders an unsaved pattern with an explicit stand-in sequence value.
    pub fn preview_with(
        &self,
        pattern: &str,
        entity: &EntityContext,
        sequence: u64,
    ) -> Result<Rendered> {
        let definition = pattern::parse(pattern)?;
        let ctx = self.resolver().strict(false).resolve(
            &definition,
            entity,
            &BTreeMap::new(),
            Some(sequence),
        )?;
        Ok(render::render(&definition, &ctx))
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Parses a pattern for saving. Unknown tokens are allowed and listed on the result.
    pub fn validate_pattern(&self, pattern: &str) -> Result<PatternDefinition> {
        let definition = pattern::parse(pattern)?;
        for unknown in definition.unknown_tokens() {
            tracing::warn!(pattern, token = %unknown, "pattern contains unknown token");
        }
        Ok(definition)
    }

    /// Checks a manually entered identifier against the scheme's rules.
    pub fn check_identifier(&self, scheme_id: &str, candidate: &str) -> Result<()> {
        let scheme = self.store().get(scheme_id)?;
        if !scheme.allow_manual_override {
            return Err(Error::ManualOverrideDisallowed(scheme.id));
        }
        if let Some(regex) = compile_validation(&scheme)? {
            if !regex.is_match(candidate) {
                return Err(Error::InvalidIdentifier {
                    identifier: candidate.to_string(),
                    pattern: regex.as_str().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validates and stores a scheme's settings. A default scheme clears the
    /// default flag on every other scheme of its sector.
    ///
    /// Sequence state (counter, epoch, reclaimed pool) is never taken from
    /// `scheme` for a scheme that already exists; see
    /// [`SequenceAllocator::save_settings`].
    pub fn save_scheme(&self, scheme: &NumberingScheme) -> Result<()> {
        self.validate_pattern(&scheme.pattern)?;
        compile_validation(scheme)?;

        if scheme.is_default {
            for other in self.store().list()? {
                if other.id != scheme.id && other.sector == scheme.sector && other.is_default {
                    tracing::info!(scheme = %other.id, sector = %other.sector, "clearing previous default");
                    self.allocator.update(&other.id, |stored, _| {
                        stored.is_default = false;
                        Ok(())
                    })?;
                }
            }
        }

        self.allocator.save_settings(scheme)?;
        tracing::info!(scheme = %scheme.id, pattern = %scheme.pattern, "saved numbering scheme");
        Ok(())
    }

    fn active_scheme(&self, scheme_id: &str) -> Result<NumberingScheme> {
        let scheme = self.store().get(scheme_id)?;
        if !scheme.is_active {
            return Err(Error::SchemeInactive(scheme.id));
        }
        Ok(scheme)
    }
}

fn compile_validation(scheme: &NumberingScheme) -> Result<Option<Regex>> {
    scheme
        .validation_regex
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(|r| {
            Regex::new(r).map_err(|e| Error::InvalidRegex {
                pattern: r.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn finish(
    scheme: &NumberingScheme,
    definition: &PatternDefinition,
    validator: Option<&Regex>,
    ctx: ResolvedContext,
    sequence: Option<u64>,
) -> Generated {
    let ctx = match sequence {
        Some(seq) => ctx.with_sequence(seq),
        None => ctx,
    };
    let Rendered {
        value,
        mut warnings,
    } = render::render(definition, &ctx);

    if let Some(regex) = validator {
        if !regex.is_match(&value) {
            let warning = Warning::ValidationMismatch {
                identifier: value.clone(),
                pattern: regex.as_str().to_string(),
            };
            tracing::warn!(scheme = %scheme.id, %warning, "generated identifier fails validation");
            warnings.push(warning);
        }
    }

    Generated {
        identifier: value,
        scheme_id: scheme.id.clone(),
        sequence,
        warnings,
    }
}
