//! # Numbering Schemes
//!
//! A named, persisted binding of a pattern to sequencing and validation rules
//! for one classification sector.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    constants::SEQUENCE_FLOOR,
    error::{Error, Result},
};

/// Classification sector a scheme belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    #[default]
    Archive,
    Museum,
    Library,
    Gallery,
    Dam,
}

impl Sector {
    pub const ALL: [Self; 5] = [
        Self::Archive,
        Self::Museum,
        Self::Library,
        Self::Gallery,
        Self::Dam,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Museum => "museum",
            Self::Library => "library",
            Self::Gallery => "gallery",
            Self::Dam => "dam",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Sector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sector| sector.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown sector '{s}' (expected archive, museum, library, gallery or dam)")
            })
    }
}

/// When the sequence counter starts a new epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SequenceReset {
    #[default]
    Never,
    Yearly,
    Monthly,
    Daily,
}

impl SequenceReset {
    /// Epoch marker for `now` (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`), or `None` for `Never`.
    pub fn epoch(self, now: DateTime<Utc>) -> Option<String> {
        let format = match self {
            Self::Never => return None,
            Self::Yearly => "%Y",
            Self::Monthly => "%Y-%m",
            Self::Daily => "%Y-%m-%d",
        };
        Some(now.format(format).to_string())
    }
}

impl fmt::Display for SequenceReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::Yearly => write!(f, "yearly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Daily => write!(f, "daily"),
        }
    }
}

impl FromStr for SequenceReset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "yearly" => Ok(Self::Yearly),
            "monthly" => Ok(Self::Monthly),
            "daily" => Ok(Self::Daily),
            _ => Err(format!(
                "unknown reset policy '{s}' (expected never, yearly, monthly or daily)"
            )),
        }
    }
}

/// Allocation state of a scheme relative to the current clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceState {
    /// Counting normally within the recorded epoch
    Active,
    /// A reset boundary was crossed; the next allocation starts a new epoch
    ResetPending { epoch: String },
}

/// Persisted numbering scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingScheme {
    /// Stable identifier (file stem in file-backed stores)
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub sector: Sector,

    /// Raw pattern text, e.g. `{REPO}/{FONDS}/{SEQ:4}`
    pub pattern: String,

    /// Last issued sequence value in the current epoch
    #[serde(default)]
    pub current_sequence: u64,

    /// Highest value issued in the current epoch; survives forced resets
    #[serde(default)]
    pub high_water: u64,

    #[serde(default)]
    pub sequence_reset: SequenceReset,

    /// Epoch marker of the last allocation (see [`SequenceReset::epoch`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<String>,

    /// Reuse reclaimed values before incrementing
    #[serde(default)]
    pub fill_gaps: bool,

    /// Values returned to the pool (fill-gaps mode only)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub reclaimed: BTreeSet<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,

    #[serde(default)]
    pub allow_manual_override: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default = "default_true")]
    pub auto_generate: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Fallback values for contextual tokens
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, String>,
}

#[allow(clippy::missing_const_for_fn)] // serde default functions can't be const
fn default_true() -> bool {
    true
}

impl NumberingScheme {
    /// Creates an active, auto-generating scheme with a fresh counter.
    pub fn new(id: &str, sector: Sector, pattern: &str) -> Result<Self> {
        validate_id(id)?;
        Ok(Self {
            id: id.to_string(),
            name: id.to_string(),
            sector,
            pattern: pattern.to_string(),
            current_sequence: SEQUENCE_FLOOR,
            high_water: SEQUENCE_FLOOR,
            sequence_reset: SequenceReset::Never,
            epoch: None,
            fill_gaps: false,
            reclaimed: BTreeSet::new(),
            validation_regex: None,
            allow_manual_override: false,
            is_active: true,
            is_default: false,
            auto_generate: true,
            updated_at: None,
            defaults: BTreeMap::new(),
        })
    }

    /// Determines whether the next allocation crosses a reset boundary.
    pub fn state(&self, now: DateTime<Utc>) -> SequenceState {
        match (self.sequence_reset.epoch(now), &self.epoch) {
            (Some(current), Some(recorded)) if &current != recorded => {
                SequenceState::ResetPending { epoch: current }
            }
            _ => SequenceState::Active,
        }
    }

    /// Starts a new epoch: counter to the floor, pool cleared.
    pub(crate) fn begin_epoch(&mut self, epoch: String) {
        self.current_sequence = SEQUENCE_FLOOR;
        self.high_water = SEQUENCE_FLOOR;
        self.reclaimed.clear();
        self.epoch = Some(epoch);
    }

    /// Highest value handed out in the current epoch.
    ///
    /// Documents written before `high_water` existed fall back to the counter.
    pub fn highest_issued(&self) -> u64 {
        self.high_water.max(self.current_sequence)
    }

    /// Moves the counter `count` values forward and returns the new last value.
    ///
    /// `u64::MAX` is never issued, so every issued block fits a half-open range.
    pub(crate) fn advance(&mut self, count: u64) -> Result<u64> {
        let last = self
            .current_sequence
            .checked_add(count)
            .filter(|&last| last < u64::MAX)
            .ok_or_else(|| Error::SequenceExhausted {
                scheme: self.id.clone(),
                current: self.current_sequence,
                requested: count,
            })?;
        self.current_sequence = last;
        self.high_water = self.high_water.max(last);
        Ok(last)
    }

    /// Copies the allocation state (counter, high-water mark, epoch, pool) from `stored`.
    pub(crate) fn keep_counter_of(&mut self, stored: &Self) {
        self.current_sequence = stored.current_sequence;
        self.high_water = stored.high_water;
        self.epoch.clone_from(&stored.epoch);
        self.reclaimed.clone_from(&stored.reclaimed);
    }

    /// Records the epoch marker on first use without resetting.
    pub(crate) fn touch_epoch(&mut self, now: DateTime<Utc>) {
        if self.epoch.is_none() {
            self.epoch = self.sequence_reset.epoch(now);
        }
    }

    /// The value the next single allocation would return at `now`.
    pub fn next_value_at(&self, now: DateTime<Utc>) -> u64 {
        match self.state(now) {
            SequenceState::ResetPending { .. } => SEQUENCE_FLOOR + 1,
            SequenceState::Active => {
                let pooled = if self.fill_gaps {
                    self.reclaimed.first().copied()
                } else {
                    None
                };
                pooled.unwrap_or_else(|| self.current_sequence.saturating_add(1))
            }
        }
    }
}

/// Scheme ids double as file names, so keep them to a safe character set.
pub fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidSchemeId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_epoch_markers() {
        let now = at(2024, 3, 7);
        assert_eq!(SequenceReset::Never.epoch(now), None);
        assert_eq!(SequenceReset::Yearly.epoch(now).as_deref(), Some("2024"));
        assert_eq!(SequenceReset::Monthly.epoch(now).as_deref(), Some("2024-03"));
        assert_eq!(
            SequenceReset::Daily.epoch(now).as_deref(),
            Some("2024-03-07")
        );
    }

    #[test]
    fn test_state_detects_boundary() {
        let mut scheme = NumberingScheme::new("acc", Sector::Museum, "{SEQ}").unwrap();
        scheme.sequence_reset = SequenceReset::Yearly;
        assert_eq!(scheme.state(at(2024, 1, 1)), SequenceState::Active);

        scheme.epoch = Some("2024".to_string());
        assert_eq!(scheme.state(at(2024, 12, 31)), SequenceState::Active);
        assert_eq!(
            scheme.state(at(2025, 1, 1)),
            SequenceState::ResetPending {
                epoch: "2025".to_string()
            }
        );
    }

    #[test]
    fn test_next_value_at() {
        let mut scheme = NumberingScheme::new("acc", Sector::Archive, "{SEQ}").unwrap();
        scheme.current_sequence = 9;
        assert_eq!(scheme.next_value_at(at(2024, 1, 1)), 10);

        scheme.reclaimed.insert(4);
        assert_eq!(scheme.next_value_at(at(2024, 1, 1)), 10);
        scheme.fill_gaps = true;
        assert_eq!(scheme.next_value_at(at(2024, 1, 1)), 4);

        scheme.sequence_reset = SequenceReset::Monthly;
        scheme.epoch = Some("2023-12".to_string());
        assert_eq!(scheme.next_value_at(at(2024, 1, 1)), 1);
    }

    #[test]
    fn test_advance_tracks_highest_issued() {
        let mut scheme = NumberingScheme::new("acc", Sector::Archive, "{SEQ}").unwrap();
        assert_eq!(scheme.advance(3).unwrap(), 3);
        scheme.current_sequence = 1;
        assert_eq!(scheme.highest_issued(), 3);

        scheme.current_sequence = u64::MAX - 1;
        assert!(matches!(
            scheme.advance(1),
            Err(Error::SequenceExhausted { requested: 1, .. })
        ));
        assert_eq!(scheme.current_sequence, u64::MAX - 1);
        assert_eq!(scheme.next_value_at(at(2024, 1, 1)), u64::MAX);

        scheme.begin_epoch("2025".to_string());
        assert_eq!(scheme.highest_issued(), 0);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("DAM".parse::<Sector>().unwrap(), Sector::Dam);
        assert!("zoo".parse::<Sector>().is_err());
        assert_eq!(
            "Yearly".parse::<SequenceReset>().unwrap(),
            SequenceReset::Yearly
        );
        assert!("weekly".parse::<SequenceReset>().is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("archive-standard_2").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc").is_err());
        assert!(validate_id("a b").is_err());
    }

    #[test]
    fn test_toml_defaults() {
        let scheme: NumberingScheme = toml::from_str(
            r#"
id = "lib"
name = "Library"
pattern = "LIB-{SEQ:6}"
"#,
        )
        .unwrap();
        assert_eq!(scheme.sector, Sector::Archive);
        assert_eq!(scheme.current_sequence, 0);
        assert_eq!(scheme.high_water, 0);
        assert!(scheme.is_active);
        assert!(scheme.auto_generate);
        assert!(!scheme.fill_gaps);
        assert_eq!(scheme.sequence_reset, SequenceReset::Never);
    }
}
