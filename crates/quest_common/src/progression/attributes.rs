//! Attribute tracks
//!
//! Nine independent skill tracks, each with its own XP pool on the player
//! record and leveled on the global curve.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the nine skill tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Attribute {
    Str,
    Int,
    Wis,
    Art,
    Home,
    Out,
    Read,
    Cinema,
    Career,
}

impl Attribute {
    pub const COUNT: usize = 9;

    pub const ALL: [Attribute; Attribute::COUNT] = [
        Attribute::Str,
        Attribute::Int,
        Attribute::Wis,
        Attribute::Art,
        Attribute::Home,
        Attribute::Out,
        Attribute::Read,
        Attribute::Cinema,
        Attribute::Career,
    ];

    /// Used when input is missing or unrecognized
    pub const DEFAULT: Attribute = Attribute::Wis;

    /// Stored code ("STR", "INT", ...)
    pub fn code(&self) -> &'static str {
        match self {
            Attribute::Str => "STR",
            Attribute::Int => "INT",
            Attribute::Wis => "WIS",
            Attribute::Art => "ART",
            Attribute::Home => "HOME",
            Attribute::Out => "OUT",
            Attribute::Read => "READ",
            Attribute::Cinema => "CINEMA",
            Attribute::Career => "CAREER",
        }
    }

    /// Player table column holding this attribute's XP
    pub fn column(&self) -> &'static str {
        match self {
            Attribute::Str => "xp_str",
            Attribute::Int => "xp_int",
            Attribute::Wis => "xp_wis",
            Attribute::Art => "xp_art",
            Attribute::Home => "xp_home",
            Attribute::Out => "xp_out",
            Attribute::Read => "xp_read",
            Attribute::Cinema => "xp_cinema",
            Attribute::Career => "xp_career",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    /// Strict parse, case-insensitive. `None` for anything unrecognized.
    pub fn parse(input: &str) -> Option<Self> {
        let wanted = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.code().eq_ignore_ascii_case(wanted))
    }

    /// Lenient parse: empty or unknown input falls back to [`Attribute::DEFAULT`].
    pub fn parse_or_default(input: &str) -> Self {
        Self::parse(input).unwrap_or(Self::DEFAULT)
    }
}

impl Default for Attribute {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Per-attribute XP pools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeXp([u64; Attribute::COUNT]);

impl AttributeXp {
    pub fn get(&self, attr: Attribute) -> u64 {
        self.0[attr.index()]
    }

    pub fn set(&mut self, attr: Attribute, xp: u64) {
        self.0[attr.index()] = xp;
    }

    pub fn add(&mut self, attr: Attribute, xp: u64) {
        let slot = &mut self.0[attr.index()];
        *slot = slot.saturating_add(xp);
    }

    /// Subtract, clamping at zero
    pub fn subtract(&mut self, attr: Attribute, xp: u64) {
        let slot = &mut self.0[attr.index()];
        *slot = slot.saturating_sub(xp);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, u64)> + '_ {
        Attribute::ALL.iter().map(move |a| (*a, self.get(*a)))
    }
}

/// Relative weights over several attributes. Weights need not sum to 100.
///
/// Backed by a `BTreeMap` so iteration order (and therefore who receives
/// the rounding remainder) is always the declaration order of [`Attribute`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeWeights(BTreeMap<Attribute, u32>);

impl AttributeWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add weight to an attribute; repeated attributes accumulate, saturating
    /// at `u32::MAX`
    pub fn add(&mut self, attr: Attribute, weight: u32) {
        let slot = self.0.entry(attr).or_insert(0);
        *slot = slot.saturating_add(weight);
    }

    pub fn from_pairs<I: IntoIterator<Item = (Attribute, u32)>>(pairs: I) -> Self {
        let mut weights = Self::new();
        for (attr, weight) in pairs {
            weights.add(attr, weight);
        }
        weights
    }

    /// Rebuild from stored codes, mapping unknown codes to the default attribute
    pub fn from_codes(raw: &BTreeMap<String, u32>) -> Self {
        Self::from_pairs(
            raw.iter()
                .map(|(code, weight)| (Attribute::parse_or_default(code), *weight)),
        )
    }

    /// Stored form keyed by attribute code
    pub fn to_codes(&self) -> BTreeMap<String, u32> {
        self.0
            .iter()
            .map(|(attr, weight)| (attr.code().to_string(), *weight))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|w| *w as u64).sum()
    }

    pub fn get(&self, attr: Attribute) -> u32 {
        self.0.get(&attr).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, u32)> + '_ {
        self.0.iter().map(|(a, w)| (*a, *w))
    }

    /// Split `total_xp` proportionally: each attribute gets
    /// `floor(total_xp * weight / sum)` and the truncation remainder goes to
    /// the last attribute in iteration order. Returns `None` when the weights
    /// sum to zero.
    pub fn split(&self, total_xp: u64) -> Option<Vec<(Attribute, u64)>> {
        let total_weight = self.total();
        if total_weight == 0 {
            return None;
        }

        let mut shares: Vec<(Attribute, u64)> = self
            .iter()
            .map(|(attr, weight)| {
                let share = (total_xp as u128 * weight as u128 / total_weight as u128) as u64;
                (attr, share)
            })
            .collect();

        let distributed: u64 = shares.iter().map(|(_, s)| *s).sum();
        if let Some(last) = shares.last_mut() {
            last.1 += total_xp - distributed;
        }
        Some(shares)
    }
}

/// Parse attribute input: a single code ("str") or a weighted list
/// ("str:50,int:50").
///
/// The primary attribute is the first one listed. A single code without a
/// weight yields no weight map; an empty input yields the default attribute.
pub fn parse_attributes(input: &str) -> Result<(Attribute, Option<AttributeWeights>)> {
    let trimmed = input.trim();
    if !trimmed.contains(',') && !trimmed.contains(':') {
        return Ok((Attribute::parse_or_default(trimmed), None));
    }

    let mut primary = None;
    let mut weights = AttributeWeights::new();
    for part in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (code, weight) = match part.split_once(':') {
            Some((code, raw)) => {
                let weight = raw.trim().parse::<u32>().map_err(|_| {
                    EngineError::Validation(format!("invalid attribute weight: {:?}", part))
                })?;
                (code, weight)
            }
            None => (part, 1),
        };
        let attr = Attribute::parse_or_default(code);
        primary.get_or_insert(attr);
        weights.add(attr, weight);
    }

    match primary {
        Some(primary) => Ok((primary, Some(weights))),
        None => Ok((Attribute::DEFAULT, None)),
    }
}
