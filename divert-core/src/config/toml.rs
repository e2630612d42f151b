//! Minimal parser for the machine configuration file
//!
//! Handles only the subset `machine.toml` uses, without allocation:
//! - `[section]` headers
//! - `key = value` pairs with unsigned integer values (`_` separators allowed)
//! - Integer arrays: `distances_mm = [120, 240, 360]`
//! - Comments (`# ...`), on their own line or trailing a value
//!
//! Unknown sections and keys are rejected rather than ignored, so a typo
//! never silently falls back to the factory value. Accepted keys and
//! ranges come from [`schema`](super::schema).

use super::types::{
    ActuateConfig, BeltConfig, DecideConfig, RangeConfig, SenseConfig, SorterConfig,
    TelemetryConfig,
};
use super::schema::{self, KeySpec, SectionSpec};
use crate::traits::CHANNEL_COUNT;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid for the current section
    UnknownKey,
    /// Value missing, malformed, or out of range for its field
    InvalidValue,
    /// Line is neither a header nor a `key = value` pair
    InvalidLine,
}

/// Parse configuration text into a [`SorterConfig`]
///
/// Keys that are absent keep their default values. Every value is checked
/// against the range [`schema`] lists for its key.
pub fn parse_config(input: &str) -> Result<SorterConfig, ParseError> {
    let mut config = SorterConfig::default();
    let mut section: Option<&'static SectionSpec> = None;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim();
            section = Some(schema::section(name).ok_or(ParseError::InvalidSection)?);
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        // Keys before the first header belong to no section
        let current = section.ok_or(ParseError::UnknownKey)?;
        let spec = current.key(key).ok_or(ParseError::UnknownKey)?;

        match current.name {
            "sense" => apply_sense(&mut config.sense, spec, value)?,
            "decide" => apply_decide(&mut config.decide, spec, value)?,
            "actuate" => apply_actuate(&mut config.actuate, spec, value)?,
            "belt" => apply_belt(&mut config.belt, spec, value)?,
            "range" => apply_range(&mut config.range, spec, value)?,
            "telemetry" => apply_telemetry(&mut config.telemetry, spec, value)?,
            _ => return Err(ParseError::InvalidSection),
        }
    }

    Ok(config)
}

fn apply_sense(cfg: &mut SenseConfig, spec: &KeySpec, value: &str) -> Result<(), ParseError> {
    match spec.name {
        "sample_period_ms" => cfg.sample_period_ms = parse_value(spec, value)?,
        "quiet_timeout_ms" => cfg.quiet_timeout_ms = parse_value(spec, value)?,
        "small_max_mm" => cfg.small_max_mm = parse_value(spec, value)?,
        "ambiguity_floor" => cfg.ambiguity_floor = parse_value(spec, value)?,
        "default_belt_mm_per_s" => cfg.default_belt_mm_per_s = parse_value(spec, value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_decide(cfg: &mut DecideConfig, spec: &KeySpec, value: &str) -> Result<(), ParseError> {
    match spec.name {
        "distances_mm" => cfg.distances_mm = parse_values(spec, value)?,
        "advance_ms" => cfg.advance_ms = parse_value(spec, value)?,
        "min_spacing_ms" => cfg.min_spacing_ms = parse_value(spec, value)?,
        "max_blocks_per_min" => cfg.max_blocks_per_min = parse_value(spec, value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_actuate(cfg: &mut ActuateConfig, spec: &KeySpec, value: &str) -> Result<(), ParseError> {
    match spec.name {
        "dwell_ms" => cfg.dwell_ms = parse_value(spec, value)?,
        "active_pulse_us" => cfg.active_pulse_us = parse_value(spec, value)?,
        "neutral_pulse_us" => cfg.neutral_pulse_us = parse_value(spec, value)?,
        "startup_mute_ms" => cfg.startup_mute_ms = parse_value(spec, value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_belt(cfg: &mut BeltConfig, spec: &KeySpec, value: &str) -> Result<(), ParseError> {
    match spec.name {
        "mm_per_s" => cfg.mm_per_s = parse_value(spec, value)?,
        "full_steps_per_rev" => cfg.full_steps_per_rev = parse_value(spec, value)?,
        "microsteps" => cfg.microsteps = parse_value(spec, value)?,
        "pinion_teeth" => cfg.pinion_teeth = parse_value(spec, value)?,
        "pulley_teeth" => cfg.pulley_teeth = parse_value(spec, value)?,
        "roller_diameter_mm" => cfg.roller_diameter_mm = parse_value(spec, value)?,
        "pi_x1000" => cfg.pi_x1000 = parse_value(spec, value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_range(cfg: &mut RangeConfig, spec: &KeySpec, value: &str) -> Result<(), ParseError> {
    match spec.name {
        "threshold_mm" => cfg.threshold_mm = parse_value(spec, value)?,
        "hysteresis_mm" => cfg.hysteresis_mm = parse_value(spec, value)?,
        "measurement_period_ms" => cfg.measurement_period_ms = parse_value(spec, value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_telemetry(
    cfg: &mut TelemetryConfig,
    spec: &KeySpec,
    value: &str,
) -> Result<(), ParseError> {
    match spec.name {
        "count_interval_ms" => cfg.count_interval_ms = parse_value(spec, value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Parse a scalar and check it against the key's range
fn parse_value<T: TryFrom<u64>>(spec: &KeySpec, value: &str) -> Result<T, ParseError> {
    if spec.is_array() {
        return Err(ParseError::InvalidValue);
    }
    in_range(spec, parse_int(value)?)
}

/// Parse an array and check every element against the key's range
fn parse_values(spec: &KeySpec, value: &str) -> Result<[u16; CHANNEL_COUNT], ParseError> {
    if spec.count != CHANNEL_COUNT {
        return Err(ParseError::InvalidValue);
    }
    let raw = parse_array(value)?;
    let mut out = [0u16; CHANNEL_COUNT];
    for (slot, v) in out.iter_mut().zip(raw) {
        *slot = in_range(spec, v)?;
    }
    Ok(out)
}

fn in_range<T: TryFrom<u64>>(spec: &KeySpec, value: u64) -> Result<T, ParseError> {
    if !spec.accepts(value) {
        return Err(ParseError::InvalidValue);
    }
    T::try_from(value).map_err(|_| ParseError::InvalidValue)
}

/// Drop a trailing `# comment`
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse an unsigned decimal integer, accepting `_` digit separators
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ParseError> {
    let mut acc: u64 = 0;
    let mut digits = 0;

    for ch in value.chars() {
        if ch == '_' {
            continue;
        }
        let d = ch.to_digit(10).ok_or(ParseError::InvalidValue)?;
        acc = acc
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(d)))
            .ok_or(ParseError::InvalidValue)?;
        digits += 1;
    }

    if digits == 0 {
        return Err(ParseError::InvalidValue);
    }

    T::try_from(acc).map_err(|_| ParseError::InvalidValue)
}

/// Parse `[a, b, c]` into exactly one value per diverter channel
fn parse_array(value: &str) -> Result<[u64; CHANNEL_COUNT], ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    let mut out = [0u64; CHANNEL_COUNT];
    let mut count = 0;

    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if count == CHANNEL_COUNT {
            return Err(ParseError::InvalidValue);
        }
        out[count] = parse_int(item)?;
        count += 1;
    }

    if count != CHANNEL_COUNT {
        return Err(ParseError::InvalidValue);
    }

    Ok(out)
}
