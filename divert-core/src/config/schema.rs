//! Accepted sections, keys and value ranges of the machine file
//!
//! The runtime parser and the firmware build script both validate
//! against these tables, so a file that builds always loads.

/// One accepted key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub name: &'static str,
    /// Smallest accepted value
    pub min: u64,
    /// Largest accepted value
    pub max: u64,
    /// Number of values: 1 for a scalar, N for an `[a, b, ...]` array
    pub count: usize,
}

impl KeySpec {
    const fn scalar(name: &'static str, min: u64, max: u64) -> Self {
        Self {
            name,
            min,
            max,
            count: 1,
        }
    }

    const fn array(name: &'static str, min: u64, max: u64, count: usize) -> Self {
        Self {
            name,
            min,
            max,
            count,
        }
    }

    pub fn accepts(&self, value: u64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn is_array(&self) -> bool {
        self.count > 1
    }
}

/// One `[section]` and its keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: &'static str,
    pub keys: &'static [KeySpec],
}

impl SectionSpec {
    pub fn key(&self, name: &str) -> Option<&'static KeySpec> {
        self.keys.iter().find(|k| k.name == name)
    }
}

const U8: u64 = u8::MAX as u64;
const U16: u64 = u16::MAX as u64;
const U32: u64 = u32::MAX as u64;

pub const SENSE: SectionSpec = SectionSpec {
    name: "sense",
    keys: &[
        KeySpec::scalar("sample_period_ms", 1, U32),
        KeySpec::scalar("quiet_timeout_ms", 1, U32),
        KeySpec::scalar("small_max_mm", 0, U16),
        KeySpec::scalar("ambiguity_floor", 0, U16),
        KeySpec::scalar("default_belt_mm_per_s", 1, U16),
    ],
};

pub const DECIDE: SectionSpec = SectionSpec {
    name: "decide",
    keys: &[
        KeySpec::array("distances_mm", 1, U16, crate::traits::CHANNEL_COUNT),
        KeySpec::scalar("advance_ms", 0, U32),
        KeySpec::scalar("min_spacing_ms", 0, U16),
        // 0 disables the throughput limit
        KeySpec::scalar("max_blocks_per_min", 0, U8),
    ],
};

pub const ACTUATE: SectionSpec = SectionSpec {
    name: "actuate",
    keys: &[
        KeySpec::scalar("dwell_ms", 1, U32),
        KeySpec::scalar("active_pulse_us", 500, 2500),
        KeySpec::scalar("neutral_pulse_us", 500, 2500),
        KeySpec::scalar("startup_mute_ms", 0, U32),
    ],
};

pub const BELT: SectionSpec = SectionSpec {
    name: "belt",
    keys: &[
        KeySpec::scalar("mm_per_s", 0, U16),
        KeySpec::scalar("full_steps_per_rev", 1, U16),
        KeySpec::scalar("microsteps", 1, U16),
        KeySpec::scalar("pinion_teeth", 1, U16),
        KeySpec::scalar("pulley_teeth", 1, U16),
        KeySpec::scalar("roller_diameter_mm", 1, U16),
        KeySpec::scalar("pi_x1000", 1, U32),
    ],
};

pub const RANGE: SectionSpec = SectionSpec {
    name: "range",
    keys: &[
        KeySpec::scalar("threshold_mm", 1, U8),
        KeySpec::scalar("hysteresis_mm", 0, U8),
        // Sensor period register holds (ms / 10 - 1) in one byte
        KeySpec::scalar("measurement_period_ms", 10, 2560),
    ],
};

pub const TELEMETRY: SectionSpec = SectionSpec {
    name: "telemetry",
    keys: &[KeySpec::scalar("count_interval_ms", 0, U32)],
};

/// Every accepted section
pub const SECTIONS: &[SectionSpec] = &[SENSE, DECIDE, ACTUATE, BELT, RANGE, TELEMETRY];

/// Look up a section by name
pub fn section(name: &str) -> Option<&'static SectionSpec> {
    SECTIONS.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use core::fmt::Write;

    use heapless::String;

    use super::*;
    use crate::config::{parse_config, ParseError};

    fn parse_one(section: &SectionSpec, spec: &KeySpec, value: u64) -> Result<(), ParseError> {
        let mut text: String<128> = String::new();
        write!(text, "[{}]\n{} = ", section.name, spec.name).unwrap();
        if spec.is_array() {
            text.push('[').unwrap();
            for _ in 0..spec.count {
                write!(text, "{}, ", value).unwrap();
            }
            text.push(']').unwrap();
        } else {
            write!(text, "{}", value).unwrap();
        }
        parse_config(&text).map(|_| ())
    }

    #[test]
    fn test_parser_accepts_every_bound() {
        for section in SECTIONS {
            for spec in section.keys {
                assert_eq!(parse_one(section, spec, spec.min), Ok(()), "{}", spec.name);
                assert_eq!(parse_one(section, spec, spec.max), Ok(()), "{}", spec.name);
            }
        }
    }

    #[test]
    fn test_parser_rejects_outside_bounds() {
        for section in SECTIONS {
            for spec in section.keys {
                if spec.min > 0 {
                    assert_eq!(
                        parse_one(section, spec, spec.min - 1),
                        Err(ParseError::InvalidValue),
                        "{}",
                        spec.name
                    );
                }
                assert_eq!(
                    parse_one(section, spec, spec.max + 1),
                    Err(ParseError::InvalidValue),
                    "{}",
                    spec.name
                );
            }
        }
    }

    #[test]
    fn test_every_parsed_key_is_listed() {
        // Keys the parser knows, by section; a new field must land in both places
        let parsed: &[(&str, &[&str])] = &[
            (
                "sense",
                &[
                    "sample_period_ms",
                    "quiet_timeout_ms",
                    "small_max_mm",
                    "ambiguity_floor",
                    "default_belt_mm_per_s",
                ],
            ),
            (
                "decide",
                &["distances_mm", "advance_ms", "min_spacing_ms", "max_blocks_per_min"],
            ),
            (
                "actuate",
                &["dwell_ms", "active_pulse_us", "neutral_pulse_us", "startup_mute_ms"],
            ),
            (
                "belt",
                &[
                    "mm_per_s",
                    "full_steps_per_rev",
                    "microsteps",
                    "pinion_teeth",
                    "pulley_teeth",
                    "roller_diameter_mm",
                    "pi_x1000",
                ],
            ),
            ("range", &["threshold_mm", "hysteresis_mm", "measurement_period_ms"]),
            ("telemetry", &["count_interval_ms"]),
        ];
        assert_eq!(parsed.len(), SECTIONS.len());
        for (name, keys) in parsed {
            let spec = section(name).unwrap();
            assert_eq!(spec.keys.len(), keys.len(), "{}", name);
            for key in *keys {
                assert!(spec.key(key).is_some(), "{}.{}", name, key);
            }
        }
    }

    #[test]
    fn test_defaults_are_in_range() {
        let c = crate::config::SorterConfig::default();
        let defaults: &[(&SectionSpec, &str, u64)] = &[
            (&SENSE, "sample_period_ms", u64::from(c.sense.sample_period_ms)),
            (&SENSE, "quiet_timeout_ms", u64::from(c.sense.quiet_timeout_ms)),
            (&SENSE, "default_belt_mm_per_s", u64::from(c.sense.default_belt_mm_per_s)),
            (&DECIDE, "max_blocks_per_min", u64::from(c.decide.max_blocks_per_min)),
            (&ACTUATE, "dwell_ms", u64::from(c.actuate.dwell_ms)),
            (&ACTUATE, "active_pulse_us", u64::from(c.actuate.active_pulse_us)),
            (&ACTUATE, "neutral_pulse_us", u64::from(c.actuate.neutral_pulse_us)),
            (&BELT, "pi_x1000", u64::from(c.belt.pi_x1000)),
            (&RANGE, "threshold_mm", u64::from(c.range.threshold_mm)),
            (&RANGE, "measurement_period_ms", u64::from(c.range.measurement_period_ms)),
        ];
        for (section, key, value) in defaults {
            let spec = section.key(key).unwrap();
            assert!(spec.accepts(*value), "{}.{}", section.name, key);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(section("decide"), Some(&DECIDE));
        assert!(section("lighting").is_none());
        assert_eq!(BELT.key("pi_x1000").map(|k| k.min), Some(1));
        assert!(BELT.key("pi").is_none());
    }

    #[test]
    fn test_throughput_limit_can_be_disabled() {
        let config = parse_config("[decide]\nmax_blocks_per_min = 0").unwrap();
        assert_eq!(config.decide.max_blocks_per_min, 0);
    }
}
