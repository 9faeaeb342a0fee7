//! Data structures for one captured snapshot of readings.
//!
//! Every reading is optional: an absent value means the source could not
//! provide it and must never be read as zero.

use std::fmt;

use crate::alerts::AlertKind;

/// One consistent bundle of readings, captured once per poll cycle and shared
/// read-only by every subscriber evaluation of that cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Outdoor sensor readings, `None` when the source failed
    pub outdoor: Option<Outdoor>,
    /// Indoor sensor readings, `None` when the source failed
    pub indoor: Option<Indoor>,
    /// Aurora forecast and space weather, `None` when the source failed
    pub aurora: Option<Aurora>,
    /// Current official warnings, `None` when the source failed.
    ///
    /// `Some(vec![])` means the source answered and there is no warning.
    pub warnings: Option<Vec<OfficialWarning>>,
}

/// Outdoor sensor readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outdoor {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub dew_point: Option<f64>,
    /// Local sensor warning codes such as `frost`
    pub warnings: Vec<String>,
}

/// Indoor sensor readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Indoor {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    /// Equivalent CO2 in ppm
    pub eco2: Option<f64>,
    /// Total volatile organic compounds in ppb
    pub tvoc: Option<f64>,
    /// Air quality warning codes such as `high_co2`
    pub warnings: Vec<String>,
}

/// Aurora visibility forecast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aurora {
    /// Visibility probability in percent
    pub probability: Option<f64>,
    /// Planetary K index
    pub kp_index: Option<f64>,
}

/// An official weather warning for the monitored area.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficialWarning {
    pub severity: Severity,
    pub event: String,
    pub description: String,
    pub area: String,
}

/// Warning levels, from the least to the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Yellow = 1,
    Orange = 2,
    Red = 3,
}

impl Severity {
    /// Numeric level compared against subscriber thresholds.
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Parses a numeric level, clamping out of range values.
    pub fn from_level(level: f64) -> Self {
        if level >= 3.0 {
            Severity::Red
        } else if level >= 2.0 {
            Severity::Orange
        } else {
            Severity::Yellow
        }
    }

    /// Parses a level name, in Swedish or English.
    ///
    /// Unknown names are treated as the lowest level.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "red" | "röd" | "rod" => Severity::Red,
            "orange" => Severity::Orange,
            _ => Severity::Yellow,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Severity::Yellow => "yellow",
            Severity::Orange => "orange",
            Severity::Red => "red",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.outdoor {
            Some(o) => writeln!(
                f,
                "outdoor: temperature={} humidity={} pressure={} dew_point={} warnings={:?}",
                reading(o.temperature),
                reading(o.humidity),
                reading(o.pressure),
                reading(o.dew_point),
                o.warnings
            )?,
            None => writeln!(f, "outdoor: unavailable")?,
        }
        match &self.indoor {
            Some(i) => writeln!(
                f,
                "indoor: temperature={} humidity={} eco2={} tvoc={} warnings={:?}",
                reading(i.temperature),
                reading(i.humidity),
                reading(i.eco2),
                reading(i.tvoc),
                i.warnings
            )?,
            None => writeln!(f, "indoor: unavailable")?,
        }
        match &self.aurora {
            Some(a) => writeln!(
                f,
                "aurora: probability={} kp={}",
                reading(a.probability),
                reading(a.kp_index)
            )?,
            None => writeln!(f, "aurora: unavailable")?,
        }
        match &self.warnings {
            Some(warnings) if warnings.is_empty() => write!(f, "warnings: none"),
            Some(warnings) => {
                write!(f, "warnings:")?;
                for w in warnings {
                    write!(f, "\n  [{}] {}: {} ({})", w.severity, w.event, w.description, w.area)?;
                }
                Ok(())
            }
            None => write!(f, "warnings: unavailable"),
        }
    }
}

fn reading(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// The part of a snapshot an alert kind looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation<'a> {
    /// A single numeric reading
    Reading(f64),
    /// The list of current official warnings
    Warnings(&'a [OfficialWarning]),
}

impl Snapshot {
    /// Selects the data `kind` is evaluated against, or `None` when it is
    /// unavailable in this snapshot.
    pub fn observe(&self, kind: AlertKind) -> Option<Observation<'_>> {
        match kind {
            AlertKind::Co2 => self.indoor.as_ref()?.eco2.map(Observation::Reading),
            AlertKind::LowHumidity => self.indoor.as_ref()?.humidity.map(Observation::Reading),
            AlertKind::AuroraChance => self.aurora.as_ref()?.probability.map(Observation::Reading),
            AlertKind::Kp => self.aurora.as_ref()?.kp_index.map(Observation::Reading),
            AlertKind::Smhi => self.warnings.as_deref().map(Observation::Warnings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_name() {
        assert_eq!(Severity::from_name("gul"), Severity::Yellow);
        assert_eq!(Severity::from_name("Yellow"), Severity::Yellow);
        assert_eq!(Severity::from_name("orange"), Severity::Orange);
        assert_eq!(Severity::from_name("RÖD"), Severity::Red);
        assert_eq!(Severity::from_name("red"), Severity::Red);
        assert_eq!(Severity::from_name("purple"), Severity::Yellow);
    }

    #[test]
    fn test_severity_from_level() {
        assert_eq!(Severity::from_level(0.0), Severity::Yellow);
        assert_eq!(Severity::from_level(2.0), Severity::Orange);
        assert_eq!(Severity::from_level(9.0), Severity::Red);
        assert_eq!(Severity::Red.level(), 3);
        assert!(Severity::Orange > Severity::Yellow);
    }

    #[test]
    fn test_display_marks_unavailable_sources() {
        let snapshot = Snapshot {
            indoor: Some(Indoor {
                eco2: Some(850.0),
                ..Default::default()
            }),
            warnings: Some(vec![OfficialWarning {
                severity: Severity::Orange,
                event: "Snöfall".to_owned(),
                description: "Kraftigt snöfall".to_owned(),
                area: "Dalarna".to_owned(),
            }]),
            ..Default::default()
        };

        let display = format!("{}", snapshot);
        assert!(display.contains("outdoor: unavailable"));
        assert!(display.contains("eco2=850 tvoc=-"));
        assert!(display.contains("aurora: unavailable"));
        assert!(display.contains("[orange] Snöfall: Kraftigt snöfall (Dalarna)"));
    }

    #[test]
    fn test_observe_missing_sources() {
        let snapshot = Snapshot::default();
        for kind in AlertKind::ALL {
            assert_eq!(snapshot.observe(kind), None);
        }
    }

    #[test]
    fn test_observe_selects_fields() {
        let snapshot = Snapshot {
            outdoor: None,
            indoor: Some(Indoor {
                humidity: Some(25.0),
                eco2: None,
                ..Default::default()
            }),
            aurora: Some(Aurora {
                probability: Some(40.0),
                kp_index: Some(5.3),
            }),
            warnings: Some(vec![]),
        };

        assert_eq!(snapshot.observe(AlertKind::Co2), None);
        assert_eq!(
            snapshot.observe(AlertKind::LowHumidity),
            Some(Observation::Reading(25.0))
        );
        assert_eq!(
            snapshot.observe(AlertKind::AuroraChance),
            Some(Observation::Reading(40.0))
        );
        assert_eq!(
            snapshot.observe(AlertKind::Kp),
            Some(Observation::Reading(5.3))
        );
        assert_eq!(
            snapshot.observe(AlertKind::Smhi),
            Some(Observation::Warnings(&[]))
        );
    }
}
