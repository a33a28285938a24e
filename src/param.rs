// src/param.rs
//
// Parameter metadata for display and validation.

use std::fmt;

/// Value domain of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamKind {
    /// Continuous value
    #[default]
    Float,
    /// Whole numbers from `min` to `max`
    Integer,
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamUnit {
    #[default]
    None,
    /// Decibels (gain)
    Db,
    /// Fraction shown as a percentage (0-1 stored)
    Percent,
    /// Seconds
    Seconds,
}

impl fmt::Display for ParamUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamUnit::None => Ok(()),
            ParamUnit::Db => write!(f, "dB"),
            ParamUnit::Percent => write!(f, "%"),
            ParamUnit::Seconds => write!(f, "s"),
        }
    }
}

/// Metadata describing one parameter of a unit.
///
/// Every stored value is clamped to `[min, max]` first.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    /// Human-readable name
    pub name: &'static str,

    pub kind: ParamKind,

    /// Minimum value
    pub min: f32,

    /// Maximum value
    pub max: f32,

    /// Default value
    pub default: f32,

    /// Unit for display
    pub unit: ParamUnit,

    /// Labels for integer parameters, indexed from `min`
    pub choices: &'static [&'static str],
}

impl ParamDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Float,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: ParamUnit::None,
            choices: &[],
        }
    }

    pub const fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub const fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub const fn unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Make this an integer parameter with one label per value.
    pub const fn choices(mut self, labels: &'static [&'static str]) -> Self {
        self.kind = ParamKind::Integer;
        self.choices = labels;
        self
    }

    /// Clamp a value to the valid range. NaN maps to the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default.clamp(self.min, self.max)
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Format a value for display.
    pub fn format(&self, value: f32) -> String {
        match self.kind {
            ParamKind::Integer => {
                let index = (value - self.min).round().max(0.0) as usize;
                match self.choices.get(index) {
                    Some(label) => (*label).to_string(),
                    None => format!("{}", value.round() as i64),
                }
            }
            ParamKind::Float => match self.unit {
                ParamUnit::None => format!("{value:.2}"),
                ParamUnit::Percent => format!("{} {}", (0.5 + 100.0 * value) as i32, self.unit),
                ParamUnit::Seconds => format!("{value:.2} {}", self.unit),
                ParamUnit::Db => format!("{value:.0} {}", self.unit),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OSC: ParamDef = ParamDef::new("osctype").range(0.0, 1.0).choices(&["SQU", "SAW"]);
    const PWM: ParamDef = ParamDef::new("pwm")
        .range(0.01, 0.99)
        .default(0.5)
        .unit(ParamUnit::Percent);

    #[test]
    fn clamp_to_declared_range() {
        assert_eq!(PWM.clamp(2.0), 0.99);
        assert_eq!(PWM.clamp(-1.0), 0.01);
        assert_eq!(PWM.clamp(0.3), 0.3);
    }

    #[test]
    fn non_finite_input_stays_in_range() {
        assert_eq!(PWM.clamp(f32::NAN), 0.5);
        assert_eq!(PWM.clamp(f32::INFINITY), 0.99);
        assert_eq!(PWM.clamp(f32::NEG_INFINITY), 0.01);

        // A default outside the range is clamped too.
        let odd = ParamDef::new("odd").range(1.0, 2.0);
        assert_eq!(odd.clamp(f32::NAN), 1.0);
    }

    #[test]
    fn format_choices_and_units() {
        assert_eq!(OSC.kind, ParamKind::Integer);
        assert_eq!(OSC.format(0.0), "SQU");
        assert_eq!(OSC.format(1.0), "SAW");
        assert_eq!(PWM.format(0.25), "25 %");

        let attack = ParamDef::new("attack").unit(ParamUnit::Seconds);
        assert_eq!(attack.format(0.25), "0.25 s");
    }
}
