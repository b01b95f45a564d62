use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFrameUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl TimeFrameUnit {
    /// The suffix the exchange uses in interval codes (`1m`, `4h`, `1M`, ...).
    fn suffix(self) -> char {
        match self {
            TimeFrameUnit::Second => 's',
            TimeFrameUnit::Minute => 'm',
            TimeFrameUnit::Hour => 'h',
            TimeFrameUnit::Day => 'd',
            TimeFrameUnit::Week => 'w',
            TimeFrameUnit::Month => 'M',
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c {
            's' => Some(TimeFrameUnit::Second),
            'm' => Some(TimeFrameUnit::Minute),
            'h' => Some(TimeFrameUnit::Hour),
            'd' => Some(TimeFrameUnit::Day),
            'w' => Some(TimeFrameUnit::Week),
            'M' => Some(TimeFrameUnit::Month),
            _ => None,
        }
    }
}

/// A kline interval such as `1m` or `4h`.
///
/// Only the combinations the kline stream accepts can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub fn new(amount: u32, unit: TimeFrameUnit) -> Result<Self, TimeFrameError> {
        Self::validate(amount, unit)?;
        Ok(Self { amount, unit })
    }

    pub fn minutes(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Minute)
    }

    pub fn hours(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Hour)
    }

    fn validate(amount: u32, unit: TimeFrameUnit) -> Result<(), TimeFrameError> {
        let allowed: &[u32] = match unit {
            TimeFrameUnit::Second => &[1],
            TimeFrameUnit::Minute => &[1, 3, 5, 15, 30],
            TimeFrameUnit::Hour => &[1, 2, 4, 6, 8, 12],
            TimeFrameUnit::Day => &[1, 3],
            TimeFrameUnit::Week | TimeFrameUnit::Month => &[1],
        };
        if allowed.contains(&amount) {
            Ok(())
        } else {
            Err(TimeFrameError::InvalidAmount {
                unit,
                message: format!("{amount} is not one of {allowed:?}"),
            })
        }
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self {
            amount: 1,
            unit: TimeFrameUnit::Minute,
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || TimeFrameError::InvalidInput {
            message: format!("Invalid interval: {s:?}"),
        };

        let suffix = s.chars().last().ok_or_else(invalid)?;
        let unit = TimeFrameUnit::from_suffix(suffix).ok_or_else(invalid)?;
        let amount = s[..s.len() - suffix.len_utf8()]
            .parse::<u32>()
            .map_err(|_| invalid())?;

        Self::new(amount, unit)
    }
}

impl TryFrom<String> for TimeFrame {
    type Error = TimeFrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFrame> for String {
    fn from(value: TimeFrame) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    mod timeframe_creation_tests {
        use super::*;

        #[test]
        fn test_valid_minute_timeframe() {
            let tf = TimeFrame::minutes(5).unwrap();
            assert_eq!(tf.amount, 5);
            assert!(matches!(tf.unit, TimeFrameUnit::Minute));
        }

        #[test]
        fn test_valid_hour_timeframe() {
            let tf = TimeFrame::hours(4).unwrap();
            assert_eq!(tf.amount, 4);
            assert!(matches!(tf.unit, TimeFrameUnit::Hour));
        }

        #[test]
        fn test_invalid_minute_timeframe() {
            assert!(TimeFrame::minutes(0).is_err());
            assert!(TimeFrame::minutes(2).is_err());
            assert!(TimeFrame::minutes(60).is_err());
        }

        #[test]
        fn test_invalid_week_timeframe() {
            assert!(TimeFrame::new(2, TimeFrameUnit::Week).is_err());
        }

        #[test]
        fn test_error_messages() {
            match TimeFrame::hours(24) {
                Err(TimeFrameError::InvalidAmount { unit, message }) => {
                    assert_eq!(unit, TimeFrameUnit::Hour);
                    assert!(message.contains("24"));
                }
                other => panic!("Expected InvalidAmount error, got {other:?}"),
            }
        }
    }

    mod interval_code_tests {
        use super::*;

        #[test]
        fn parses_exchange_codes() {
            assert_eq!("1m".parse::<TimeFrame>().unwrap(), TimeFrame::default());
            assert_eq!(
                "1M".parse::<TimeFrame>().unwrap().unit,
                TimeFrameUnit::Month
            );
            assert_eq!("12h".parse::<TimeFrame>().unwrap().to_string(), "12h");
            assert_eq!(" 1s ".parse::<TimeFrame>().unwrap().to_string(), "1s");
        }

        #[test]
        fn rejects_garbage() {
            for bad in ["", "m", "1x", "-1m", "1.5h", "15"] {
                assert!(bad.parse::<TimeFrame>().is_err(), "{bad:?} should fail");
            }
        }

        #[test]
        fn deserializes_from_toml_string() {
            #[derive(Deserialize)]
            struct Holder {
                interval: TimeFrame,
            }
            let h: Holder = toml::from_str(r#"interval = "15m""#).unwrap();
            assert_eq!(h.interval, TimeFrame::minutes(15).unwrap());

            let bad = toml::from_str::<Holder>(r#"interval = "7m""#);
            assert!(bad.is_err());
        }
    }
}
