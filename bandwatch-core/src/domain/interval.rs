//! Bar interval (timeframe) of the watched series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BarInterval {
    #[default]
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
}

impl BarInterval {
    pub const ALL: [BarInterval; 6] = [
        BarInterval::OneMinute,
        BarInterval::ThreeMinutes,
        BarInterval::FiveMinutes,
        BarInterval::FifteenMinutes,
        BarInterval::ThirtyMinutes,
        BarInterval::OneHour,
    ];

    /// Exchange notation ("1m", "1h", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            BarInterval::OneMinute => "1m",
            BarInterval::ThreeMinutes => "3m",
            BarInterval::FiveMinutes => "5m",
            BarInterval::FifteenMinutes => "15m",
            BarInterval::ThirtyMinutes => "30m",
            BarInterval::OneHour => "1h",
        }
    }

    pub fn duration(&self) -> Duration {
        let minutes = match self {
            BarInterval::OneMinute => 1,
            BarInterval::ThreeMinutes => 3,
            BarInterval::FiveMinutes => 5,
            BarInterval::FifteenMinutes => 15,
            BarInterval::ThirtyMinutes => 30,
            BarInterval::OneHour => 60,
        };
        Duration::from_secs(minutes * 60)
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BarInterval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = BarInterval::ALL.iter().map(|i| i.as_str()).collect();
                format!("unknown bar interval '{s}'. Valid: {}", valid.join(", "))
            })
    }
}

impl TryFrom<String> for BarInterval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BarInterval> for String {
    fn from(value: BarInterval) -> Self {
        value.as_str().to_string()
    }
}
