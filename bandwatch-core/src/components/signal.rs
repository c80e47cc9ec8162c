//! Signal detection: threshold classification of the latest snapshot.
//!
//! Signals are stateless: every cycle re-evaluates the current snapshot and a
//! condition that keeps holding keeps firing. There is no debounce.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::IndicatorSnapshot;

/// Trade signal for the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Long,
    Short,
    None,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::None => "NONE",
        }
    }

    /// True for LONG and SHORT.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::None)
    }

    /// Alert text for an actionable signal.
    pub fn alert_message(&self, symbol: &str) -> Option<String> {
        self.is_actionable()
            .then(|| format!("{} signal detected for {symbol}.", self.as_str()))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bollinger + RSI mean-reversion classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalDetector;

impl SignalDetector {
    pub const RSI_OVERSOLD: f64 = 30.0;
    pub const RSI_OVERBOUGHT: f64 = 70.0;

    /// LONG when the close is at or below the lower band while RSI is oversold,
    /// SHORT when it is at or above the upper band while RSI is overbought.
    /// Any missing input yields NONE.
    pub fn classify(snapshot: &IndicatorSnapshot, latest_close: Option<f64>) -> Signal {
        let (Some(close), Some(rsi)) = (latest_close, snapshot.rsi14) else {
            return Signal::None;
        };

        if let Some(lower) = snapshot.lower_band {
            if close <= lower && rsi < Self::RSI_OVERSOLD {
                return Signal::Long;
            }
        }
        if let Some(upper) = snapshot.upper_band {
            if close >= upper && rsi > Self::RSI_OVERBOUGHT {
                return Signal::Short;
            }
        }
        Signal::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lower: Option<f64>, upper: Option<f64>, rsi: Option<f64>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            lower_band: lower,
            upper_band: upper,
            rsi14: rsi,
            ..IndicatorSnapshot::default()
        }
    }

    #[test]
    fn long_below_lower_band_and_oversold() {
        let snap = snapshot(Some(96.0), Some(104.0), Some(25.0));
        assert_eq!(SignalDetector::classify(&snap, Some(95.0)), Signal::Long);
    }

    #[test]
    fn short_above_upper_band_and_overbought() {
        let snap = snapshot(Some(96.0), Some(104.0), Some(75.0));
        assert_eq!(SignalDetector::classify(&snap, Some(105.0)), Signal::Short);
    }

    #[test]
    fn band_touch_is_inclusive() {
        let snap = snapshot(Some(96.0), Some(104.0), Some(20.0));
        assert_eq!(SignalDetector::classify(&snap, Some(96.0)), Signal::Long);
        let snap = snapshot(Some(96.0), Some(104.0), Some(80.0));
        assert_eq!(SignalDetector::classify(&snap, Some(104.0)), Signal::Short);
    }

    #[test]
    fn rsi_thresholds_are_strict() {
        let snap = snapshot(Some(96.0), Some(104.0), Some(30.0));
        assert_eq!(SignalDetector::classify(&snap, Some(95.0)), Signal::None);
        let snap = snapshot(Some(96.0), Some(104.0), Some(70.0));
        assert_eq!(SignalDetector::classify(&snap, Some(105.0)), Signal::None);
    }

    #[test]
    fn band_condition_alone_is_none() {
        let snap = snapshot(Some(96.0), Some(104.0), Some(50.0));
        assert_eq!(SignalDetector::classify(&snap, Some(95.0)), Signal::None);
        assert_eq!(SignalDetector::classify(&snap, Some(105.0)), Signal::None);
    }

    #[test]
    fn rsi_condition_alone_is_none() {
        let snap = snapshot(Some(96.0), Some(104.0), Some(25.0));
        assert_eq!(SignalDetector::classify(&snap, Some(100.0)), Signal::None);
        let snap = snapshot(Some(96.0), Some(104.0), Some(75.0));
        assert_eq!(SignalDetector::classify(&snap, Some(100.0)), Signal::None);
    }

    #[test]
    fn indeterminate_inputs_never_fire() {
        let snap = snapshot(None, None, Some(10.0));
        assert_eq!(SignalDetector::classify(&snap, Some(1.0)), Signal::None);
        let snap = snapshot(Some(96.0), Some(104.0), None);
        assert_eq!(SignalDetector::classify(&snap, Some(1.0)), Signal::None);
        let snap = snapshot(Some(96.0), Some(104.0), Some(10.0));
        assert_eq!(SignalDetector::classify(&snap, None), Signal::None);
    }

    #[test]
    fn alert_message_format() {
        assert_eq!(
            Signal::Long.alert_message("BTC/USDT").as_deref(),
            Some("LONG signal detected for BTC/USDT.")
        );
        assert_eq!(
            Signal::Short.alert_message("ETH/USDT").as_deref(),
            Some("SHORT signal detected for ETH/USDT.")
        );
        assert_eq!(Signal::None.alert_message("BTC/USDT"), None);
    }

    #[test]
    fn signal_display() {
        assert_eq!(Signal::Long.to_string(), "LONG");
        assert_eq!(Signal::None.to_string(), "NONE");
    }
}
