use log::warn;

/// Default minimum confidence, as a percentage, when none is configured or
/// the configured value is unusable.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 80.0;

/// Minimum confidence the dominant class must reach for a frame to count,
/// held as a fraction in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    /// Build from a percentage in [0, 100]. Non-finite or out-of-range input
    /// falls back to the default.
    pub fn from_percent(percent: f64) -> Self {
        if percent.is_finite() && (0.0..=100.0).contains(&percent) {
            Self(percent / 100.0)
        } else {
            warn!(
                "invalid confidence threshold {percent}%, using default {DEFAULT_THRESHOLD_PERCENT}%"
            );
            Self::default()
        }
    }

    pub fn fraction(self) -> f64 {
        self.0
    }

    pub fn clears(self, confidence: f64) -> bool {
        confidence >= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD_PERCENT / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_percentages_convert_to_fractions() {
        assert_eq!(Threshold::from_percent(80.0).fraction(), 0.8);
        assert_eq!(Threshold::from_percent(0.0).fraction(), 0.0);
        assert_eq!(Threshold::from_percent(100.0).fraction(), 1.0);
    }

    #[test]
    fn invalid_percentages_fall_back_to_default() {
        assert_eq!(Threshold::from_percent(-5.0), Threshold::default());
        assert_eq!(Threshold::from_percent(150.0), Threshold::default());
        assert_eq!(Threshold::from_percent(f64::NAN), Threshold::default());
        assert_eq!(Threshold::from_percent(f64::INFINITY), Threshold::default());
    }

    #[test]
    fn clears_is_inclusive_at_the_boundary() {
        let threshold = Threshold::from_percent(80.0);
        assert!(threshold.clears(0.8));
        assert!(threshold.clears(0.81));
        assert!(!threshold.clears(0.79));
    }
}
