//! Post-interpolation temperature compensation

/// How the interpolated temperature is adjusted before it is reported
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Compensation {
    /// Pass-through
    #[default]
    None,
    /// `value + offset`
    Simple { offset: f64 },
    /// `value * scale + offset`
    Linear { scale: f64, offset: f64 },
    /// `value + coefficient * external`, where `external` is another metric
    /// such as the CPU temperature
    Proportional { coefficient: f64 },
}

impl Compensation {
    /// Only the proportional mode consumes an external metric
    pub fn needs_external_metric(&self) -> bool {
        matches!(self, Self::Proportional { .. })
    }

    /// Adjust `value`. Proportional mode without a metric returns `value` as is.
    pub fn apply(&self, value: f64, external: Option<f64>) -> f64 {
        match *self {
            Self::None => value,
            Self::Simple { offset } => value + offset,
            Self::Linear { scale, offset } => value * scale + offset,
            Self::Proportional { coefficient } => match external {
                Some(metric) => value + coefficient * metric,
                None => value,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_passes_through() {
        assert_eq!(Compensation::None.apply(21.5, Some(60.0)), 21.5);
    }

    #[test]
    fn test_simple_adds_offset() {
        assert_eq!(Compensation::Simple { offset: -1.5 }.apply(21.5, None), 20.0);
    }

    #[test]
    fn test_linear_scales_then_offsets() {
        let c = Compensation::Linear {
            scale: 0.5,
            offset: 2.0,
        };
        assert_eq!(c.apply(30.0, None), 17.0);
    }

    #[test]
    fn test_proportional_uses_external_metric() {
        let c = Compensation::Proportional { coefficient: -0.25 };
        assert!(c.needs_external_metric());
        assert_eq!(c.apply(30.0, Some(50.0)), 17.5);
    }

    #[test]
    fn test_proportional_without_metric_is_skipped() {
        let c = Compensation::Proportional { coefficient: -0.25 };
        assert_eq!(c.apply(30.0, None), 30.0);
    }

    #[test]
    fn test_only_proportional_needs_metric() {
        assert!(!Compensation::None.needs_external_metric());
        assert!(!Compensation::Simple { offset: 1.0 }.needs_external_metric());
        assert!(!Compensation::Linear {
            scale: 1.0,
            offset: 0.0
        }
        .needs_external_metric());
    }
}
