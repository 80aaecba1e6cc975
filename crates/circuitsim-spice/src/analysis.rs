use circuitsim_core::format_netlist_value;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, SpiceError};

/// Which analysis to run and its sweep parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum AnalysisRequest {
    /// DC operating point.
    Dc,
    /// Decade AC sweep.
    Ac {
        start_hz: f64,
        stop_hz: f64,
        points_per_decade: u32,
    },
    Transient { step_s: f64, stop_s: f64 },
}

impl AnalysisRequest {
    pub fn ac(start_hz: f64, stop_hz: f64, points_per_decade: u32) -> Self {
        Self::Ac {
            start_hz,
            stop_hz,
            points_per_decade,
        }
    }

    pub fn transient(step_s: f64, stop_s: f64) -> Self {
        Self::Transient { step_s, stop_s }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Dc => Ok(()),
            Self::Ac {
                start_hz,
                stop_hz,
                points_per_decade,
            } => {
                if !(start_hz.is_finite() && start_hz > 0.0) {
                    return Err(SpiceError::invalid_analysis(
                        "start frequency must be a positive number",
                    ));
                }
                if !(stop_hz.is_finite() && stop_hz > start_hz) {
                    return Err(SpiceError::invalid_analysis(
                        "stop frequency must be greater than start frequency",
                    ));
                }
                if points_per_decade == 0 {
                    return Err(SpiceError::invalid_analysis(
                        "number of points must be at least 1",
                    ));
                }
                Ok(())
            }
            Self::Transient { step_s, stop_s } => {
                if !(stop_s.is_finite() && stop_s > 0.0) {
                    return Err(SpiceError::invalid_analysis("duration must be positive"));
                }
                if !(step_s.is_finite() && step_s > 0.0) {
                    return Err(SpiceError::invalid_analysis("step size must be positive"));
                }
                if step_s > stop_s {
                    return Err(SpiceError::invalid_analysis(
                        "step size must not exceed the duration",
                    ));
                }
                Ok(())
            }
        }
    }

    /// The SPICE control line for this analysis.
    pub fn directive(&self) -> String {
        match *self {
            Self::Dc => ".op".to_string(),
            Self::Ac {
                start_hz,
                stop_hz,
                points_per_decade,
            } => format!(
                ".ac dec {} {} {}",
                points_per_decade,
                format_netlist_value(start_hz),
                format_netlist_value(stop_hz)
            ),
            Self::Transient { step_s, stop_s } => format!(
                ".tran {} {}",
                format_netlist_value(step_s),
                format_netlist_value(stop_s)
            ),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dc => "DC",
            Self::Ac { .. } => "AC",
            Self::Transient { .. } => "Transient",
        }
    }

    /// Estimated number of output points, used for configured limits.
    /// Saturates at `u64::MAX` for absurdly fine sweeps.
    pub fn estimated_points(&self) -> u64 {
        match *self {
            Self::Dc => 1,
            Self::Ac {
                start_hz,
                stop_hz,
                points_per_decade,
            } => {
                let decades = (stop_hz / start_hz).log10().max(0.0);
                ((decades * f64::from(points_per_decade)).round() as u64).saturating_add(1)
            }
            Self::Transient { step_s, stop_s } => {
                ((stop_s / step_s).round() as u64).saturating_add(1)
            }
        }
    }

    /// Analysis parameters as reported in result metadata.
    pub fn parameters(&self) -> Value {
        match *self {
            Self::Dc => json!({}),
            Self::Ac {
                start_hz,
                stop_hz,
                points_per_decade,
            } => json!({
                "start_freq": start_hz,
                "stop_freq": stop_hz,
                "num_points": points_per_decade,
                "sweep": "decade",
            }),
            Self::Transient { step_s, stop_s } => json!({
                "duration": stop_s,
                "step_size": step_s,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives() {
        assert_eq!(AnalysisRequest::Dc.directive(), ".op");
        assert_eq!(
            AnalysisRequest::ac(1.0, 1e6, 100).directive(),
            ".ac dec 100 1.0 1000000.0"
        );
        assert_eq!(
            AnalysisRequest::transient(1e-6, 1e-3).directive(),
            ".tran 1e-6 0.001"
        );
    }

    #[test]
    fn test_validation() {
        assert!(AnalysisRequest::Dc.validate().is_ok());
        assert!(AnalysisRequest::ac(1.0, 1e6, 10).validate().is_ok());
        assert!(AnalysisRequest::ac(0.0, 1e6, 10).validate().is_err());
        assert!(AnalysisRequest::ac(1e6, 1.0, 10).validate().is_err());
        assert!(AnalysisRequest::ac(1.0, 1e6, 0).validate().is_err());
        assert!(AnalysisRequest::transient(1e-6, 1e-3).validate().is_ok());
        assert!(AnalysisRequest::transient(1e-3, 1e-6).validate().is_err());
        assert!(AnalysisRequest::transient(-1.0, 1e-3).validate().is_err());
        assert!(AnalysisRequest::transient(1e-6, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_estimated_points() {
        assert_eq!(AnalysisRequest::Dc.estimated_points(), 1);
        assert_eq!(AnalysisRequest::ac(1.0, 1e6, 10).estimated_points(), 61);
        assert_eq!(AnalysisRequest::transient(1e-6, 1e-3).estimated_points(), 1001);
    }

    #[test]
    fn test_estimated_points_saturate() {
        let tiny_step = AnalysisRequest::transient(1e-300, 1.0);
        assert!(tiny_step.validate().is_ok());
        assert_eq!(tiny_step.estimated_points(), u64::MAX);

        let subnormal_step = AnalysisRequest::transient(f64::from_bits(1), 1.0);
        assert_eq!(subnormal_step.estimated_points(), u64::MAX);

        let wide = AnalysisRequest::ac(1e-300, 1e300, u32::MAX);
        assert!(wide.estimated_points() > 1_000_000_000_000);
    }
}
