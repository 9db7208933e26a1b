//! Compliance classification of a single shutter reading.
//!
//! A reading is a pair of flows: the reference flow the shutter was designed
//! for, and the flow measured on site. The percentage deviation between them
//! falls into one of three bands:
//!
//! | `|deviation|`      | status        |
//! |--------------------|---------------|
//! | `<= 10 %`          | compliant     |
//! | `> 10 %, <= 20 %`  | acceptable    |
//! | `> 20 %`           | non-compliant |

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the compliant band, in percent.
pub const COMPLIANT_LIMIT: f64 = 10.0;

/// Upper bound (inclusive) of the acceptable band, in percent.
pub const ACCEPTABLE_LIMIT: f64 = 20.0;

/// Slack applied at the band limits so that a reading sitting exactly on a
/// limit (e.g. `r * 1.10`) is not pushed over it by floating-point rounding.
const LIMIT_TOLERANCE: f64 = 1e-9;

/// The compliance band a reading falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    /// Deviation within 10 %.
    Compliant,
    /// Deviation above 10 % and within 20 %.
    Acceptable,
    /// Deviation above 20 %, or undefined.
    NonCompliant,
}

impl ComplianceStatus {
    /// Classify an absolute deviation, in percent.
    ///
    /// Both limits are inclusive: exactly 10 % is compliant and exactly 20 %
    /// is acceptable.
    #[must_use]
    pub const fn from_absolute_deviation(abs_deviation: f64) -> Self {
        if abs_deviation <= COMPLIANT_LIMIT + LIMIT_TOLERANCE {
            Self::Compliant
        } else if abs_deviation <= ACCEPTABLE_LIMIT + LIMIT_TOLERANCE {
            Self::Acceptable
        } else {
            Self::NonCompliant
        }
    }

    /// The display colour token for this status.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Compliant => "#10B981",
            Self::Acceptable => "#F59E0B",
            Self::NonCompliant => "#EF4444",
        }
    }

    /// The human-readable label for this status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Compliant => "Conforme",
            Self::Acceptable => "Acceptable",
            Self::NonCompliant => "Non conforme",
        }
    }

    /// The serialised identifier of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::Acceptable => "acceptable",
            Self::NonCompliant => "non-compliant",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown compliance status '{0}'")]
pub struct UnknownStatus(String);

impl FromStr for ComplianceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compliant" => Ok(Self::Compliant),
            "acceptable" => Ok(Self::Acceptable),
            "non-compliant" => Ok(Self::NonCompliant),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// The outcome of evaluating a reading.
///
/// Computed fresh on every call; never stored on the shutter itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceResult {
    /// Signed percentage deviation of the measured flow from the reference.
    ///
    /// Positive when the measured flow exceeds the reference. `None` when
    /// the deviation is undefined (zero or non-finite reference, or a
    /// non-finite measured flow).
    pub deviation: Option<f64>,
    /// The compliance band.
    pub status: ComplianceStatus,
    /// Display colour token.
    pub color: &'static str,
    /// Human-readable label.
    pub label: &'static str,
}

impl ComplianceResult {
    const fn new(deviation: Option<f64>, status: ComplianceStatus) -> Self {
        Self {
            deviation,
            status,
            color: status.color(),
            label: status.label(),
        }
    }

    /// The absolute deviation used for classification and display.
    #[must_use]
    pub fn absolute_deviation(&self) -> Option<f64> {
        self.deviation.map(f64::abs)
    }
}

/// Evaluate a reading.
///
/// This never fails. Readings whose deviation cannot be computed are
/// classified as non-compliant with an undefined deviation.
#[must_use]
pub fn evaluate(reference_flow: f64, measured_flow: f64) -> ComplianceResult {
    let Some(deviation) = deviation(reference_flow, measured_flow) else {
        return ComplianceResult::new(None, ComplianceStatus::NonCompliant);
    };
    let status = ComplianceStatus::from_absolute_deviation(deviation.abs());
    ComplianceResult::new(Some(deviation), status)
}

/// Signed percentage deviation, or `None` if it is undefined.
fn deviation(reference_flow: f64, measured_flow: f64) -> Option<f64> {
    if !reference_flow.is_finite() || !measured_flow.is_finite() || reference_flow == 0.0 {
        return None;
    }
    let deviation = (measured_flow - reference_flow) * 100.0 / reference_flow;
    deviation.is_finite().then_some(deviation)
}

/// A validated pair of flows, as accepted from user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowReading {
    reference_flow: f64,
    measured_flow: f64,
}

/// Errors raised when validating a reading at an input boundary.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvalidFlow {
    /// A flow is NaN or infinite.
    #[error("flow values must be finite numbers")]
    NotFinite,
    /// A flow is negative.
    #[error("flow values cannot be negative (got {0})")]
    Negative(f64),
    /// The reference flow is zero, so no deviation can be computed.
    #[error("the reference flow must be greater than zero")]
    ZeroReference,
}

impl FlowReading {
    /// Validate a reading.
    ///
    /// # Errors
    ///
    /// Returns an error if either flow is non-finite or negative, or if the
    /// reference flow is zero.
    pub fn new(reference_flow: f64, measured_flow: f64) -> Result<Self, InvalidFlow> {
        if !reference_flow.is_finite() || !measured_flow.is_finite() {
            return Err(InvalidFlow::NotFinite);
        }
        for flow in [reference_flow, measured_flow] {
            if flow < 0.0 {
                return Err(InvalidFlow::Negative(flow));
            }
        }
        if reference_flow == 0.0 {
            return Err(InvalidFlow::ZeroReference);
        }
        Ok(Self {
            reference_flow,
            measured_flow,
        })
    }

    /// The reference flow.
    #[must_use]
    pub const fn reference_flow(&self) -> f64 {
        self.reference_flow
    }

    /// The measured flow.
    #[must_use]
    pub const fn measured_flow(&self) -> f64 {
        self.measured_flow
    }

    /// Evaluate this reading.
    #[must_use]
    pub fn evaluate(&self) -> ComplianceResult {
        evaluate(self.reference_flow, self.measured_flow)
    }
}
