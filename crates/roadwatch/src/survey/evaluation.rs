use serde::{Deserialize, Serialize};

use crate::survey::domain::{DistressType, LaneMeasurement, Severity};

/// Raw-unit thresholds per distress type.
///
/// Held as an explicit value handed to the evaluator at construction so
/// contract-specific profiles can coexist; the defaults are the MoRTH
/// maintenance limits the original deployment ran with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// mm/km
    pub roughness: f64,
    /// mm
    pub rut_depth: f64,
    /// percent of surveyed area
    pub crack_area: f64,
    /// percent of surveyed area
    pub ravelling: f64,
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self {
            roughness: 2400.0,
            rut_depth: 5.0,
            crack_area: 5.0,
            ravelling: 1.0,
        }
    }
}

impl ThresholdProfile {
    pub fn threshold(&self, distress: DistressType) -> f64 {
        match distress {
            DistressType::Roughness => self.roughness,
            DistressType::RutDepth => self.rut_depth,
            DistressType::CrackArea => self.crack_area,
            DistressType::Ravelling => self.ravelling,
        }
    }
}

/// Alert payload for a single threshold violation, identity-free until
/// the repository persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub distress: DistressType,
    pub severity: Severity,
    pub threshold_value: f64,
    pub actual_value: f64,
    pub message: String,
}

/// Stateless classifier for distress readings against a threshold profile.
pub struct DistressEvaluator {
    thresholds: ThresholdProfile,
}

impl DistressEvaluator {
    pub fn new(thresholds: ThresholdProfile) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdProfile {
        &self.thresholds
    }

    /// Severity band for a reading, by ratio against the type threshold.
    pub fn classify(&self, distress: DistressType, value: f64) -> Severity {
        let ratio = value / self.thresholds.threshold(distress);
        if ratio >= 1.2 {
            Severity::Critical
        } else if ratio >= 1.0 {
            Severity::Poor
        } else if ratio >= 0.8 {
            Severity::Fair
        } else if ratio >= 0.6 {
            Severity::Good
        } else {
            Severity::Excellent
        }
    }

    /// Label-keyed variant for callers holding vendor strings. Unknown
    /// labels classify as `good` rather than failing.
    pub fn classify_label(&self, label: &str, value: f64) -> Severity {
        match DistressType::from_label(label) {
            Some(distress) => self.classify(distress, value),
            None => Severity::Good,
        }
    }

    /// Alert emission for one reading.
    ///
    /// Emission requires the raw value to strictly exceed the threshold.
    /// That is one notch tighter than the `poor` classification band, so a
    /// reading exactly at threshold classifies `poor` yet raises nothing.
    /// Upstream product behavior; do not "fix" without a contract change.
    pub fn check(&self, distress: DistressType, value: f64) -> Option<AlertCandidate> {
        let threshold = self.thresholds.threshold(distress);
        if value <= threshold {
            return None;
        }

        Some(AlertCandidate {
            distress,
            severity: self.classify(distress, value),
            threshold_value: threshold,
            actual_value: value,
            message: format!(
                "{} threshold exceeded: {} > {}",
                distress.label(),
                value,
                threshold
            ),
        })
    }

    /// All alerts for one lane measurement, in fixed distress-type order.
    /// Absent readings are "not measured" and never alert.
    pub fn alerts_for(&self, measurement: &LaneMeasurement) -> Vec<AlertCandidate> {
        DistressType::ALL
            .into_iter()
            .filter_map(|distress| {
                measurement
                    .value(distress)
                    .and_then(|value| self.check(distress, value))
            })
            .collect()
    }
}

/// Worst-of aggregation across lane severities, `excellent` when nothing
/// alerted.
pub fn worst_severity<I>(severities: I) -> Severity
where
    I: IntoIterator<Item = Severity>,
{
    severities
        .into_iter()
        .max()
        .unwrap_or(Severity::Excellent)
}
