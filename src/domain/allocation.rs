//! Allocation gate and position sizer.
//!
//! # Decision Bands
//!
//! | meta-score                          | state     | size        |
//! |-------------------------------------|-----------|-------------|
//! | `score <= 0`                        | CASH      | 0           |
//! | `0 < score < threshold_low`         | PERMITTED | 0           |
//! | `threshold_low <= score < high`     | ALLOCATED | `size_low`  |
//! | `score >= threshold_high`           | ALLOCATED | `size_high` |
//!
//! The state depends only on the aggregate score, so no single system can
//! force an allocation on its own.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllocationState {
    Cash,
    Permitted,
    Allocated,
}

impl AllocationState {
    pub fn label(self) -> &'static str {
        match self {
            AllocationState::Cash => "CASH",
            AllocationState::Permitted => "PERMITTED",
            AllocationState::Allocated => "ALLOCATED",
        }
    }

    pub fn is_permitted(self) -> bool {
        !matches!(self, AllocationState::Cash)
    }
}

impl fmt::Display for AllocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizingBands {
    threshold_low: f64,
    threshold_high: f64,
    size_low: f64,
    size_high: f64,
}

impl Default for SizingBands {
    fn default() -> Self {
        SizingBands {
            threshold_low: 3.0,
            threshold_high: 6.0,
            size_low: 0.25,
            size_high: 0.50,
        }
    }
}

impl SizingBands {
    /// Builds validated bands. The error names the offending field.
    pub fn new(
        threshold_low: f64,
        threshold_high: f64,
        size_low: f64,
        size_high: f64,
    ) -> Result<Self, (&'static str, String)> {
        if !threshold_low.is_finite() || threshold_low <= 0.0 {
            return Err(("threshold_low", "threshold_low must be positive".into()));
        }
        if !threshold_high.is_finite() || threshold_high < threshold_low {
            return Err((
                "threshold_high",
                format!("threshold_high ({threshold_high}) must be >= threshold_low ({threshold_low})"),
            ));
        }
        if !size_low.is_finite() || size_low <= 0.0 || size_low > 1.0 {
            return Err(("size_low", "size_low must be in (0, 1]".into()));
        }
        if !size_high.is_finite() || size_high < size_low || size_high > 1.0 {
            return Err(("size_high", "size_high must be in [size_low, 1]".into()));
        }
        Ok(SizingBands {
            threshold_low,
            threshold_high,
            size_low,
            size_high,
        })
    }

    pub fn threshold_low(&self) -> f64 {
        self.threshold_low
    }

    pub fn threshold_high(&self) -> f64 {
        self.threshold_high
    }

    pub fn size_low(&self) -> f64 {
        self.size_low
    }

    pub fn size_high(&self) -> f64 {
        self.size_high
    }

    pub fn decide(&self, score: f64) -> (AllocationState, f64) {
        if score.is_nan() || score <= 0.0 {
            (AllocationState::Cash, 0.0)
        } else if score < self.threshold_low {
            (AllocationState::Permitted, 0.0)
        } else if score < self.threshold_high {
            (AllocationState::Allocated, self.size_low)
        } else {
            (AllocationState::Allocated, self.size_high)
        }
    }

    pub fn position_size(&self, score: f64) -> f64 {
        self.decide(score).1
    }
}
