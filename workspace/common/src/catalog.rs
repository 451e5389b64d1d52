//! Choices offered by the scenario form and the bounds of the sales multiplier.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const PRODUCT_CATEGORIES: &[&str] = &[
    "Electronics",
    "Home & Garden",
    "Tools",
    "Appliances",
    "Lighting",
    "Paint",
];

pub const REGIONS: &[&str] = &["Northeast", "Southeast", "Midwest", "Southwest", "West"];

pub const CUSTOMER_SEGMENTS: &[&str] = &["New", "Returning", "VIP"];

pub const MIN_MULTIPLIER: f64 = 0.5;
pub const MAX_MULTIPLIER: f64 = 3.0;
pub const MULTIPLIER_STEP: f64 = 0.1;
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

/// Display band of a sales multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiplierTier {
    Low,
    Normal,
    High,
}

impl MultiplierTier {
    pub fn for_multiplier(multiplier: f64) -> Self {
        if multiplier < 1.0 {
            Self::Low
        } else if multiplier < 1.5 {
            Self::Normal
        } else {
            Self::High
        }
    }
}

impl fmt::Display for MultiplierTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        f.write_str(label)
    }
}
