use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::catalog::{MAX_MULTIPLIER, MIN_MULTIPLIER};
use crate::converters::wire_date;

/// Prefix reserved for identifiers of records whose create is still in flight.
pub const PLACEHOLDER_PREFIX: &str = "temp-id";

/// Minimum number of characters in a trimmed scenario name.
pub const MIN_NAME_LENGTH: usize = 3;

/// Opaque identifier assigned by the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(String);

impl ScenarioId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for the `seq`-th locally synthesized placeholder.
    pub fn placeholder(seq: u64) -> Self {
        Self(format!("{}-{}", PLACEHOLDER_PREFIX, seq))
    }

    /// Whether this identifier lies in the reserved placeholder namespace.
    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_PREFIX
            || self
                .0
                .strip_prefix(PLACEHOLDER_PREFIX)
                .is_some_and(|rest| rest.starts_with('-'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScenarioId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ScenarioId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Inclusive calendar date range of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "wire_date")]
    pub start: NaiveDate,
    #[serde(with = "wire_date")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `start <= end`
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Number of calendar days covered, counting both ends. Zero when the
    /// range is inverted.
    pub fn days(&self) -> u64 {
        let span = (self.end - self.start).num_days() + 1;
        u64::try_from(span).unwrap_or(0)
    }
}

/// Submission payload for creating or updating a scenario.
///
/// Field rules mirror the remote collection's schema so an invalid draft is
/// caught before any request is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_date_order", skip_on_field_errors = false))]
pub struct ScenarioDraft {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    pub date_range: DateRange,
    #[validate(length(min = 1, message = "Select at least one product category"))]
    pub product_categories: Vec<String>,
    #[validate(custom(function = "validate_multiplier"))]
    pub sales_multiplier: f64,
    #[validate(length(min = 1, message = "Select at least one region"))]
    pub regions: Vec<String>,
    #[validate(length(min = 1, message = "Select at least one customer segment"))]
    pub customer_segments: Vec<String>,
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() >= MIN_NAME_LENGTH {
        return Ok(());
    }
    let mut error = ValidationError::new("name_length");
    error.message = Some(Cow::Borrowed("Name must be at least 3 characters long"));
    Err(error)
}

fn validate_multiplier(multiplier: f64) -> Result<(), ValidationError> {
    // NaN fails both comparisons, so test for membership rather than exclusion.
    if (MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(&multiplier) {
        return Ok(());
    }
    let mut error = ValidationError::new("multiplier_range");
    error.message = Some(Cow::Borrowed("Sales multiplier must be between 0.5 and 3.0"));
    Err(error)
}

fn validate_date_order(draft: &ScenarioDraft) -> Result<(), ValidationError> {
    if draft.date_range.is_ordered() {
        return Ok(());
    }
    let mut error = ValidationError::new("date_order");
    error.message = Some(Cow::Borrowed("Start date must not be after end date"));
    Err(error)
}

/// A scenario as stored by the remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(rename = "_id", alias = "id")]
    pub id: ScenarioId,
    pub name: String,
    pub date_range: DateRange,
    pub product_categories: Vec<String>,
    pub sales_multiplier: f64,
    pub regions: Vec<String>,
    pub customer_segments: Vec<String>,
    /// Server-assigned, not interpreted by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Scenario {
    /// Builds a record from a draft, with no server timestamps.
    pub fn from_draft(id: ScenarioId, draft: &ScenarioDraft) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            date_range: draft.date_range,
            product_categories: draft.product_categories.clone(),
            sales_multiplier: draft.sales_multiplier,
            regions: draft.regions.clone(),
            customer_segments: draft.customer_segments.clone(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Overwrites the editable fields with the draft, keeping id and timestamps.
    pub fn apply_draft(&mut self, draft: &ScenarioDraft) {
        self.name = draft.name.clone();
        self.date_range = draft.date_range;
        self.product_categories = draft.product_categories.clone();
        self.sales_multiplier = draft.sales_multiplier;
        self.regions = draft.regions.clone();
        self.customer_segments = draft.customer_segments.clone();
    }

    pub fn to_draft(&self) -> ScenarioDraft {
        ScenarioDraft {
            name: self.name.clone(),
            date_range: self.date_range,
            product_categories: self.product_categories.clone(),
            sales_multiplier: self.sales_multiplier,
            regions: self.regions.clone(),
            customer_segments: self.customer_segments.clone(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_placeholder()
    }
}
