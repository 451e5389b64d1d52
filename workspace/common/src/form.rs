//! In-progress form state for a scenario and its validation.
//!
//! The form is driven by [`FormCommand`] messages instead of being poked
//! through handles by other components. [`ScenarioForm::validate`] is the only
//! way to turn it into a [`ScenarioDraft`] that may be sent to the remote
//! collection.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use tracing::debug;
use validator::{Validate, ValidationErrors};

use crate::catalog::{self, DEFAULT_MULTIPLIER};
use crate::scenario::{DateRange, Scenario, ScenarioDraft};

const DATES_REQUIRED: &str = "Start and end dates are required";

/// A field of the scenario form that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    DateRange,
    ProductCategories,
    SalesMultiplier,
    Regions,
    CustomerSegments,
}

impl FormField {
    /// Maps a validator key to a field. Both the Rust and the wire spelling
    /// are accepted; struct-level rules report under `__all__`.
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Self::Name),
            "date_range" | "dateRange" | "__all__" => Some(Self::DateRange),
            "product_categories" | "productCategories" => Some(Self::ProductCategories),
            "sales_multiplier" | "salesMultiplier" => Some(Self::SalesMultiplier),
            "regions" => Some(Self::Regions),
            "customer_segments" | "customerSegments" => Some(Self::CustomerSegments),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DateRange => "date range",
            Self::ProductCategories => "product categories",
            Self::SalesMultiplier => "sales multiplier",
            Self::Regions => "regions",
            Self::CustomerSegments => "customer segments",
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            Self::Name => "Name must be at least 3 characters long",
            Self::DateRange => DATES_REQUIRED,
            Self::ProductCategories => "Select at least one product category",
            Self::SalesMultiplier => "Sales multiplier must be between 0.5 and 3.0",
            Self::Regions => "Select at least one region",
            Self::CustomerSegments => "Select at least one customer segment",
        }
    }
}

/// Field-level validation messages, one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    messages: BTreeMap<FormField, String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message for a field, replacing any earlier one.
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.messages.insert(field, message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.messages.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.messages.contains_key(&field)
    }

    pub fn remove(&mut self, field: FormField) -> Option<String> {
        self.messages.remove(&field)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.messages.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.label(), message)?;
            first = false;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (key, list) in errors.field_errors() {
            let Some(field) = FormField::from_key(&key) else {
                continue;
            };
            if form_errors.contains(field) {
                continue;
            }
            let message = list
                .iter()
                .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| field.default_message().to_string());
            form_errors.insert(field, message);
        }
        form_errors
    }
}

/// One of the three tag lists of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagField {
    ProductCategories,
    Regions,
    CustomerSegments,
}

impl TagField {
    pub const ALL: [TagField; 3] = [
        TagField::ProductCategories,
        TagField::Regions,
        TagField::CustomerSegments,
    ];

    /// Choices the form offers for this list.
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::ProductCategories => catalog::PRODUCT_CATEGORIES,
            Self::Regions => catalog::REGIONS,
            Self::CustomerSegments => catalog::CUSTOMER_SEGMENTS,
        }
    }

    pub fn form_field(&self) -> FormField {
        match self {
            Self::ProductCategories => FormField::ProductCategories,
            Self::Regions => FormField::Regions,
            Self::CustomerSegments => FormField::CustomerSegments,
        }
    }
}

/// Messages accepted by [`ScenarioForm::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    SetName(String),
    SetStart(Option<NaiveDate>),
    SetEnd(Option<NaiveDate>),
    SetMultiplier(f64),
    /// Adds the value to the list, or removes it if already selected.
    Toggle(TagField, String),
    /// Replaces the whole form with an existing scenario's values.
    Load(ScenarioDraft),
    Reset,
}

/// Editable state of the scenario form.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioForm {
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub sales_multiplier: f64,
    pub product_categories: Vec<String>,
    pub regions: Vec<String>,
    pub customer_segments: Vec<String>,
}

impl Default for ScenarioForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            start: None,
            end: None,
            sales_multiplier: DEFAULT_MULTIPLIER,
            product_categories: Vec::new(),
            regions: Vec::new(),
            customer_segments: Vec::new(),
        }
    }
}

impl From<&ScenarioDraft> for ScenarioForm {
    fn from(draft: &ScenarioDraft) -> Self {
        Self {
            name: draft.name.clone(),
            start: Some(draft.date_range.start),
            end: Some(draft.date_range.end),
            sales_multiplier: draft.sales_multiplier,
            product_categories: draft.product_categories.clone(),
            regions: draft.regions.clone(),
            customer_segments: draft.customer_segments.clone(),
        }
    }
}

impl From<&Scenario> for ScenarioForm {
    fn from(scenario: &Scenario) -> Self {
        Self::from(&scenario.to_draft())
    }
}

impl ScenarioForm {
    pub fn apply(&mut self, command: FormCommand) {
        match command {
            FormCommand::SetName(name) => self.name = name,
            FormCommand::SetStart(start) => self.start = start,
            FormCommand::SetEnd(end) => self.end = end,
            FormCommand::SetMultiplier(multiplier) => self.sales_multiplier = multiplier,
            FormCommand::Toggle(field, value) => self.toggle(field, value),
            FormCommand::Load(draft) => *self = Self::from(&draft),
            FormCommand::Reset => *self = Self::default(),
        }
    }

    pub fn toggle(&mut self, field: TagField, value: String) {
        let list = self.tags_mut(field);
        match list.iter().position(|v| *v == value) {
            Some(index) => {
                list.remove(index);
            }
            None => list.push(value),
        }
    }

    pub fn tags(&self, field: TagField) -> &[String] {
        match field {
            TagField::ProductCategories => &self.product_categories,
            TagField::Regions => &self.regions,
            TagField::CustomerSegments => &self.customer_segments,
        }
    }

    fn tags_mut(&mut self, field: TagField) -> &mut Vec<String> {
        match field {
            TagField::ProductCategories => &mut self.product_categories,
            TagField::Regions => &mut self.regions,
            TagField::CustomerSegments => &mut self.customer_segments,
        }
    }

    /// Checks every field and produces the submission payload.
    ///
    /// All violations are reported at once. The name is trimmed in the
    /// returned draft.
    pub fn validate(&self) -> Result<ScenarioDraft, FormErrors> {
        let draft = ScenarioDraft {
            name: self.name.trim().to_string(),
            // Missing dates are reported below; the stand-in keeps the other
            // rules running.
            date_range: DateRange::new(
                self.start.unwrap_or(NaiveDate::MIN),
                self.end.unwrap_or(NaiveDate::MIN),
            ),
            product_categories: self.product_categories.clone(),
            sales_multiplier: self.sales_multiplier,
            regions: self.regions.clone(),
            customer_segments: self.customer_segments.clone(),
        };

        let mut errors = match draft.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };
        if self.start.is_none() || self.end.is_none() {
            errors.insert(FormField::DateRange, DATES_REQUIRED);
        }

        if errors.is_empty() {
            Ok(draft)
        } else {
            debug!("Scenario form rejected: {}", errors);
            Err(errors)
        }
    }
}
