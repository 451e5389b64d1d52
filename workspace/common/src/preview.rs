use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::converters::wire_date;
use crate::form::ScenarioForm;
use crate::scenario::ScenarioDraft;

/// Values the preview generator reads from a draft. Dates may be missing
/// while the form is still being filled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewInput {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub sales_multiplier: f64,
}

impl From<&ScenarioDraft> for PreviewInput {
    fn from(draft: &ScenarioDraft) -> Self {
        Self {
            start: Some(draft.date_range.start),
            end: Some(draft.date_range.end),
            sales_multiplier: draft.sales_multiplier,
        }
    }
}

impl From<&ScenarioForm> for PreviewInput {
    fn from(form: &ScenarioForm) -> Self {
        Self {
            start: form.start,
            end: form.end,
            sales_multiplier: form.sales_multiplier,
        }
    }
}

/// One day of synthetic sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewPoint {
    #[serde(with = "wire_date")]
    pub date: NaiveDate,
    pub sales: u64,
}

impl PreviewPoint {
    pub fn new(date: NaiveDate, sales: u64) -> Self {
        Self { date, sales }
    }
}

/// Read-only series of preview points, one per consecutive day.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewSeries {
    points: Vec<PreviewPoint>,
}

impl PreviewSeries {
    pub fn new(points: Vec<PreviewPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PreviewPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreviewPoint> {
        self.points.iter()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Sum of all points, saturating at `u64::MAX`.
    pub fn total_sales(&self) -> u64 {
        self.points.iter().fold(0u64, |total, p| total.saturating_add(p.sales))
    }

    pub fn peak(&self) -> Option<&PreviewPoint> {
        self.points.iter().max_by_key(|p| p.sales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_series_accessors() {
        let series = PreviewSeries::new(vec![
            PreviewPoint::new(date(1), 1200),
            PreviewPoint::new(date(2), 1450),
            PreviewPoint::new(date(3), 1010),
        ]);

        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), Some(date(1)));
        assert_eq!(series.last_date(), Some(date(3)));
        assert_eq!(series.total_sales(), 3660);
        assert_eq!(series.peak().map(|p| p.date), Some(date(2)));
    }

    #[test]
    fn test_total_sales_saturates() {
        let series = PreviewSeries::new(vec![
            PreviewPoint::new(date(1), u64::MAX),
            PreviewPoint::new(date(2), 10),
        ]);
        assert_eq!(series.total_sales(), u64::MAX);
    }

    #[test]
    fn test_series_serializes_as_chart_rows() {
        let series = PreviewSeries::new(vec![PreviewPoint::new(date(5), 2500)]);
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, r#"[{"date":"2024-01-05","sales":2500}]"#);
    }

    #[test]
    fn test_input_from_form_keeps_missing_dates() {
        let form = ScenarioForm::default();
        let input = PreviewInput::from(&form);
        assert_eq!(input.start, None);
        assert_eq!(input.end, None);
        assert_eq!(input.sales_multiplier, 1.0);
    }
}
