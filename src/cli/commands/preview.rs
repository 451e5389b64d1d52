use anyhow::{Context, Result};
use chrono::NaiveDate;
use client::ScenarioStore;
use common::{MultiplierTier, PreviewInput, PreviewSeries, ScenarioId};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, trace};

use crate::config::Settings;

const BAR_WIDTH: u64 = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub multiplier: f64,
    pub seed: Option<u64>,
    /// Take dates and multiplier from this saved scenario
    pub scenario: Option<String>,
    pub json: bool,
}

pub async fn preview(settings: &Settings, request: PreviewRequest) -> Result<String> {
    trace!("Entering preview command");
    let input = match &request.scenario {
        Some(id) => {
            let store = ScenarioStore::new(settings.api()?);
            let scenario = store
                .fetch(&ScenarioId::new(id.as_str()))
                .await
                .with_context(|| format!("Failed to fetch scenario {}", id))?;
            PreviewInput::from(&scenario.to_draft())
        }
        None => PreviewInput {
            start: request.start,
            end: request.end,
            sales_multiplier: request.multiplier,
        },
    };

    let series = generate(&input, request.seed, None);
    debug!("Generated preview with {} points", series.len());
    if request.json {
        return Ok(serde_json::to_string_pretty(&series)?);
    }
    Ok(render_preview(&series, input.sales_multiplier))
}

/// Runs the default generator, seeded when `seed` is given.
pub fn generate(input: &PreviewInput, seed: Option<u64>, today: Option<NaiveDate>) -> PreviewSeries {
    let generator = compute::default_generator(today);
    match seed {
        Some(seed) => generator.generate(input, &mut StdRng::seed_from_u64(seed)),
        None => generator.generate_random(input),
    }
}

pub fn render_preview(series: &PreviewSeries, multiplier: f64) -> String {
    let peak = series.peak().map(|p| p.sales).unwrap_or(0).max(1);
    let mut lines: Vec<String> = series
        .iter()
        .map(|point| {
            let width = u128::from(point.sales) * u128::from(BAR_WIDTH) / u128::from(peak);
            format!("{}  {:>5}  {}", point.date, point.sales, "#".repeat(width as usize))
        })
        .collect();

    lines.push(String::new());
    lines.push(format!(
        "{} days, multiplier {:.1}x ({}), total {}",
        series.len(),
        multiplier,
        MultiplierTier::for_multiplier(multiplier),
        series.total_sales()
    ));
    if let Some(top) = series.peak() {
        lines.push(format!("Peak {} on {}", top.sales, top.date));
    }
    lines.join("\n")
}
