use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use common::catalog::{DEFAULT_MULTIPLIER, MAX_MULTIPLIER, MIN_MULTIPLIER};
use common::converters::parse_wire_date;

pub mod commands;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(name = "salesdemo")]
#[command(about = "Manage retail demo scenarios and preview their projected sales")]
#[command(version)]
pub struct Cli {
    /// Root URL of the scenario API
    ///
    /// Example: http://localhost:5001/api
    #[arg(long, global = true, env = "SALESDEMO_API_BASE_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all scenarios
    List {
        /// Print the raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one scenario
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },
    /// Create a scenario
    Create(ScenarioArgs),
    /// Update a scenario
    ///
    /// Only the given fields change. Passing any value for a list replaces
    /// that whole list.
    Update {
        id: String,

        #[command(flatten)]
        fields: ScenarioArgs,
    },
    /// Delete a scenario
    Delete { id: String },
    /// Preview projected daily sales without saving anything
    ///
    /// Without dates the preview starts today and covers at most 30 days.
    Preview {
        /// First day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_wire_date)]
        start: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_wire_date)]
        end: Option<NaiveDate>,

        /// Sales multiplier between 0.5 and 3.0
        #[arg(short, long, default_value_t = DEFAULT_MULTIPLIER, value_parser = parse_multiplier)]
        multiplier: f64,

        /// Seed for a repeatable series
        #[arg(long)]
        seed: Option<u64>,

        /// Preview an existing scenario instead of the flags above
        #[arg(long, conflicts_with_all = ["start", "end", "multiplier"])]
        scenario: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Show the options a scenario can choose from
    Catalog,
}

/// Scenario fields accepted by `create` and `update`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ScenarioArgs {
    #[arg(short, long)]
    pub name: Option<String>,

    /// First day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_wire_date)]
    pub start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_wire_date)]
    pub end: Option<NaiveDate>,

    /// Sales multiplier between 0.5 and 3.0
    #[arg(short, long)]
    pub multiplier: Option<f64>,

    /// Product category; repeat for several
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Region; repeat for several
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Customer segment; repeat for several
    #[arg(long = "segment")]
    pub segments: Vec<String>,
}

/// Parses a sales multiplier, rejecting values outside the slider bounds.
pub fn parse_multiplier(value: &str) -> std::result::Result<f64, String> {
    let multiplier: f64 = value
        .parse()
        .map_err(|e| format!("'{}' is not a number: {}", value, e))?;
    if !(MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(&multiplier) {
        return Err(format!(
            "multiplier must be between {:.1} and {:.1}",
            MIN_MULTIPLIER, MAX_MULTIPLIER
        ));
    }
    Ok(multiplier)
}

impl Cli {
    pub async fn run(self, mut settings: Settings) -> Result<()> {
        if let Some(url) = self.api_url {
            settings.api_base_url = url;
        }
        let output = match self.command {
            Commands::List { json } => commands::list(&settings, json).await?,
            Commands::Show { id, json } => commands::show(&settings, &id, json).await?,
            Commands::Create(fields) => commands::create(&settings, &fields).await?,
            Commands::Update { id, fields } => commands::update(&settings, &id, &fields).await?,
            Commands::Delete { id } => commands::delete(&settings, &id).await?,
            Commands::Preview {
                start,
                end,
                multiplier,
                seed,
                scenario,
                json,
            } => {
                let request = commands::PreviewRequest {
                    start,
                    end,
                    multiplier,
                    seed,
                    scenario,
                    json,
                };
                commands::preview(&settings, request).await?
            }
            Commands::Catalog => commands::render_catalog(),
        };
        println!("{}", output);
        Ok(())
    }
}
