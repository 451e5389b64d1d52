use anyhow::{anyhow, Context, Result};
use client::{FormSession, ScenarioApi, ScenarioStore, SubmitError};
use common::{FormCommand, FormField, MultiplierTier, Scenario, ScenarioForm, ScenarioId, TagField};
use tracing::{debug, info, trace};

use crate::cli::ScenarioArgs;
use crate::config::Settings;

pub async fn list(settings: &Settings, json: bool) -> Result<String> {
    trace!("Entering list command");
    let store = ScenarioStore::new(settings.api()?);
    store.load().await.context(client::store::LOAD_FAILED)?;

    let scenarios = store.scenarios();
    info!("Fetched {} scenarios", scenarios.len());
    if json {
        return Ok(serde_json::to_string_pretty(&scenarios)?);
    }
    Ok(render_table(&scenarios))
}

pub async fn show(settings: &Settings, id: &str, json: bool) -> Result<String> {
    trace!("Entering show command");
    let store = ScenarioStore::new(settings.api()?);
    let scenario = store
        .fetch(&ScenarioId::new(id))
        .await
        .with_context(|| format!("Failed to fetch scenario {}", id))?;
    if json {
        return Ok(serde_json::to_string_pretty(&scenario)?);
    }
    Ok(render_scenario(&scenario))
}

pub async fn create(settings: &Settings, fields: &ScenarioArgs) -> Result<String> {
    trace!("Entering create command");
    let mut session = FormSession::create();
    for command in form_commands(fields, session.form()) {
        session.apply(command);
    }

    let store = ScenarioStore::new(settings.api()?);
    let saved = submit(&mut session, &store).await?;
    Ok(format!("Created scenario {}\n\n{}", saved.id, render_scenario(&saved)))
}

pub async fn update(settings: &Settings, id: &str, fields: &ScenarioArgs) -> Result<String> {
    trace!("Entering update command");
    if *fields == ScenarioArgs::default() {
        return Err(anyhow!("Nothing to update; pass at least one field"));
    }

    let store = ScenarioStore::new(settings.api()?);
    let mut session = FormSession::open(&store, &ScenarioId::new(id))
        .await
        .with_context(|| format!("Failed to fetch scenario {}", id))?;
    for command in form_commands(fields, session.form()) {
        session.apply(command);
    }

    let saved = submit(&mut session, &store).await?;
    Ok(format!("Updated scenario {}\n\n{}", saved.id, render_scenario(&saved)))
}

pub async fn delete(settings: &Settings, id: &str) -> Result<String> {
    trace!("Entering delete command");
    let store = ScenarioStore::new(settings.api()?);
    store
        .delete(&ScenarioId::new(id))
        .await
        .with_context(|| format!("Failed to delete scenario {}", id))?;
    Ok(format!("Deleted scenario {}", id))
}

async fn submit<A: ScenarioApi>(session: &mut FormSession, store: &ScenarioStore<A>) -> Result<Scenario> {
    match session.submit(store).await {
        Ok(saved) => Ok(saved),
        Err(SubmitError::Invalid(errors)) => {
            let lines: Vec<String> = errors
                .iter()
                .map(|(field, message)| format!("  {}: {}", field.label(), message))
                .collect();
            Err(anyhow!("Invalid scenario:\n{}", lines.join("\n")))
        }
        Err(SubmitError::Remote(e)) => {
            let message = session
                .errors()
                .get(FormField::Name)
                .unwrap_or("Failed to save scenario")
                .to_string();
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

/// Turns the given flags into edits of `current`. A non-empty list flag
/// replaces that whole list, in the order the values were given.
pub fn form_commands(fields: &ScenarioArgs, current: &ScenarioForm) -> Vec<FormCommand> {
    let mut commands = Vec::new();
    if let Some(name) = &fields.name {
        commands.push(FormCommand::SetName(name.clone()));
    }
    if let Some(start) = fields.start {
        commands.push(FormCommand::SetStart(Some(start)));
    }
    if let Some(end) = fields.end {
        commands.push(FormCommand::SetEnd(Some(end)));
    }
    if let Some(multiplier) = fields.multiplier {
        commands.push(FormCommand::SetMultiplier(multiplier));
    }

    let lists = [
        (TagField::ProductCategories, &fields.categories),
        (TagField::Regions, &fields.regions),
        (TagField::CustomerSegments, &fields.segments),
    ];
    for (field, wanted) in lists {
        if wanted.is_empty() {
            continue;
        }
        // Empty the list, then select the values in flag order.
        for existing in current.tags(field) {
            commands.push(FormCommand::Toggle(field, existing.clone()));
        }
        let mut selected: Vec<&String> = Vec::new();
        for value in wanted {
            if !selected.contains(&value) {
                commands.push(FormCommand::Toggle(field, value.clone()));
                selected.push(value);
            }
        }
    }
    debug!("Translated flags into {} form commands", commands.len());
    commands
}

pub fn render_table(scenarios: &[Scenario]) -> String {
    if scenarios.is_empty() {
        return "No scenarios found.".to_string();
    }
    let mut out = format!(
        "{:<26} {:<28} {:<25} {}",
        "ID", "NAME", "DATES", "MULTIPLIER"
    );
    for s in scenarios {
        out.push('\n');
        out.push_str(&format!(
            "{:<26} {:<28} {:<25} {:.1}x ({})",
            s.id.as_str(),
            s.name,
            format!("{} to {}", s.date_range.start, s.date_range.end),
            s.sales_multiplier,
            MultiplierTier::for_multiplier(s.sales_multiplier),
        ));
    }
    out
}

pub fn render_scenario(s: &Scenario) -> String {
    let mut lines = vec![
        format!("Name:       {}", s.name),
        format!("ID:         {}", s.id),
        format!(
            "Dates:      {} to {} ({} days)",
            s.date_range.start,
            s.date_range.end,
            s.date_range.days()
        ),
        format!(
            "Multiplier: {:.1}x ({})",
            s.sales_multiplier,
            MultiplierTier::for_multiplier(s.sales_multiplier)
        ),
        format!("Categories: {}", s.product_categories.join(", ")),
        format!("Regions:    {}", s.regions.join(", ")),
        format!("Segments:   {}", s.customer_segments.join(", ")),
    ];
    if let Some(created) = &s.created_at {
        lines.push(format!("Created:    {}", created));
    }
    if let Some(updated) = &s.updated_at {
        lines.push(format!("Updated:    {}", updated));
    }
    lines.join("\n")
}
