use common::catalog::{
    MAX_MULTIPLIER, MIN_MULTIPLIER, MULTIPLIER_STEP, DEFAULT_MULTIPLIER,
};
use common::TagField;

pub fn render_catalog() -> String {
    let mut lines = Vec::new();
    for field in TagField::ALL {
        lines.push(format!("{}:", field.form_field().label()));
        for option in field.options() {
            lines.push(format!("  - {}", option));
        }
    }
    lines.push(format!(
        "Sales multiplier: {:.1} to {:.1} in steps of {:.1} (default {:.1})",
        MIN_MULTIPLIER, MAX_MULTIPLIER, MULTIPLIER_STEP, DEFAULT_MULTIPLIER
    ));
    lines.push("Tiers: low below 1.0, normal below 1.5, high otherwise".to_string());
    lines.join("\n")
}
