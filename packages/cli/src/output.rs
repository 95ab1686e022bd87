// ABOUTME: Rendering of settings for the terminal
// ABOUTME: Table and JSON views of the registry, secrets masked

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use latchkey_settings::Settings;

use crate::error::CliResult;

/// Key/value table of every setting in registry order
pub fn settings_table(settings: &Settings) -> CliResult<Table> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Key", "Value"]);

    for key in Settings::keys() {
        let value = settings.display(key)?;
        let value = if value.is_empty() {
            "—".to_string()
        } else {
            value
        };
        table.add_row(vec![key.to_string(), value]);
    }

    Ok(table)
}

pub fn settings_json(settings: &Settings) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&settings.snapshot())
}
