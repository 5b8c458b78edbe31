//! Status Page
//!
//! Renders the HTML overview served on `/` from the bundled template.

use crate::config::TowerConfig;
use crate::store::Diagnostics;

const TEMPLATE: &str = include_str!("../../static/index.html");

/// Render the status page for the current diagnostics
pub fn render(diagnostics: &Diagnostics, config: &TowerConfig) -> String {
    TEMPLATE
        .replace("{{VERSION}}", crate::VERSION)
        .replace("{{MESSAGES_STORED}}", &diagnostics.entry_count.to_string())
        .replace(
            "{{MESSAGES_STORED_SIZE}}",
            &diagnostics.total_size_bytes.to_string(),
        )
        .replace(
            "{{MESSAGES_STORED_SIZE_LIMIT}}",
            &diagnostics.budget_bytes.to_string(),
        )
        .replace(
            "{{MESSAGES_PER_SECOND}}",
            &format!("{:.4}", diagnostics.throughput_estimate),
        )
        .replace(
            "{{MAX_MESSAGE_SIZE_IN_BYTES}}",
            &config.max_message_size_bytes.to_string(),
        )
        .replace(
            "{{MAX_NUMBER_OF_MESSAGES_PER_QUERY}}",
            &config.max_messages_per_query.to_string(),
        )
}
