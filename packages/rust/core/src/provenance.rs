//! Curation provenance recorded in `described.tools`.

use compdef_shared::{Curation, Definition};

/// Tool marker for an applied curation: `curation/<origin>` or bare `curation`.
pub fn curation_tool(curation: &Curation) -> String {
    match curation.origin.as_deref() {
        Some(origin) => format!("curation/{origin}"),
        None => "curation".to_string(),
    }
}

/// Append the curation marker when a non-empty curation was applied.
/// Returns `true` if `tools` changed.
pub fn record_curation(definition: &mut Definition, curation: Option<&Curation>) -> bool {
    let Some(curation) = curation else {
        return false;
    };
    if curation.origin.is_none() && curation.body.is_empty() {
        return false;
    }

    definition
        .described_mut()
        .tools
        .push(curation_tool(curation));
    true
}
