//! Prompt construction for the reasoning service

use crate::types::{Action, RiskBundle, Urgency};

const PREAMBLE: &str = "You are a sleep architect agent. Analyze the user's current \
sleep-disruption risks and recommend exactly ONE intervention.";

const DATA_NOTES: &str = "\
DATA CONTEXT:
- remaining_caffeine_mg above 300 is high risk.
- sleep_debt_hours above 2 is critical.
- melatonin_suppression_risk, noise_disruption_risk, sleep_debt_risk and time_pressure_risk are scaled 0-1.
- time_to_target_sleep is hours until the next alarm.
- context.recent_actions lists interventions already issued; avoid repeating them without cause.";

/// Build the full prompt for one bundle
pub fn build_prompt(bundle: &RiskBundle) -> Result<String, serde_json::Error> {
    let risks = serde_json::to_string_pretty(bundle)?;
    Ok(format!(
        "{PREAMBLE}\n\n{DATA_NOTES}\n\nUSER RISKS:\n{risks}\n\n{}",
        schema_block()
    ))
}

/// The fixed response schema, enumerating every allowed action and urgency
pub fn schema_block() -> String {
    let actions = Action::ALL
        .iter()
        .map(Action::as_str)
        .collect::<Vec<_>>()
        .join(" | ");
    let urgencies = Urgency::ALL
        .iter()
        .map(Urgency::as_str)
        .collect::<Vec<_>>()
        .join(" | ");

    format!(
        "Return ONLY valid JSON, no prose, matching this schema:\n\
{{\n  \"action\": \"{actions}\",\n  \"urgency\": \"{urgencies}\",\n  \"value\": \"string, number, boolean or null\",\n  \"notification_message\": \"non-empty string shown to the user\",\n  \"confidence\": \"number between 0 and 1\",\n  \"reasoning_summary\": \"string\"\n}}"
    )
}
