//! Few-shot prompt for mapping a question onto Quick Stats parameters.

use crate::params::allowed_key_names;
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::{json, Value};

/// A question paired with the parameters it should produce.
#[derive(Debug, Clone, Serialize)]
pub struct FewShotExample {
    #[serde(rename = "q")]
    pub question: &'static str,
    pub params: Value,
}

lazy_static! {
    pub static ref FEW_SHOT_EXAMPLES: Vec<FewShotExample> = vec![
        FewShotExample {
            question: "Corn yield in Iowa for 2023",
            params: json!({
                "commodity_desc": "CORN",
                "statisticcat_desc": "YIELD",
                "unit_desc": "BU / ACRE",
                "agg_level_desc": "STATE",
                "state_alpha": "IA",
                "year": "2023",
                "sector_desc": "CROPS"
            }),
        },
        FewShotExample {
            question: "Monthly US wheat prices received 2019",
            params: json!({
                "commodity_desc": "WHEAT",
                "statisticcat_desc": "PRICE RECEIVED",
                "freq_desc": "MONTHLY",
                "agg_level_desc": "NATIONAL",
                "year": "2019",
                "sector_desc": "CROPS"
            }),
        },
        FewShotExample {
            question: "Soybean production by state in 2021 and 2022",
            params: json!({
                "commodity_desc": "SOYBEANS",
                "statisticcat_desc": "PRODUCTION",
                "agg_level_desc": "STATE",
                "year": ["2021", "2022"],
                "sector_desc": "CROPS"
            }),
        },
        FewShotExample {
            question: "Corn yield in IA, IL and NE for 2020 to 2022",
            params: json!({
                "commodity_desc": "CORN",
                "statisticcat_desc": "YIELD",
                "unit_desc": "BU / ACRE",
                "agg_level_desc": "STATE",
                "state_alpha": ["IA", "IL", "NE"],
                "year": ["2020", "2021", "2022"],
                "sector_desc": "CROPS"
            }),
        },
    ];

    /// System instruction sent with every parameter request. Built once.
    pub static ref SYSTEM_PROMPT: String = build_system_prompt();
}

fn build_system_prompt() -> String {
    let keys = allowed_key_names()
        .iter()
        .map(|k| format!("\"{}\"", k))
        .collect::<Vec<_>>()
        .join(", ");
    let examples = serde_json::to_string_pretty(&*FEW_SHOT_EXAMPLES).unwrap_or_default();

    format!(
        r#"You convert a user's question into USDA Quick Stats API parameters.
Return ONLY a single JSON object using keys from this list: [{keys}].
- Fields may be scalars or arrays. If the user clearly requests multiple items (e.g., multiple years or states), return a JSON array for that field (e.g., "year": ["2021","2022"]).
- Allowed multi-value fields include: year, state_alpha, state_name, county_ansi, county_name, class_desc, freq_desc (if truly multi), and short_desc.
Rules:
- Use UPPERCASE for commodity_desc and statisticcat_desc (e.g., CORN, WHEAT, YIELD).
- Prefer agg_level_desc STATE unless the user clearly asks for NATIONAL or COUNTY.
- If the United States as a whole is requested, set agg_level_desc to NATIONAL and omit state.
- If a state is mentioned, set state_alpha to its two-letter code when possible.
- Accept a single year if mentioned; if a range or multiple years are mentioned, return an array of years in ascending order.
- Only include unit_desc when obvious (e.g., YIELD for grains => BU / ACRE).
- For prices, map to statisticcat_desc = PRICE RECEIVED when appropriate.
- Do NOT guess counties.
- Be conservative: fewer parameters are better than wrong parameters.
Return JSON only. No prose. No code block fences.

Examples:
{examples}"#
    )
}

/// User message for a single question.
pub fn user_prompt(question: &str) -> String {
    format!("User question: {}\nReturn JSON only.", question)
}
