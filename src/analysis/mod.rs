//! AI-assisted analysis of an uploaded grid.
//!
//! Only the first [`SAMPLE_ROWS`] rows are sent. The provider is asked for a
//! JSON object; anything that does not parse as one is turned into a fallback
//! result instead of an error.

use tracing::{info, warn};

use crate::llm::{LLMMessage, LLMProviderConfig, LLMRequest, LLM};
use crate::models::{AnalysisResult, Grid};
use crate::settings::Provider;
use crate::types::AppResult;

pub const SAMPLE_ROWS: usize = 10;

const SYSTEM_PROMPT: &str =
    "You are a data analysis expert. Always answer with valid JSON only.";

pub const UNPARSEABLE_INSIGHT: &str = "Could not parse the AI response";
pub const EMPTY_SUMMARY: &str = "No response received";

/// Everything needed for one analysis call.
#[derive(Debug, Clone)]
pub struct AnalysisInput<'a> {
    pub data: &'a Grid,
    pub provider: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
    pub base_url: Option<&'a str>,
}

/// First rows of the grid, every cell rendered as text.
pub fn sample_rows(data: &Grid) -> Vec<Vec<String>> {
    data.iter()
        .take(SAMPLE_ROWS)
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

pub fn format_sample(sample: &[Vec<String>]) -> String {
    sample
        .iter()
        .map(|row| row.join(" | "))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(data: &Grid) -> String {
    let data_string = format_sample(&sample_rows(data));

    format!(
        r#"Analyze the following data extracted from a file and provide:

1. A list of identified names (valid full names only)
2. A list of identified dates (in their original format)
3. A list of identified times (in their original format)
4. Insights about the data (patterns, anomalies, trends)
5. A general summary of the data

Data:
{data_string}

Respond in JSON with the following structure:
{{
  "names": ["name1", "name2", ...],
  "dates": ["date1", "date2", ...],
  "times": ["time1", "time2", ...],
  "insights": ["insight1", "insight2", ...],
  "summary": "general summary"
}}"#
    )
}

/// Interpret the model's answer, never failing.
pub fn parse_analysis(content: &str) -> AnalysisResult {
    match serde_json::from_str::<AnalysisResult>(strip_code_fence(content)) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "AI response is not valid analysis JSON");
            fallback_result(content)
        }
    }
}

pub fn fallback_result(content: &str) -> AnalysisResult {
    AnalysisResult {
        insights: vec![UNPARSEABLE_INSIGHT.to_string()],
        summary: if content.is_empty() {
            EMPTY_SUMMARY.to_string()
        } else {
            content.to_string()
        },
        ..Default::default()
    }
}

/// Placeholder for providers without a chat-completion integration.
pub fn not_implemented_result(provider: &str) -> AnalysisResult {
    AnalysisResult {
        insights: vec![format!("Analysis with {} is not implemented yet", provider)],
        summary: format!("Integration with {} is under development", provider),
        ..Default::default()
    }
}

/// Models often wrap JSON in a ```json fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Send the sample to the provider and interpret its answer.
pub async fn analyze(input: &AnalysisInput<'_>) -> AppResult<AnalysisResult> {
    let llm = Provider::from_id(input.provider).and_then(|provider| {
        LLM::for_provider(&LLMProviderConfig {
            provider,
            api_key: input.api_key.to_string(),
            base_url: input.base_url.map(str::to_string),
        })
    });

    let Some(llm) = llm else {
        info!(provider = input.provider, "Provider has no integration, returning placeholder");
        return Ok(not_implemented_result(input.provider));
    };

    let request = LLMRequest::new(
        input.model,
        vec![
            LLMMessage::system(SYSTEM_PROMPT),
            LLMMessage::user(build_prompt(input.data)),
        ],
    );

    info!(
        provider = %llm.provider(),
        model = input.model,
        rows = input.data.len().min(SAMPLE_ROWS),
        "Requesting AI analysis"
    );
    let response = llm.create_chat_completion(&request).await?;

    Ok(parse_analysis(&response.content))
}
