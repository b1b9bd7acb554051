use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::prompt::build_analysis_prompt;
use crate::types::{AnalysisResult, CandidateItem, NewsletterError, Result};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Opaque "submit text, receive text" port for the reasoning service.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl ReasoningClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
        });

        debug!("Submitting {} chars to model {}", prompt.len(), self.model);
        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let reply: ChatCompletionResponse = response.json().await?;
        Ok(reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Expected shape of the analysis: one entry per niche, value = app count.
/// Older prompt revisions used different counts; this is the current policy.
#[derive(Debug, Clone)]
pub struct SchemaPolicy {
    pub apps_per_niche: Vec<usize>,
}

impl Default for SchemaPolicy {
    fn default() -> Self {
        Self {
            apps_per_niche: vec![2, 1],
        }
    }
}

/// Send the formatted picks to the reasoning service and validate its reply.
///
/// This is the single structural validation pass of the pipeline: empty or
/// unparseable replies and schema violations are terminal, with no repair
/// attempt.
pub async fn analyze(
    client: &dyn ReasoningClient,
    opportunities_text: &str,
    today: &str,
    policy: &SchemaPolicy,
) -> Result<AnalysisResult> {
    let prompt = build_analysis_prompt(opportunities_text, today);
    let reply = client.complete(&prompt).await?;

    if reply.trim().is_empty() {
        return Err(NewsletterError::EmptyResponse);
    }

    let analysis = parse_analysis(&reply, policy)?;
    info!(
        "Analysis complete: \"{}\" ({} niches)",
        analysis.title,
        analysis.niches.len()
    );
    Ok(analysis)
}

/// Parse the reply as JSON after stripping optional code fences, then check
/// the niche/app-count invariants.
pub fn parse_analysis(reply: &str, policy: &SchemaPolicy) -> Result<AnalysisResult> {
    let json_text = strip_code_fences(reply.trim());

    let analysis: AnalysisResult = serde_json::from_str(json_text)
        .map_err(|err| NewsletterError::MalformedResponse(err.to_string()))?;

    if analysis.niches.len() != policy.apps_per_niche.len() {
        return Err(NewsletterError::SchemaViolation(format!(
            "expected {} niches, got {}",
            policy.apps_per_niche.len(),
            analysis.niches.len()
        )));
    }
    for (index, (niche, expected)) in analysis
        .niches
        .iter()
        .zip(&policy.apps_per_niche)
        .enumerate()
    {
        if niche.apps.len() != *expected {
            return Err(NewsletterError::SchemaViolation(format!(
                "expected {} apps in niche {}, got {}",
                expected,
                index + 1,
                niche.apps.len()
            )));
        }
    }

    Ok(analysis)
}

fn strip_code_fences(text: &str) -> &str {
    let mut stripped = text;
    for opener in ["```json", "```"] {
        if let Some(rest) = stripped.strip_prefix(opener) {
            stripped = rest;
            break;
        }
    }
    if let Some(rest) = stripped.strip_suffix("```") {
        stripped = rest;
    }
    stripped.trim()
}

/// Serialize the day's picks into one prompt-ready text block. Pure and
/// deterministic: same items in, same text out.
pub fn format_for_analysis(items: &[CandidateItem]) -> String {
    let mut text = String::from("=== TODAY'S APP STORE INTELLIGENCE ===\n\n");

    if let Some(stats) = items.first().and_then(daily_stats) {
        text.push_str("DAILY OVERVIEW:\n");
        text.push_str(&format!(
            "- Total apps detected: {}\n",
            stats["total_apps"].as_i64().unwrap_or(0)
        ));
        text.push_str(&format!(
            "- New apps (< 6 months): {}\n",
            stats["new_apps"].as_i64().unwrap_or(0)
        ));
        text.push_str(&format!(
            "- Free: {} | Paid: {}\n",
            stats["free_apps"].as_i64().unwrap_or(0),
            stats["paid_apps"].as_i64().unwrap_or(0)
        ));
        text.push_str(&format!(
            "- Average score: {}\n\n",
            stats["avg_score"].as_i64().unwrap_or(0)
        ));

        text.push_str("CLUSTERS (categories with 2+ apps = HOT NICHES):\n");
        if let Some(clusters) = stats["clusters"].as_array() {
            for cluster in clusters {
                text.push_str(&format!(
                    "- {}: {} apps\n",
                    cluster["name"].as_str().unwrap_or("?"),
                    cluster["count"].as_i64().unwrap_or(0)
                ));
            }
        }
        text.push('\n');
    }

    text.push_str("APPS IN TODAY'S PICKS:\n\n");
    for item in items {
        let dev_apps = item.dev_app_count.unwrap_or(1);
        let market = item.best_country.as_deref().unwrap_or("??");

        text.push_str("------------------------------\n");
        text.push_str(&format!("App: {}\n", item.name));
        text.push_str(&format!(
            "   Developer: {} ({}, {} app{})\n",
            item.developer.as_deref().unwrap_or("Unknown"),
            developer_tier(dev_apps),
            dev_apps,
            if dev_apps > 1 { "s" } else { "" }
        ));
        text.push_str(&format!(
            "   Category: {}\n",
            item.category_name.as_deref().unwrap_or(&item.category)
        ));
        text.push_str(&format!(
            "   Rank: #{} in {} {}\n",
            item.best_rank,
            market,
            market_flag(market)
        ));
        text.push_str(&format!(
            "   Countries: {} ({} markets)\n",
            item.countries.join(", "),
            item.country_count
        ));
        text.push_str(&format!(
            "   Score: {}/100\n",
            item.total_score.unwrap_or(0)
        ));
        text.push_str(&format!(
            "   New app: {}\n",
            if item.is_new {
                "Yes (< 6 months)"
            } else {
                "No (established)"
            }
        ));
        text.push_str(&format!(
            "   Category competition: {} apps in same category today\n\n",
            item.category_apps_count.unwrap_or(0)
        ));
    }

    text
}

/// The day's aggregate statistics, shared by every pick. The blob arrives
/// either pre-parsed or as a JSON-encoded string; a broken blob degrades to
/// "no header" instead of aborting the run.
fn daily_stats(item: &CandidateItem) -> Option<serde_json::Value> {
    match item.daily_stats.as_ref()? {
        serde_json::Value::String(raw) => match serde_json::from_str(raw) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("Failed to parse daily_stats: {}", err);
                None
            }
        },
        value => Some(value.clone()),
    }
}

/// Developer tier by how many apps the developer ships.
pub fn developer_tier(dev_app_count: i32) -> &'static str {
    match dev_app_count {
        i32::MIN..=1 => "indie",
        2..=3 => "small_studio",
        _ => "publisher",
    }
}

/// Flag glyph for a market code, generic globe for anything unknown.
pub fn market_flag(country_code: &str) -> &'static str {
    match country_code {
        "US" => "\u{1F1FA}\u{1F1F8}",
        "GB" => "\u{1F1EC}\u{1F1E7}",
        "FR" => "\u{1F1EB}\u{1F1F7}",
        "DE" => "\u{1F1E9}\u{1F1EA}",
        "IT" => "\u{1F1EE}\u{1F1F9}",
        "ES" => "\u{1F1EA}\u{1F1F8}",
        "CA" => "\u{1F1E8}\u{1F1E6}",
        "AU" => "\u{1F1E6}\u{1F1FA}",
        "JP" => "\u{1F1EF}\u{1F1F5}",
        "KR" => "\u{1F1F0}\u{1F1F7}",
        "BR" => "\u{1F1E7}\u{1F1F7}",
        "MX" => "\u{1F1F2}\u{1F1FD}",
        "NL" => "\u{1F1F3}\u{1F1F1}",
        "SE" => "\u{1F1F8}\u{1F1EA}",
        "NO" => "\u{1F1F3}\u{1F1F4}",
        "DK" => "\u{1F1E9}\u{1F1F0}",
        "FI" => "\u{1F1EB}\u{1F1EE}",
        "PL" => "\u{1F1F5}\u{1F1F1}",
        "CH" => "\u{1F1E8}\u{1F1ED}",
        "AT" => "\u{1F1E6}\u{1F1F9}",
        "BE" => "\u{1F1E7}\u{1F1EA}",
        "PT" => "\u{1F1F5}\u{1F1F9}",
        "IE" => "\u{1F1EE}\u{1F1EA}",
        "NZ" => "\u{1F1F3}\u{1F1FF}",
        "SG" => "\u{1F1F8}\u{1F1EC}",
        "HK" => "\u{1F1ED}\u{1F1F0}",
        "TW" => "\u{1F1F9}\u{1F1FC}",
        "IN" => "\u{1F1EE}\u{1F1F3}",
        "ZA" => "\u{1F1FF}\u{1F1E6}",
        _ => "\u{1F30D}",
    }
}
