use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use coffeehaus_types::search::SearchIntent;

use crate::error::{Result, SearchError};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const MAX_TOKENS: u32 = 1000;

const SYSTEM_PROMPT: &str = "You analyze search queries for a coffee shop discovery app. \
Recognize coffee shop names even when they are unusual or contain technical words. \
Reply with a single JSON object matching the requested shape and nothing else.";

/// Turns a free-text query into a [`SearchIntent`].
#[async_trait]
pub trait QueryAnalyzer: Send + Sync {
    async fn analyze(&self, query: &str, user_location: &str) -> Result<SearchIntent>;
}

/// [`QueryAnalyzer`] backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct ClaudeAnalyzer {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeAnalyzer {
    pub fn new(api_key: &str, model: Option<String>) -> Result<Self> {
        Self::with_endpoint(api_key, model, ANTHROPIC_API_URL)
    }

    pub fn with_endpoint(api_key: &str, model: Option<String>, endpoint: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|_| SearchError::Analyzer("API key is not a valid header value".into()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl QueryAnalyzer for ClaudeAnalyzer {
    async fn analyze(&self, query: &str, user_location: &str) -> Result<SearchIntent> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![ChatMessage {
                role: "user",
                content: user_prompt(query, user_location),
            }],
        };

        let response: MessagesResponse = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| SearchError::Analyzer("response contained no text".into()))?;
        debug!("Query analysis for '{}': {}", query, text);

        parse_intent(&text)
    }
}

fn user_prompt(query: &str, user_location: &str) -> String {
    format!(
        r#"Classify this coffee shop search. The user's current location is: {user_location}

Query: "{query}"

Rules:
1. Multi-word phrases followed by "coffee", "cafe" or "roasters", or placed before "in", "near" or "at", are likely shop names.
2. If a shop name is present the search type is "specific" and the full name goes in terms.shop.
3. "near", "around" or current-location wording without a shop name is "proximity"; include a radius in km.
4. A named area or city without a shop name is "area".
5. Drinks and features ("matcha latte", "pour-over", "wifi") are filters, one entry per product, never shop names.
6. Expand location abbreviations to full names: LA -> Los Angeles, OC -> Orange County, NYC -> New York City, SF -> San Francisco, DTLA -> Downtown Los Angeles. Use "Area, City" for neighbourhoods and two-letter US state codes.

Respond with:
{{
  "searchType": "proximity|area|specific",
  "normalizedQuery": "normalized search terms",
  "location": {{ "name": "location name", "radius": 5 }},
  "terms": {{ "shop": "shop name", "filters": ["filter"] }}
}}"#
    )
}

/// Parses the model's reply, tolerating a surrounding markdown code fence.
pub fn parse_intent(text: &str) -> Result<SearchIntent> {
    let trimmed = text.trim();
    let body = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => return Err(SearchError::Analyzer(format!("no JSON object in reply: {}", trimmed))),
    };
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffeehaus_types::search::SearchType;

    #[test]
    fn parses_bare_json() {
        let intent = parse_intent(
            r#"{"searchType":"area","normalizedQuery":"matcha los angeles","location":{"name":"Los Angeles","radius":0},"terms":{"filters":["matcha"]}}"#,
        )
        .unwrap();
        assert_eq!(intent.search_type, SearchType::Area);
        assert_eq!(intent.terms.filters, vec!["matcha".to_string()]);
    }

    #[test]
    fn parses_fenced_json() {
        let reply = "```json\n{\"searchType\":\"proximity\",\"normalizedQuery\":\"coffee\"}\n```";
        let intent = parse_intent(reply).unwrap();
        assert_eq!(intent.search_type, SearchType::Proximity);
    }

    #[test]
    fn rejects_prose() {
        assert!(matches!(
            parse_intent("I could not classify that."),
            Err(SearchError::Analyzer(_))
        ));
    }

    #[test]
    fn prompt_mentions_query_and_location() {
        let prompt = user_prompt("Stereoscope Coffee near me", "Long Beach, CA");
        assert!(prompt.contains("\"Stereoscope Coffee near me\""));
        assert!(prompt.contains("Long Beach, CA"));
        assert!(prompt.contains("\"searchType\""));
    }
}
