//! Request normalization
//!
//! Turns free text and/or caller-supplied fields into a validated
//! [`SearchRequest`]. Interpretation of free text is delegated to a
//! [`CompletionClient`]; its JSON reply is parsed strictly, with exactly one
//! clarifying re-prompt when the first reply cannot be used.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::ai::CompletionClient;
use crate::error::{Result, SearchError, ServiceError};
use crate::models::{
    Cuisine, PartialRequest, PriceRange, SearchInput, SearchRequest, restaurant::is_valid_rating,
};
use crate::prompt::PromptTemplate;

/// Number of completion calls allowed per normalization: the first attempt
/// plus one clarifying retry
const MAX_ATTEMPTS: usize = 2;

/// Shape of the JSON object the model is asked to produce. Unknown keys are
/// ignored; `null` means absent.
#[derive(Debug, Deserialize)]
struct AiReply {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    cuisine: Option<String>,
    #[serde(default, alias = "price")]
    price_range: Option<String>,
    #[serde(default, alias = "rating")]
    rating_min: Option<f64>,
    #[serde(default, alias = "geographic_distance")]
    max_distance: Option<f64>,
}

pub struct RequestNormalizer {
    client: Arc<dyn CompletionClient>,
    template: PromptTemplate,
    timeout: Duration,
}

impl RequestNormalizer {
    pub fn new(client: Arc<dyn CompletionClient>, template: PromptTemplate, timeout: Duration) -> Self {
        Self {
            client,
            template,
            timeout,
        }
    }

    /// Normalize caller input into a search request
    #[instrument(name = "normalize", skip_all, fields(prompt = %self.template.label()))]
    pub async fn normalize(&self, input: &SearchInput) -> Result<SearchRequest> {
        let overrides = input.overrides.parse()?;

        let Some(query) = input.query_text() else {
            if overrides.is_empty() {
                return Err(SearchError::validation(
                    "search input is empty: give a query or structured fields",
                ));
            }
            debug!("No free text given, using structured fields as-is");
            return overrides.into_request();
        };

        if overrides.is_complete() {
            debug!("Structured fields are complete, skipping AI interpretation");
            return overrides.into_request();
        }

        let interpreted = self.interpret(query).await?;
        let request = overrides.merge_over(interpreted).into_request()?;

        info!(
            "Normalized request: location={:?} cuisine={:?} price={:?} rating_min={:?} max_distance={:?}",
            request.location,
            request.cuisine,
            request.price_range,
            request.rating_min,
            request.max_distance
        );
        Ok(request)
    }

    /// Ask the completion service to interpret `query`, re-prompting once if
    /// the reply cannot be parsed
    async fn interpret(&self, query: &str) -> Result<PartialRequest> {
        let mut prompt = self.template.request_prompt(query);
        let mut last_problem = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            let reply = self.call(&prompt).await?;
            match parse_reply(&reply) {
                Ok(partial) => {
                    debug!("AI reply parsed on attempt {}", attempt);
                    return Ok(partial);
                }
                Err(problem) => {
                    warn!("Unusable AI reply on attempt {}: {}", attempt, problem);
                    prompt = self.template.clarifying_prompt(query, &problem);
                    last_problem = problem;
                }
            }
        }

        Err(SearchError::malformed(format!(
            "could not interpret the request after {MAX_ATTEMPTS} attempts: {last_problem}"
        )))
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.client.complete(prompt, &self.template.examples))
            .await
        {
            Ok(reply) => Ok(reply?),
            Err(_) => Err(ServiceError::Timeout(self.timeout).into()),
        }
    }
}

/// Parse a model reply into typed fields. The error string describes what
/// was wrong and is fed back to the model on retry.
pub fn parse_reply(reply: &str) -> std::result::Result<PartialRequest, String> {
    let json = extract_json_object(reply).ok_or_else(|| "reply contained no JSON object".to_string())?;
    let raw: AiReply = serde_json::from_str(json).map_err(|e| format!("invalid JSON: {e}"))?;

    let cuisine = non_blank(raw.cuisine)
        .map(|c| Cuisine::from_token(&c).ok_or_else(|| format!("unknown cuisine '{c}'")))
        .transpose()?;
    let price_range = non_blank(raw.price_range)
        .map(|p| PriceRange::from_token(&p).ok_or_else(|| format!("unknown price range '{p}'")))
        .transpose()?;

    if let Some(rating) = raw.rating_min {
        if !is_valid_rating(rating) {
            return Err(format!("rating_min {rating} is outside 0-5"));
        }
    }
    if let Some(distance) = raw.max_distance {
        if !distance.is_finite() || distance < 0.0 {
            return Err(format!("max_distance {distance} is not a non-negative number"));
        }
    }

    Ok(PartialRequest {
        location: non_blank(raw.location),
        cuisine,
        price_range,
        rating_min: raw.rating_min,
        max_distance: raw.max_distance,
        origin: None,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Find the outermost `{...}` in a reply, tolerating code fences and chatter
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptExample;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records the prompts it was given
    struct ScriptedClient {
        replies: Mutex<VecDeque<std::result::Result<String, ServiceError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<std::result::Result<String, ServiceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            prompt: &str,
            _examples: &[PromptExample],
        ) -> std::result::Result<String, ServiceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn normalizer(client: Arc<ScriptedClient>) -> RequestNormalizer {
        RequestNormalizer::new(client, PromptTemplate::default(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_normalize_cheap_italian_in_boston() {
        let client = ScriptedClient::new(vec![Ok(
            r#"{"cuisine":"Italian","price_range":"Budget","location":"Boston"}"#.to_string(),
        )]);
        let request = normalizer(client.clone())
            .normalize(&SearchInput::text("I want cheap Italian food in Boston"))
            .await
            .unwrap();

        assert_eq!(request.location, "Boston");
        assert_eq!(request.cuisine, Some(Cuisine::Italian));
        assert_eq!(request.price_range, Some(PriceRange::Budget));
        assert_eq!(request.rating_min, None);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_twice_fails_after_one_retry() {
        let client = ScriptedClient::new(vec![
            Ok("Sure! Here are some restaurants".to_string()),
            Ok("still not json".to_string()),
            Ok(r#"{"location":"Boston"}"#.to_string()),
        ]);
        let err = normalizer(client.clone())
            .normalize(&SearchInput::text("pizza in Boston"))
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::MalformedResponse { .. }));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_uses_clarifying_prompt_and_recovers() {
        let client = ScriptedClient::new(vec![
            Ok(r#"{"location":"Boston","cuisine":"tex-mex"}"#.to_string()),
            Ok(r#"{"location":"Boston","cuisine":"mexican"}"#.to_string()),
        ]);
        let request = normalizer(client.clone())
            .normalize(&SearchInput::text("tex-mex in Boston"))
            .await
            .unwrap();

        assert_eq!(request.cuisine, Some(Cuisine::Mexican));
        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("unknown cuisine 'tex-mex'"));
    }

    #[tokio::test]
    async fn test_missing_location_is_validation_error() {
        let client = ScriptedClient::new(vec![Ok(
            r#"{"location":null,"cuisine":"thai"}"#.to_string(),
        )]);
        let err = normalizer(client.clone())
            .normalize(&SearchInput::text("thai food"))
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Validation { .. }));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let client = ScriptedClient::new(vec![Err(ServiceError::RateLimited(
            "quota".to_string(),
        ))]);
        let err = normalizer(client.clone())
            .normalize(&SearchInput::text("thai food in Boston"))
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::ExternalService { .. }));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_structured_only_skips_ai() {
        let client = ScriptedClient::new(vec![]);
        let input = SearchInput::structured(crate::models::SearchOverrides {
            location: Some("Boston".to_string()),
            cuisine: Some("thai".to_string()),
            ..Default::default()
        });
        let request = normalizer(client.clone()).normalize(&input).await.unwrap();

        assert_eq!(request.cuisine, Some(Cuisine::Thai));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_overrides_win_over_ai_fields() {
        let client = ScriptedClient::new(vec![Ok(
            r#"{"location":"Boston","cuisine":"italian","rating_min":3}"#.to_string(),
        )]);
        let input = SearchInput::text("italian in Boston").with_overrides(
            crate::models::SearchOverrides {
                rating_min: Some(4.5),
                ..Default::default()
            },
        );
        let request = normalizer(client).normalize(&input).await.unwrap();

        assert_eq!(request.rating_min, Some(4.5));
        assert_eq!(request.cuisine, Some(Cuisine::Italian));
    }

    #[tokio::test]
    async fn test_empty_input_is_validation_error() {
        let client = ScriptedClient::new(vec![]);
        let err = normalizer(client.clone())
            .normalize(&SearchInput::text("   "))
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Validation { .. }));
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn test_parse_reply_tolerates_code_fences() {
        let reply = "```json\n{\"location\": \"Austin, TX\", \"price\": \"$$\"}\n```";
        let partial = parse_reply(reply).unwrap();
        assert_eq!(partial.location.as_deref(), Some("Austin, TX"));
        assert_eq!(partial.price_range, Some(PriceRange::Moderate));
    }

    #[test]
    fn test_parse_reply_rejects_non_numeric_rating() {
        let err = parse_reply(r#"{"location":"Boston","rating_min":"four"}"#).unwrap_err();
        assert!(err.contains("invalid JSON"));
    }

    #[test]
    fn test_parse_reply_rejects_out_of_range_rating() {
        let err = parse_reply(r#"{"location":"Boston","rating_min":7}"#).unwrap_err();
        assert!(err.contains("outside 0-5"));
    }

    #[test]
    fn test_parse_reply_ignores_unknown_keys() {
        let partial =
            parse_reply(r#"{"location":"LA","time_distance":"20 minutes","hours":null}"#).unwrap();
        assert_eq!(partial.location.as_deref(), Some("LA"));
        assert_eq!(partial.max_distance, None);
    }
}
