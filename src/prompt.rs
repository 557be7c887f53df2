//! Versioned prompt template for the request normalizer

use serde::{Deserialize, Serialize};

/// One few-shot example: a user request and the JSON reply we expect for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptExample {
    pub input: String,
    pub output: String,
}

impl PromptExample {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Instruction text plus few-shot examples, loaded from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    #[serde(default = "default_prompt_name")]
    pub name: String,
    #[serde(default = "default_prompt_version")]
    pub version: String,
    #[serde(default = "default_system_prompt")]
    pub system: String,
    #[serde(default = "default_examples")]
    pub examples: Vec<PromptExample>,
}

fn default_prompt_name() -> String {
    "request_reformatter".to_string()
}

fn default_prompt_version() -> String {
    "1".to_string()
}

fn default_system_prompt() -> String {
    "You turn restaurant search requests into JSON. Reply with exactly one JSON object \
     and nothing else. Use these keys: \"location\" (string, the place to search; null if \
     the user gave none), \"cuisine\" (one of american, chinese, italian, mexican, japanese, \
     indian, thai, french, mediterranean, other; or null), \"price_range\" (one of budget, \
     moderate, expensive, luxury; or null), \"rating_min\" (number from 0 to 5, or null), \
     \"max_distance\" (number of miles, or null). Never guess values the user did not ask for."
        .to_string()
}

fn default_examples() -> Vec<PromptExample> {
    vec![
        PromptExample::new(
            "Find me a cheap Chinese restaurant within 5 miles of downtown Los Angeles",
            r#"{"location":"Downtown Los Angeles, CA","cuisine":"chinese","price_range":"budget","rating_min":null,"max_distance":5}"#,
        ),
        PromptExample::new(
            "I want expensive sushi with at least four stars in Santa Monica",
            r#"{"location":"Santa Monica, CA","cuisine":"japanese","price_range":"expensive","rating_min":4.0,"max_distance":null}"#,
        ),
    ]
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            name: default_prompt_name(),
            version: default_prompt_version(),
            system: default_system_prompt(),
            examples: default_examples(),
        }
    }
}

impl PromptTemplate {
    /// Instruction followed by the user's request
    #[must_use]
    pub fn request_prompt(&self, user_request: &str) -> String {
        format!("{}\n\nUser request: {}", self.system.trim_end(), user_request)
    }

    /// Re-prompt used after a reply could not be parsed
    #[must_use]
    pub fn clarifying_prompt(&self, user_request: &str, problem: &str) -> String {
        format!(
            "{}\n\nYour previous reply could not be used: {}. Reply again with a single JSON \
             object containing only the keys location, cuisine, price_range, rating_min and \
             max_distance.",
            self.request_prompt(user_request),
            problem
        )
    }

    /// Identifier used in logs, e.g. "request_reformatter@v1"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}@v{}", self.name, self.version)
    }
}

/// Render examples the way the completion services expect them appended to
/// the prompt
#[must_use]
pub fn render_with_examples(prompt: &str, examples: &[PromptExample]) -> String {
    if examples.is_empty() {
        return prompt.to_string();
    }
    let mut rendered = String::from(prompt);
    rendered.push_str("\n\nExamples:\n");
    for example in examples {
        rendered.push_str(&format!(
            "Input: {}\nOutput: {}\n\n",
            example.input, example.output
        ));
    }
    rendered
}
