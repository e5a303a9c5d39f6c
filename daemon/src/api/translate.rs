//! Wire request -> engine request translation.

use llamashim_core::config::InferenceConfig;
use llamashim_runtime_api::CompletionRequest;
use serde::{Deserialize, Deserializer};

/// Generation ends at either sequence; both paths use the same set.
pub const STOP_SEQUENCES: [&str; 2] = ["User:", "\n\n"];

/// Ollama `options` object. Keys other than these are accepted and ignored.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct OllamaOptions {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default, deserialize_with = "token_count")]
    pub num_predict: Option<i64>,
}

/// Token counts arrive as integers or floats (`128.0`); fractions are truncated.
fn token_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number.and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))))
}

/// Sampling parameters after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// `None` generates until the context window fills
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn resolve(options: Option<&OllamaOptions>, defaults: &InferenceConfig) -> Self {
        let temperature = options
            .and_then(|o| o.temperature)
            .unwrap_or(defaults.temperature);

        let max_tokens = match options.and_then(|o| o.num_predict) {
            None => Some(defaults.max_tokens),
            Some(n) if n > 0 => Some(u32::try_from(n).unwrap_or(u32::MAX)),
            Some(_) => None,
        };

        Self {
            temperature,
            max_tokens,
        }
    }

    pub fn into_request(self, prompt: String) -> CompletionRequest {
        CompletionRequest {
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// `"{system}\n\n{prompt}"` when a system message is given, else the prompt.
pub fn generate_prompt(system: Option<&str>, prompt: &str) -> String {
    match system {
        Some(system) if !system.is_empty() => format!("{}\n\n{}", system, prompt),
        _ => prompt.to_string(),
    }
}

/// Flatten a conversation into `Role: content` lines ending with an
/// assistant cue. Any role other than `user` is rendered as the assistant.
pub fn chat_prompt<'a, I>(messages: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut prompt = String::new();
    for (role, content) in messages {
        let prefix = if role == "user" { "User: " } else { "Assistant: " };
        prompt.push_str(prefix);
        prompt.push_str(content);
        prompt.push('\n');
    }
    prompt.push_str("Assistant: ");
    prompt
}
