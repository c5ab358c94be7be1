use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Romance,
    Fantasy,
    SciFi,
    Contemporary,
    Historical,
}

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::Romance,
        Genre::Fantasy,
        Genre::SciFi,
        Genre::Contemporary,
        Genre::Historical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Romance => "romance",
            Genre::Fantasy => "fantasy",
            Genre::SciFi => "sci-fi",
            Genre::Contemporary => "contemporary",
            Genre::Historical => "historical",
        }
    }

    /// Exact, case-sensitive match against the wire names.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|genre| genre.as_str() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryLength {
    Short,
    Medium,
    Long,
}

impl StoryLength {
    pub const ALL: [StoryLength; 3] = [StoryLength::Short, StoryLength::Medium, StoryLength::Long];

    pub fn as_str(self) -> &'static str {
        match self {
            StoryLength::Short => "short",
            StoryLength::Medium => "medium",
            StoryLength::Long => "long",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|length| length.as_str() == raw)
    }

    /// Token budget handed to a real backend when the caller sets none.
    pub fn default_max_tokens(self) -> u32 {
        match self {
            StoryLength::Short => 512,
            StoryLength::Medium => 1024,
            StoryLength::Long => 2048,
        }
    }
}

/// Untyped request body as received on the wire. Every field is optional so
/// the validator, not the JSON extractor, decides what is acceptable. An
/// explicit `null` arrives as `Some(Value::Null)`, never as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGenerationRequest {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub genre: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub length: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub top_p: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A request that passed validation. Echoed back to callers as the resolved
/// parameters of a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub genre: Genre,
    pub length: StoryLength,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Instruction text handed to a real backend.
    pub fn instruction(&self) -> String {
        format!(
            "You are an expert writer of {} stories. Write a {} story based on the following prompt: {}\n\n",
            self.genre.as_str(),
            self.length.as_str(),
            self.prompt
        )
    }
}
