use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub size: &'static str,
    pub recommended: bool,
}

/// Backends that `/api/switch-model` knows how to describe. Switching to a
/// name outside this list is allowed; it only needs artifacts on disk.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "distilgpt2",
        description: "Small distilled GPT-2, quick to load and fine on CPU",
        size: "~350MB",
        recommended: true,
    },
    CatalogEntry {
        name: "gpt2",
        description: "Original GPT-2 base model",
        size: "~550MB",
        recommended: false,
    },
    CatalogEntry {
        name: "gpt2-medium",
        description: "Larger GPT-2 with noticeably better prose",
        size: "~1.5GB",
        recommended: false,
    },
    CatalogEntry {
        name: "EleutherAI/gpt-neo-125m",
        description: "GPT-Neo trained on the Pile, good for longer narratives",
        size: "~500MB",
        recommended: false,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    Speed,
    Balanced,
    Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptimizationPreset {
    pub dtype: &'static str,
    pub device_map: &'static str,
    pub use_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_cpu_mem_usage: Option<bool>,
}

impl OptimizationLevel {
    /// Unknown or missing levels resolve to `Balanced`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw {
            Some("speed") => OptimizationLevel::Speed,
            Some("quality") => OptimizationLevel::Quality,
            _ => OptimizationLevel::Balanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationLevel::Speed => "speed",
            OptimizationLevel::Balanced => "balanced",
            OptimizationLevel::Quality => "quality",
        }
    }

    pub fn preset(self) -> OptimizationPreset {
        match self {
            OptimizationLevel::Speed => OptimizationPreset {
                dtype: "float16",
                device_map: "auto",
                use_cache: true,
                low_cpu_mem_usage: Some(true),
            },
            OptimizationLevel::Balanced => OptimizationPreset {
                dtype: "float16",
                device_map: "auto",
                use_cache: true,
                low_cpu_mem_usage: None,
            },
            OptimizationLevel::Quality => OptimizationPreset {
                dtype: "float32",
                device_map: "auto",
                use_cache: false,
                low_cpu_mem_usage: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_are_unique_and_one_is_recommended() {
        let mut names: Vec<_> = CATALOG.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
        assert_eq!(CATALOG.iter().filter(|e| e.recommended).count(), 1);
    }

    #[test]
    fn unknown_optimization_level_is_balanced() {
        assert_eq!(OptimizationLevel::parse_lenient(None), OptimizationLevel::Balanced);
        assert_eq!(OptimizationLevel::parse_lenient(Some("turbo")), OptimizationLevel::Balanced);
        assert_eq!(OptimizationLevel::parse_lenient(Some("speed")), OptimizationLevel::Speed);
        assert!(!OptimizationLevel::Quality.preset().use_cache);
    }
}
