//! Model descriptors and the heuristics that derive them
//!
//! A descriptor captures everything the pool knows about a model: context
//! window, speed class, capability/specialty tags, and footprint/performance
//! estimates. All attributes are inferred from the model identifier with
//! ordered rule tables, so the mapping is data, not scattered conditionals.
//! Unmatched identifiers always resolve to defaults; this path cannot fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse latency category used for hard filtering and scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedClass {
    Fast,
    Medium,
    Slow,
}

impl std::fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Medium => write!(f, "medium"),
            Self::Slow => write!(f, "slow"),
        }
    }
}

/// Normalized performance estimates derived from the identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceEstimate {
    /// Relative token throughput, higher is faster
    pub speed: f64,
    /// Relative output quality, higher is better
    pub quality: f64,
    /// Approximate resident memory in MB
    pub memory_mb: u64,
}

/// Static and runtime metadata for one known model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Provider-side model identifier (unique key)
    pub id: String,
    /// Endpoint of the provider that serves this model
    pub endpoint: String,
    /// Maximum input size the model accepts, in tokens
    pub context_length: u32,
    pub speed: SpeedClass,
    pub capabilities: Vec<String>,
    /// Domain tags used for specialty-match scoring, never empty
    pub specialties: Vec<String>,
    /// Approximate memory cost of keeping the model loaded, in MB
    pub size_mb: u64,
    /// Latency of the most recent successful load, in milliseconds
    pub load_time_ms: u64,
    pub last_used: DateTime<Utc>,
    pub loaded: bool,
    pub performance: PerformanceEstimate,
}

/// Parameter-count hints; first substring match wins. "13b" must be checked
/// before "3b" or a 13b identifier would match the 3b row.
const SIZE_RULES: &[(&str, u64)] = &[
    ("13b", 13_312),
    ("32b", 32_768),
    ("70b", 71_680),
    ("1b", 1_024),
    ("3b", 3_072),
    ("7b", 7_168),
    ("8b", 8_192),
];

const DEFAULT_SIZE_MB: u64 = 4_096;

const CONTEXT_RULES: &[(&str, u32)] = &[
    ("32k", 32_768),
    ("16k", 16_384),
    ("8k", 8_192),
    ("4k", 4_096),
];

const DEFAULT_CONTEXT: u32 = 8_192;

const SPEED_ESTIMATE_RULES: &[(&str, f64)] = &[
    ("13b", 0.4),
    ("32b", 0.3),
    ("70b", 0.2),
    ("1b", 0.9),
    ("3b", 0.8),
    ("7b", 0.6),
    ("8b", 0.5),
];

const QUALITY_ESTIMATE_RULES: &[(&str, f64)] = &[
    ("13b", 0.9),
    ("32b", 0.93),
    ("70b", 0.95),
    ("1b", 0.6),
    ("3b", 0.7),
    ("7b", 0.8),
    ("8b", 0.85),
];

fn match_rule<T: Copy>(name: &str, rules: &[(&str, T)]) -> Option<T> {
    rules
        .iter()
        .find(|(hint, _)| name.contains(hint))
        .map(|(_, value)| *value)
}

/// Build a descriptor for a model identifier
///
/// Pure and total: every attribute falls back to a sensible default when no
/// hint matches, so any string produces a usable descriptor.
pub fn build_descriptor(id: &str, endpoint: &str) -> ModelDescriptor {
    let name = id.to_lowercase();

    ModelDescriptor {
        id: id.to_string(),
        endpoint: endpoint.to_string(),
        context_length: estimate_context_length(&name),
        speed: estimate_speed(&name),
        capabilities: determine_capabilities(&name),
        specialties: determine_specialties(&name),
        size_mb: estimate_size_mb(&name),
        load_time_ms: 0,
        last_used: Utc::now(),
        loaded: false,
        performance: estimate_performance(&name),
    }
}

/// Build a descriptor with curated attributes, used for the built-in
/// default model set where the heuristics would be too coarse.
pub fn build_descriptor_with(
    id: &str,
    endpoint: &str,
    context_length: u32,
    speed: SpeedClass,
    capabilities: &[&str],
    specialties: &[&str],
) -> ModelDescriptor {
    let name = id.to_lowercase();

    ModelDescriptor {
        id: id.to_string(),
        endpoint: endpoint.to_string(),
        context_length,
        speed,
        capabilities: capabilities.iter().map(|s| s.to_string()).collect(),
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        size_mb: estimate_size_mb(&name),
        load_time_ms: 0,
        last_used: Utc::now(),
        loaded: false,
        performance: estimate_performance(&name),
    }
}

fn estimate_size_mb(name: &str) -> u64 {
    match_rule(name, SIZE_RULES).unwrap_or(DEFAULT_SIZE_MB)
}

fn estimate_context_length(name: &str) -> u32 {
    match_rule(name, CONTEXT_RULES).unwrap_or(DEFAULT_CONTEXT)
}

fn estimate_speed(name: &str) -> SpeedClass {
    if name.contains("1b") || name.contains("3b") || name.contains("mini") {
        SpeedClass::Fast
    } else if name.contains("70b") || name.contains("32b") {
        SpeedClass::Slow
    } else {
        SpeedClass::Medium
    }
}

fn determine_capabilities(name: &str) -> Vec<String> {
    let mut capabilities = vec!["chat".to_string(), "instruct".to_string()];

    const CAPABILITY_RULES: &[(&str, &str)] = &[
        ("code", "coding"),
        ("reason", "reasoning"),
        ("math", "mathematics"),
    ];

    for (hint, tag) in CAPABILITY_RULES {
        if name.contains(hint) {
            capabilities.push(tag.to_string());
        }
    }

    capabilities
}

fn determine_specialties(name: &str) -> Vec<String> {
    const SPECIALTY_RULES: &[(&str, &[&str])] = &[
        ("code", &["code_generation"]),
        ("fast", &["speed", "emergency"]),
        ("mini", &["speed", "emergency"]),
        ("instruct", &["instruction_following"]),
        ("chat", &["conversation"]),
        ("70b", &["complex_reasoning", "strategic_planning"]),
        ("32b", &["complex_reasoning", "strategic_planning"]),
    ];

    let mut specialties: Vec<String> = Vec::new();
    for (hint, tags) in SPECIALTY_RULES {
        if name.contains(hint) {
            for tag in *tags {
                if !specialties.iter().any(|s| s == tag) {
                    specialties.push(tag.to_string());
                }
            }
        }
    }

    if specialties.is_empty() {
        specialties.push("general".to_string());
    }

    specialties
}

fn estimate_performance(name: &str) -> PerformanceEstimate {
    PerformanceEstimate {
        speed: match_rule(name, SPEED_ESTIMATE_RULES).unwrap_or(0.5),
        quality: match_rule(name, QUALITY_ESTIMATE_RULES).unwrap_or(0.5),
        memory_mb: estimate_size_mb(name),
    }
}
