//! Output formatting for aggregated configuration.

use crate::document::{AggregatedConfiguration, Tier};
use serde_json::Value;

/// Output format for the `show` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    /// Render any serializable value.
    pub fn render<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(&to_yaml(serde_json::to_value(value)?))?,
        })
    }
}

/// Convert a JSON value for YAML output.
///
/// Numbers go through their 64-bit forms; integers wider than that can
/// only be written as floats.
fn to_yaml(value: Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(b),
        Value::Number(n) => {
            let number = if let Some(i) = n.as_i64() {
                serde_yaml::Number::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_yaml::Number::from(u)
            } else {
                serde_yaml::Number::from(n.as_f64().unwrap_or(f64::NAN))
            };
            serde_yaml::Value::Number(number)
        }
        Value::String(s) => serde_yaml::Value::String(s),
        Value::Array(items) => {
            serde_yaml::Value::Sequence(items.into_iter().map(to_yaml).collect())
        }
        Value::Object(map) => serde_yaml::Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (serde_yaml::Value::String(k), to_yaml(v)))
                .collect(),
        ),
    }
}

/// The whole aggregate, or just one tier's documents.
pub fn select(conf: &AggregatedConfiguration, tier: Option<Tier>) -> Value {
    match tier {
        Some(tier) => Value::Array(conf.tier(tier).to_vec()),
        None => serde_json::to_value(conf).unwrap_or(Value::Null),
    }
}

/// One-line summary of document counts per tier.
pub fn summary(conf: &AggregatedConfiguration) -> String {
    Tier::ALL
        .iter()
        .map(|tier| format!("{}={}", tier, conf.tier(*tier).len()))
        .collect::<Vec<_>>()
        .join(" ")
}
