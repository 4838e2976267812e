use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::Value;

use super::{CommandResult, Invocation};

const COMMAND: &str = "config";

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(invocation: &Invocation) -> CommandResult {
    let config = match invocation.load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path(invocation.load_options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };
    let pricing = &config.pricing;
    let coated = &pricing.coated_length;

    let entries = vec![
        ConfigEntry {
            key: "catalog.path",
            value: config.catalog.path.display().to_string(),
            source: source("catalog.path", &["SENSORQUOTE_CATALOG_PATH"]),
        },
        ConfigEntry {
            key: "pricing.rule_policy",
            value: pricing.rule_policy.as_str().to_string(),
            source: source("pricing.rule_policy", &["SENSORQUOTE_PRICING_RULE_POLICY"]),
        },
        ConfigEntry {
            key: "pricing.stock_grade_material",
            value: pricing.stock_grade_material.clone(),
            source: source("pricing.stock_grade_material", &[]),
        },
        ConfigEntry {
            key: "pricing.derived_pricing_materials",
            value: pricing.derived_pricing_materials.join(","),
            source: source("pricing.derived_pricing_materials", &[]),
        },
        ConfigEntry {
            key: "pricing.coated_length.material",
            value: coated.material.clone(),
            source: source("pricing.coated_length.material", &[]),
        },
        ConfigEntry {
            key: "pricing.coated_length.standard_lengths",
            value: coated
                .standard_lengths
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            source: source("pricing.coated_length.standard_lengths", &[]),
        },
        ConfigEntry {
            key: "pricing.coated_length.surcharge",
            value: coated.surcharge.to_string(),
            source: source(
                "pricing.coated_length.surcharge",
                &["SENSORQUOTE_PRICING_COATED_SURCHARGE"],
            ),
        },
        ConfigEntry {
            key: "pricing.coated_length.max_length",
            value: coated.max_length.to_string(),
            source: source("pricing.coated_length.max_length", &[]),
        },
        ConfigEntry {
            key: "pricing.coated_length.alternative_material",
            value: coated.alternative_material.clone(),
            source: source("pricing.coated_length.alternative_material", &[]),
        },
        ConfigEntry {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: source(
                "logging.level",
                &["SENSORQUOTE_LOGGING_LEVEL", "SENSORQUOTE_LOG_LEVEL"],
            ),
        },
        ConfigEntry {
            key: "logging.format",
            value: config.logging.format.as_str().to_string(),
            source: source(
                "logging.format",
                &["SENSORQUOTE_LOGGING_FORMAT", "SENSORQUOTE_LOG_FORMAT"],
            ),
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.iter().map(render_line));

    CommandResult::success_with_data(COMMAND, lines.join("\n"), &entries)
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("sensorquote.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/sensorquote.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(entry: &ConfigEntry) -> String {
    format!("- {} = {} (source: {})", entry.key, entry.value, entry.source)
}
