use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricingConfig {
    pub rule_policy: RulePolicy,
    pub stock_grade_material: String,
    pub derived_pricing_materials: Vec<String>,
    pub coated_length: CoatedLengthConfig,
}

/// Standard-length rule for the coated material: off-list lengths pay a fixed
/// surcharge and lengths over `max_length` are rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct CoatedLengthConfig {
    pub material: String,
    pub standard_lengths: Vec<Decimal>,
    pub surcharge: Decimal,
    pub max_length: Decimal,
    pub alternative_material: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Treatment of catalog rules whose type the engine does not recognise.
/// `Lenient` skips them (zero contribution); `Strict` rejects the calculation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub rule_policy: Option<RulePolicy>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            rule_policy: RulePolicy::Lenient,
            stock_grade_material: "S".to_string(),
            derived_pricing_materials: vec!["U".to_string(), "T".to_string()],
            coated_length: CoatedLengthConfig::default(),
        }
    }
}

impl Default for CoatedLengthConfig {
    fn default() -> Self {
        Self {
            material: "H".to_string(),
            standard_lengths: [6, 10, 12, 18, 24, 36, 48, 60, 72, 84, 96]
                .into_iter()
                .map(Decimal::from)
                .collect(),
            surcharge: Decimal::new(150, 0),
            max_length: Decimal::new(96, 0),
            alternative_material: "S".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig { path: PathBuf::from("config/catalog.toml") },
            pricing: PricingConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl RulePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for RulePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(ConfigError::Validation(format!(
                "unsupported rule policy `{other}` (expected lenient|strict)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("sensorquote.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(rule_policy) = pricing.rule_policy {
                self.pricing.rule_policy = rule_policy;
            }
            if let Some(stock_grade_material) = pricing.stock_grade_material {
                self.pricing.stock_grade_material = stock_grade_material;
            }
            if let Some(derived_pricing_materials) = pricing.derived_pricing_materials {
                self.pricing.derived_pricing_materials = derived_pricing_materials;
            }
            if let Some(coated) = pricing.coated_length {
                let target = &mut self.pricing.coated_length;
                if let Some(material) = coated.material {
                    target.material = material;
                }
                if let Some(standard_lengths) = coated.standard_lengths {
                    target.standard_lengths = standard_lengths;
                }
                if let Some(surcharge) = coated.surcharge {
                    target.surcharge = surcharge;
                }
                if let Some(max_length) = coated.max_length {
                    target.max_length = max_length;
                }
                if let Some(alternative_material) = coated.alternative_material {
                    target.alternative_material = alternative_material;
                }
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SENSORQUOTE_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("SENSORQUOTE_PRICING_RULE_POLICY") {
            self.pricing.rule_policy = value.parse()?;
        }
        if let Some(value) = read_env("SENSORQUOTE_PRICING_COATED_SURCHARGE") {
            self.pricing.coated_length.surcharge =
                parse_decimal("SENSORQUOTE_PRICING_COATED_SURCHARGE", &value)?;
        }

        let log_level =
            read_env("SENSORQUOTE_LOGGING_LEVEL").or_else(|| read_env("SENSORQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SENSORQUOTE_LOGGING_FORMAT").or_else(|| read_env("SENSORQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(rule_policy) = overrides.rule_policy {
            self.pricing.rule_policy = rule_policy;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_pricing(&self.pricing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("sensorquote.toml"), PathBuf::from("config/sensorquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("catalog.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.stock_grade_material.trim().is_empty() {
        return Err(ConfigError::Validation(
            "pricing.stock_grade_material must not be empty".to_string(),
        ));
    }

    if pricing.derived_pricing_materials.iter().any(|code| code.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "pricing.derived_pricing_materials must not contain empty codes".to_string(),
        ));
    }

    if pricing.derived_pricing_materials.contains(&pricing.stock_grade_material) {
        return Err(ConfigError::Validation(format!(
            "pricing.stock_grade_material `{}` cannot also be a derived-pricing material",
            pricing.stock_grade_material
        )));
    }

    let coated = &pricing.coated_length;
    if coated.material.trim().is_empty() || coated.alternative_material.trim().is_empty() {
        return Err(ConfigError::Validation(
            "pricing.coated_length.material and alternative_material must not be empty"
                .to_string(),
        ));
    }

    if coated.standard_lengths.is_empty() {
        return Err(ConfigError::Validation(
            "pricing.coated_length.standard_lengths must list at least one length".to_string(),
        ));
    }

    if coated.standard_lengths.iter().any(|length| *length <= Decimal::ZERO) {
        return Err(ConfigError::Validation(
            "pricing.coated_length.standard_lengths must all be greater than zero".to_string(),
        ));
    }

    if coated.surcharge < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.coated_length.surcharge must not be negative".to_string(),
        ));
    }

    if coated.max_length <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.coated_length.max_length must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    pricing: Option<PricingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    rule_policy: Option<RulePolicy>,
    stock_grade_material: Option<String>,
    derived_pricing_materials: Option<Vec<String>>,
    coated_length: Option<CoatedLengthPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CoatedLengthPatch {
    material: Option<String>,
    standard_lengths: Option<Vec<Decimal>>,
    surcharge: Option<Decimal>,
    max_length: Option<Decimal>,
    alternative_material: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
