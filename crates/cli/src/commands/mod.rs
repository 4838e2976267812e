pub mod catalog;
pub mod config;
pub mod connection_price;
pub mod option_price;
pub mod price;

use sensorquote_core::config::{AppConfig, LoadOptions};
use sensorquote_core::errors::{ApplicationError, InterfaceError};
use sensorquote_core::InMemoryCatalog;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_CATALOG: u8 = 3;
pub const EXIT_REJECTED: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), 1);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps an application failure onto its interface error and exit code.
    /// The payload carries the correlation id and the user-facing message.
    pub fn rejected(command: &str, error: ApplicationError, correlation_id: &str) -> Self {
        let load_failure = match &error {
            ApplicationError::Configuration(_) => Some(("config_validation", EXIT_CONFIG)),
            ApplicationError::Catalog(_) => Some(("catalog", EXIT_CATALOG)),
            ApplicationError::Pricing(_) => None,
        };
        let interface = error.into_interface(correlation_id);
        let (error_class, exit_code) =
            load_failure.unwrap_or((interface_error_class(&interface), EXIT_REJECTED));

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: interface.message().to_string(),
            correlation_id: Some(interface.correlation_id().to_string()),
            data: Some(serde_json::json!({ "user_message": interface.user_message() })),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// Per-invocation settings shared by every command.
#[derive(Clone, Debug, Default)]
pub struct Invocation {
    pub correlation_id: String,
    pub load_options: LoadOptions,
}

impl Invocation {
    pub fn new(load_options: LoadOptions) -> Self {
        Self { correlation_id: Uuid::new_v4().to_string(), load_options }
    }

    pub fn load_config(&self, command: &str) -> Result<AppConfig, CommandResult> {
        AppConfig::load(self.load_options.clone()).map_err(|error| {
            warn!(
                event_name = "cli.config.invalid",
                correlation_id = %self.correlation_id,
                error = %error,
                "configuration could not be loaded"
            );
            self.reject(command, ApplicationError::Configuration(error.to_string()))
        })
    }

    pub fn load_catalog(
        &self,
        command: &str,
        config: &AppConfig,
    ) -> Result<InMemoryCatalog, CommandResult> {
        InMemoryCatalog::load(&config.catalog.path).map_err(|error| {
            warn!(
                event_name = "cli.catalog.invalid",
                correlation_id = %self.correlation_id,
                catalog_path = %config.catalog.path.display(),
                error = %error,
                "catalog could not be loaded"
            );
            self.reject(command, ApplicationError::Catalog(error.to_string()))
        })
    }

    pub fn reject(&self, command: &str, error: impl Into<ApplicationError>) -> CommandResult {
        CommandResult::rejected(command, error.into(), &self.correlation_id)
    }
}

fn interface_error_class(error: &InterfaceError) -> &'static str {
    match error {
        InterfaceError::BadRequest { .. } => "bad_request",
        InterfaceError::NotFound { .. } => "not_found",
        InterfaceError::ServiceUnavailable { .. } => "service_unavailable",
        InterfaceError::Internal { .. } => "internal",
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
