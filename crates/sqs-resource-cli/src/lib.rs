//! # SQS Resource CLI
//!
//! Command-line tool for a single Amazon SQS queue.
//!
//! This module provides CLI commands for:
//! - Showing queue attributes, all of them or one typed value
//! - Receiving messages, optionally extending their visibility and deleting
//!   them afterwards
//! - Updating a queue attribute
//!
//! Connection settings come from an optional configuration file, then
//! `SQS_RESOURCE__*` environment variables, then command-line flags.

use clap::{Parser, Subcommand};
use serde::Serialize;
use sqs_resource::{
    AttributeError, AwsSqsClient, ChangeMessageVisibilityRequest, ConfigurationError,
    DeleteMessageBatchRequest, Message, MessageAttributeValue, Queue, QueueAttribute,
    ReceiveMessageRequest, SetQueueAttributesRequest, SqsClientConfig, SqsError, ALL_ATTRIBUTES,
};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

// ============================================================================
// CLI Structure
// ============================================================================

/// SQS Resource CLI - inspect and drain Amazon SQS queues
#[derive(Parser, Debug)]
#[command(name = "sqs-resource")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and drain Amazon SQS queues")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SQS_RESOURCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level or filter directive
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// AWS region, overriding configuration
    #[arg(long)]
    pub region: Option<String>,

    /// Custom service endpoint, e.g. a local emulator
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Queue URL, overriding configuration
    #[arg(short, long)]
    pub queue_url: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show queue attributes
    Attributes {
        /// Show a single attribute by accessor name, e.g. "visibility_timeout"
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Receive messages
    Receive {
        /// Maximum number of messages to receive (1-10)
        #[arg(short, long, default_value = "1")]
        max: i32,

        /// Long-poll wait in seconds
        #[arg(short, long)]
        wait: Option<i32>,

        /// Visibility timeout for the received messages
        #[arg(long)]
        visibility_timeout: Option<i32>,

        /// Change each received message's visibility timeout to this value
        #[arg(long)]
        extend_visibility: Option<i32>,

        /// Delete the messages after printing them
        #[arg(short, long)]
        delete: bool,
    },

    /// Update one queue attribute
    SetAttribute {
        /// Service attribute name, e.g. "VisibilityTimeout"
        #[arg(short, long)]
        name: String,

        /// New value
        #[arg(short, long)]
        value: String,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

// ============================================================================
// Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Service error: {0}")]
    Service(#[from] SqsError),

    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Service(_) => 2,
            Self::Attribute(_) => 3,
            Self::CommandFailed { .. } => 4,
            Self::InvalidArgument { .. } => 5,
            Self::Io(_) => 6,
            Self::Serialization(_) => 7,
        }
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Parse arguments and run the selected command
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let config = resolve_configuration(&cli)?;
    let queue_url = config.require_queue_url()?.to_string();
    let client = AwsSqsClient::from_config(&config).await?;
    let queue = Queue::new(queue_url, Arc::new(client));

    let mut stdout = std::io::stdout().lock();
    execute_command(&cli.command, cli.format, &queue, &mut stdout).await
}

/// Initialize logging based on CLI arguments. Logs go to stderr so command
/// output on stdout stays machine readable.
fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = EnvFilter::try_new(&cli.log_level).map_err(|e| CliError::InvalidArgument {
        arg: "log-level".to_string(),
        message: e.to_string(),
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::CommandFailed {
        message: format!("failed to initialize logging: {}", e),
    })
}

/// Load configuration and apply command-line overrides
pub fn resolve_configuration(cli: &Cli) -> Result<SqsClientConfig, CliError> {
    let mut config = SqsClientConfig::load(cli.config.as_deref())?;

    if let Some(region) = &cli.region {
        config.region = Some(region.clone());
    }
    if let Some(endpoint_url) = &cli.endpoint_url {
        config.endpoint_url = Some(endpoint_url.clone());
    }
    if let Some(queue_url) = &cli.queue_url {
        config.queue_url = Some(queue_url.clone());
    }

    config.validate()?;
    debug!(
        region = ?config.region,
        endpoint_url = ?config.endpoint_url,
        queue_url = ?config.queue_url,
        "Resolved configuration"
    );
    Ok(config)
}

/// Run one command against `queue`, writing results to `out`
pub async fn execute_command<W: Write>(
    command: &Commands,
    format: OutputFormat,
    queue: &Queue,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Commands::Attributes { name } => {
            execute_attributes_command(name.as_deref(), format, queue, out).await
        }
        Commands::Receive {
            max,
            wait,
            visibility_timeout,
            extend_visibility,
            delete,
        } => {
            let options = ReceiveOptions {
                max: *max,
                wait: *wait,
                visibility_timeout: *visibility_timeout,
                extend_visibility: *extend_visibility,
                delete: *delete,
            };
            execute_receive_command(&options, format, queue, out).await
        }
        Commands::SetAttribute { name, value } => {
            execute_set_attribute_command(name, value, format, queue, out).await
        }
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn execute_attributes_command<W: Write>(
    name: Option<&str>,
    format: OutputFormat,
    queue: &Queue,
    out: &mut W,
) -> Result<(), CliError> {
    info!(queue_url = %queue.url(), name = ?name, "Showing queue attributes");

    match name {
        Some(name) => {
            let attribute: QueueAttribute = name.parse()?;
            let value = queue.attribute(attribute).await?.map(|v| v.to_string());
            match format {
                OutputFormat::Text => {
                    writeln!(
                        out,
                        "{}: {}",
                        attribute.accessor(),
                        value.as_deref().unwrap_or("(not set)")
                    )?;
                }
                OutputFormat::Json => {
                    let mut document = BTreeMap::new();
                    document.insert(attribute.accessor(), value);
                    writeln!(out, "{}", serde_json::to_string_pretty(&document)?)?;
                }
            }
        }
        None => {
            let attributes = queue.attributes().await?;
            let sorted: BTreeMap<&String, &String> = attributes.iter().collect();
            match format {
                OutputFormat::Text => {
                    for (name, value) in sorted {
                        writeln!(out, "{}: {}", name, value)?;
                    }
                }
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&sorted)?)?;
                }
            }
        }
    }

    Ok(())
}

/// Settings for the receive command
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReceiveOptions {
    max: i32,
    wait: Option<i32>,
    visibility_timeout: Option<i32>,
    extend_visibility: Option<i32>,
    delete: bool,
}

impl ReceiveOptions {
    fn to_request(&self) -> Result<ReceiveMessageRequest, CliError> {
        if !(1..=10).contains(&self.max) {
            return Err(CliError::InvalidArgument {
                arg: "max".to_string(),
                message: format!("must be between 1 and 10, got {}", self.max),
            });
        }

        let mut request = ReceiveMessageRequest::new()
            .with_max_number_of_messages(self.max)
            .with_message_attribute_name(ALL_ATTRIBUTES)
            .with_message_system_attribute_name(ALL_ATTRIBUTES);
        if let Some(wait) = self.wait {
            request = request.with_wait_time_seconds(wait);
        }
        if let Some(timeout) = self.visibility_timeout {
            request = request.with_visibility_timeout(timeout);
        }
        Ok(request)
    }
}

/// A received message as printed by the receive command
#[derive(Debug, Serialize)]
struct MessageView<'a> {
    message_id: Option<&'a str>,
    receipt_handle: Option<&'a str>,
    body: Option<&'a str>,
    attributes: BTreeMap<&'a String, &'a String>,
    message_attributes: BTreeMap<&'a String, &'a MessageAttributeValue>,
}

impl<'a> MessageView<'a> {
    fn new(message: &'a Message) -> Self {
        Self {
            message_id: message.message_id(),
            receipt_handle: message.receipt_handle(),
            body: message.body(),
            attributes: message.attributes().iter().collect(),
            message_attributes: message.message_attributes().iter().collect(),
        }
    }
}

async fn execute_receive_command<W: Write>(
    options: &ReceiveOptions,
    format: OutputFormat,
    queue: &Queue,
    out: &mut W,
) -> Result<(), CliError> {
    let request = options.to_request()?;
    info!(
        queue_url = %queue.url(),
        max = options.max,
        delete = options.delete,
        "Receiving messages"
    );

    let messages = queue.receive_messages(request).await?;

    if let Some(timeout) = options.extend_visibility {
        for message in &messages {
            message
                .change_visibility(ChangeMessageVisibilityRequest::new(timeout))
                .await?;
        }
    }

    match format {
        OutputFormat::Text => {
            for message in &messages {
                writeln!(
                    out,
                    "{}\t{}",
                    message.message_id().unwrap_or("-"),
                    message.body().unwrap_or_default()
                )?;
            }
        }
        OutputFormat::Json => {
            let views: Vec<MessageView<'_>> = messages.iter().map(MessageView::new).collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&views)?)?;
        }
    }

    if options.delete && !messages.is_empty() {
        let ids: HashMap<String, Option<&str>> = messages
            .iter()
            .enumerate()
            .map(|(index, message)| (index.to_string(), message.message_id()))
            .collect();
        let entries = messages
            .iter()
            .enumerate()
            .map(|(index, message)| message.delete_entry(index.to_string()))
            .collect();

        let output = queue
            .delete_messages(DeleteMessageBatchRequest::new(entries))
            .await?;
        if !output.all_succeeded() {
            let failed: Vec<String> = output
                .failed
                .iter()
                .map(|failure| {
                    format!(
                        "{} ({})",
                        ids.get(&failure.id).copied().flatten().unwrap_or(&failure.id),
                        failure.code
                    )
                })
                .collect();
            return Err(CliError::CommandFailed {
                message: format!("failed to delete messages: {}", failed.join(", ")),
            });
        }
        info!(count = output.successful.len(), "Deleted messages");
    }

    Ok(())
}

async fn execute_set_attribute_command<W: Write>(
    name: &str,
    value: &str,
    format: OutputFormat,
    queue: &Queue,
    out: &mut W,
) -> Result<(), CliError> {
    if name.is_empty() {
        return Err(CliError::InvalidArgument {
            arg: "name".to_string(),
            message: "attribute name cannot be empty".to_string(),
        });
    }

    info!(queue_url = %queue.url(), name = %name, "Setting queue attribute");
    queue
        .set_attributes(SetQueueAttributesRequest::new().with_attribute(name, value))
        .await?;

    match format {
        OutputFormat::Text => writeln!(out, "{} set to {}", name, value)?,
        OutputFormat::Json => {
            let mut document = BTreeMap::new();
            document.insert(name, value);
            writeln!(out, "{}", serde_json::to_string_pretty(&document)?)?;
        }
    }

    Ok(())
}
