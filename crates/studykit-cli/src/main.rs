//! studykit - agent CLI integration for research workflows
//!
//! ## Commands
//!
//! - `init`: store configuration, probe the tool and write command templates
//! - `validate`: initialize, then run a full tool validation
//! - `doctor`: report tool availability without touching templates
//! - `templates`: regenerate the command templates
//! - `exec`: run a command through the process executor
//! - `classify`: render an error message the way studykit reports failures

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use studykit_core::telemetry::level_for;
use studykit_core::{
    classify, init_tracing, user_friendly_message, AvailabilityCheck, CommandTemplateWriter,
    ConfigError, ErrorContext, ErrorDomain, IntegrationConfig, IntegrationError,
    IntegrationOrchestrator, IntegrationStatus, LogFormat, ToolValidator, ValidationOutcome,
};
use studykit_exec::{ExecError, ExecutionRequest, ProcessExecutor, DEFAULT_TIMEOUT_MS};
use tracing::info;

#[derive(Parser)]
#[command(name = "studykit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agent CLI integration for studykit research workflows", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and JSON command output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Configuration sources shared by the lifecycle commands.
#[derive(Args, Debug, Clone, Default)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(short, long, env = "STUDYKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Tool command or path (overrides cliPath)
    #[arg(long)]
    cli_path: Option<String>,

    /// Deadline for each tool invocation, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory for generated command templates
    #[arg(long)]
    template_path: Option<PathBuf>,
}

impl ConfigArgs {
    /// Defaults, then the file, then the environment, then flags.
    fn resolve(&self) -> Result<IntegrationConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => IntegrationConfig::from_file(path)?,
            None => IntegrationConfig::default(),
        };
        let mut config = base.apply_env()?;

        if let Some(cli_path) = &self.cli_path {
            config.cli_path = Some(cli_path.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(template_path) = &self.template_path {
            config.template_path = template_path.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the integration and generate command templates
    Init {
        #[command(flatten)]
        config: ConfigArgs,

        /// Skip the tool availability probe
        #[arg(long)]
        no_validate: bool,
    },

    /// Initialize, then validate the tool installation
    Validate {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Report tool availability, path and version
    Doctor {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Regenerate the command templates
    Templates {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Run a command through the process executor and print the result
    Exec {
        /// Deadline in milliseconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,

        /// Working directory for the command
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Command and arguments (after `--`)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Classify an error message and print the user-facing report
    Classify {
        /// Error domain: file-system, cli-execution, validation, configuration
        #[arg(long)]
        domain: ErrorDomain,

        /// Operation that failed
        #[arg(long, default_value = "unknown operation")]
        operation: String,

        /// Command line involved, if any
        #[arg(long)]
        command: Option<String>,

        /// Raw error message
        message: String,
    },
}

impl Commands {
    /// Operation name used when classifying a failure of this command.
    fn operation(&self) -> &'static str {
        match self {
            Commands::Init { .. } => "initialize",
            Commands::Validate { .. } => "validate",
            Commands::Doctor { .. } => "validate tool",
            Commands::Templates { .. } => "generate command templates",
            Commands::Exec { .. } => "execute command",
            Commands::Classify { .. } => "classify",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogFormat::from_json_flag(cli.json), level_for(cli.verbose));

    let operation = cli.command.operation();
    match run(cli.command, cli.json).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", render_failure(&err, operation));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, json: bool) -> Result<ExitCode> {
    match command {
        Commands::Init {
            config,
            no_validate,
        } => cmd_init(&config, no_validate, json).await,
        Commands::Validate { config } => cmd_validate(&config, json).await,
        Commands::Doctor { config } => cmd_doctor(&config, json).await,
        Commands::Templates { config } => cmd_templates(&config, json).await,
        Commands::Exec {
            timeout_ms,
            cwd,
            command,
        } => cmd_exec(command, timeout_ms, cwd).await,
        Commands::Classify {
            domain,
            operation,
            command,
            message,
        } => cmd_classify(domain, operation, command, &message, json),
    }
}

/// Initialize the integration
async fn cmd_init(args: &ConfigArgs, no_validate: bool, json: bool) -> Result<ExitCode> {
    let mut config = args.resolve()?;
    if !config.enabled {
        println!("Integration is disabled in the configuration; nothing to do.");
        return Ok(ExitCode::SUCCESS);
    }
    if no_validate {
        config.validation_enabled = false;
    }

    info!(template_path = %config.template_path.display(), "initializing integration");
    let mut orchestrator = IntegrationOrchestrator::for_config(&config);
    orchestrator.initialize(config).await?;

    let status = orchestrator.status();
    emit(&status, json, print_status)?;
    Ok(ExitCode::SUCCESS)
}

/// Initialize and run a full validation
async fn cmd_validate(args: &ConfigArgs, json: bool) -> Result<ExitCode> {
    let config = args.resolve()?;
    if !config.enabled {
        println!("Integration is disabled in the configuration; nothing to validate.");
        return Ok(ExitCode::SUCCESS);
    }
    let fallback = config.fallback_to_custom;

    let mut orchestrator = IntegrationOrchestrator::for_config(&config);
    orchestrator.initialize(config).await?;
    let outcome = orchestrator.validate().await?;

    emit(&outcome, json, print_outcome)?;
    if !outcome.is_success() && fallback && !json {
        println!("Falling back to the generated custom commands.");
    }
    Ok(exit_for(&outcome))
}

/// Probe the tool directly
async fn cmd_doctor(args: &ConfigArgs, json: bool) -> Result<ExitCode> {
    let config = args.resolve()?;
    let validator = ToolValidator::from_config(&config);
    let outcome = validator.validate_tool().await?;

    if !json {
        println!("studykit doctor");
        println!("===============");
        println!("Tool:    {}", validator.tool());
        println!("Timeout: {} ms", config.timeout_ms);
        println!();
    }
    emit(&outcome, json, print_outcome)?;
    Ok(exit_for(&outcome))
}

/// Regenerate command templates without probing the tool
async fn cmd_templates(args: &ConfigArgs, json: bool) -> Result<ExitCode> {
    let mut config = args.resolve()?;
    config.validation_enabled = false;
    let template_path = config.template_path.clone();

    let mut orchestrator = IntegrationOrchestrator::for_config(&config);
    orchestrator.initialize(config).await?;

    let written = CommandTemplateWriter::planned_paths(&template_path);
    if json {
        println!("{}", serde_json::to_string_pretty(&written)?);
    } else {
        println!("Wrote {} command templates:", written.len());
        for path in &written {
            println!("  {}", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Run an arbitrary command through the executor
async fn cmd_exec(command: Vec<String>, timeout_ms: u64, cwd: Option<PathBuf>) -> Result<ExitCode> {
    let mut parts = command.into_iter();
    let program = parts.next().context("No command given")?;
    let mut request = ExecutionRequest::new(program)
        .args(parts)
        .timeout_ms(timeout_ms);
    if let Some(cwd) = cwd {
        request = request.current_dir(cwd);
    }

    let result = ProcessExecutor::new().execute(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Render a classified error
fn cmd_classify(
    domain: ErrorDomain,
    operation: String,
    command: Option<String>,
    message: &str,
    json: bool,
) -> Result<ExitCode> {
    let mut context = ErrorContext::new(operation);
    if let Some(command) = command {
        context = context.with_command(command);
    }
    let classified = classify(&message, domain, context);

    if json {
        println!("{}", serde_json::to_string_pretty(&classified)?);
    } else {
        println!("{}", user_friendly_message(&classified));
    }
    Ok(ExitCode::SUCCESS)
}

fn emit<T: Serialize>(value: &T, json: bool, human: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

fn print_status(status: &IntegrationStatus) {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    println!("Status:              {}", status.status);
    println!("Tool available:      {}", yes_no(status.tool_available));
    println!("Templates generated: {}", yes_no(status.templates_generated));
    println!("Errors:              {}", status.error_count);
    if let Some(config) = &status.current_configuration {
        println!("Tool:                {}", config.tool_command());
        println!("Template path:       {}", config.template_path.display());
    }
}

fn print_outcome(outcome: &ValidationOutcome) {
    println!("Result:  {}", outcome.result);
    if let Some(path) = &outcome.tool_path {
        println!("Path:    {}", path);
    }
    if let Some(version) = &outcome.version {
        println!("Version: {}", version);
    }
    if let Some(message) = &outcome.message {
        println!("Message: {}", message);
    }
    if !outcome.suggestions.is_empty() {
        println!();
        println!("Suggestions:");
        for (i, suggestion) in outcome.suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, suggestion);
        }
    }
}

fn exit_for(outcome: &ValidationOutcome) -> ExitCode {
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Classify a command failure and render it for the terminal.
fn render_failure(err: &anyhow::Error, operation: &str) -> String {
    let classified = if let Some(integration) = err.downcast_ref::<IntegrationError>() {
        integration.classify(operation)
    } else if let Some(config) = err.downcast_ref::<ConfigError>() {
        classify(config, ErrorDomain::Configuration, ErrorContext::new(operation))
    } else if let Some(exec) = err.downcast_ref::<ExecError>() {
        let domain = match exec {
            ExecError::Wait { .. } => ErrorDomain::CliExecution,
            ExecError::EmptyCommand | ExecError::ZeroTimeout { .. } => ErrorDomain::Validation,
        };
        classify(exec, domain, ErrorContext::new(operation))
    } else {
        classify(
            &format!("{:#}", err),
            ErrorDomain::CliExecution,
            ErrorContext::new(operation),
        )
    };
    user_friendly_message(&classified)
}
