//! SleepGuard CLI - Command-line interface for SleepGuard
//!
//! Commands:
//! - assess: Run one reading through the full pipeline
//! - run: Process streaming NDJSON readings from stdin
//! - estimate: Compute the risk bundle for a reading
//! - decide: Decide on an action for a risk bundle
//! - rules: Show the rule table, or evaluate it against a bundle
//! - validate: Validate reading payloads
//! - schema: Print input/output schema information
//! - doctor: Diagnose configuration and credentials

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sleepguard::config::{Config, FallbackMode};
use sleepguard::reasoning::{api_key_from_env, GeminiClient, API_KEY_VARS};
use sleepguard::rules::RuleTable;
use sleepguard::schema::{ReadingAdapter, ReadingPayload};
use sleepguard::types::{Action, RiskBundle, Urgency};
use sleepguard::{materialize, ComputeError, SleepDebtLedger, SleepGuard};
use sleepguard::{PRODUCER_NAME, SLEEPGUARD_VERSION};

/// SleepGuard - Sleep-disruption risk estimation and intervention arbitration
#[derive(Parser)]
#[command(name = "sleepguard")]
#[command(version = SLEEPGUARD_VERSION)]
#[command(about = "Turn phone sensor readings into one sleep intervention", long_about = None)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reading through the full pipeline
    Assess {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Never call the reasoning service
        #[arg(long)]
        offline: bool,

        /// Emit the risk bundle alongside the action
        #[arg(long)]
        with_risk: bool,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Process streaming NDJSON readings from stdin (one action per line)
    Run {
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Never call the reasoning service
        #[arg(long)]
        offline: bool,

        /// Carry sleep debt across readings, starting from this many hours
        #[arg(long)]
        carry_debt: Option<f64>,

        /// Emit the risk bundle alongside the action
        #[arg(long)]
        with_risk: bool,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Compute the risk bundle for a reading
    Estimate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Decide on an action for a risk bundle
    Decide {
        /// Risk bundle file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Never call the reasoning service
        #[arg(long)]
        offline: bool,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Show the rule table, or evaluate it against a risk bundle
    Rules {
        /// Risk bundle file path (use - for stdin); omit to list the rules
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate reading payloads
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },

    /// Diagnose configuration and credentials
    Doctor {
        /// Check this config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one reading per line)
    Ndjson,
    /// JSON array of readings
    Json,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (sensor reading)
    Input,
    /// Output schema (action record)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands) -> Result<(), SleepGuardCliError> {
    match command {
        Commands::Assess {
            input,
            output,
            config,
            offline,
            with_risk,
            pretty,
        } => cmd_assess(&input, &output, config.as_deref(), offline, with_risk, pretty),

        Commands::Run {
            config,
            offline,
            carry_debt,
            with_risk,
            flush,
        } => cmd_run(config.as_deref(), offline, carry_debt, with_risk, flush),

        Commands::Estimate {
            input,
            config,
            pretty,
        } => cmd_estimate(&input, config.as_deref(), pretty),

        Commands::Decide {
            input,
            config,
            offline,
            pretty,
        } => cmd_decide(&input, config.as_deref(), offline, pretty),

        Commands::Rules {
            input,
            config,
            pretty,
        } => cmd_rules(input.as_deref(), config.as_deref(), pretty),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_assess(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    offline: bool,
    with_risk: bool,
    pretty: bool,
) -> Result<(), SleepGuardCliError> {
    let config = load_config(config)?;
    let guard = build_guard(&config, offline)?;

    let input_data = read_input(input)?;
    let assessment = guard.process_json(&input_data)?;

    let output_data = if with_risk {
        to_json(&assessment, pretty)?
    } else {
        to_json(&assessment.action, pretty)?
    };
    write_output(output, &output_data)
}

fn cmd_run(
    config: Option<&Path>,
    offline: bool,
    carry_debt: Option<f64>,
    with_risk: bool,
    flush: bool,
) -> Result<(), SleepGuardCliError> {
    let config = load_config(config)?;
    let guard = build_guard(&config, offline)?;
    let mut ledger = carry_debt.map(SleepDebtLedger::new);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let payload: ReadingPayload = serde_json::from_str(trimmed).map_err(|e| {
            SleepGuardCliError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;

        let mut reading = ReadingAdapter::to_reading(&payload)?;
        if let Some(ledger) = &ledger {
            ledger.apply_to(&mut reading);
        }

        let assessment = guard.process(&reading)?;

        if let Some(ledger) = ledger.as_mut() {
            let total = ledger.record(&assessment.action);
            debug!(sleep_debt_hours = total, "Sleep debt carried forward");
        }

        let record = if with_risk {
            serde_json::to_string(&assessment)?
        } else {
            serde_json::to_string(&assessment.action)?
        };

        writeln!(stdout, "{}", record)?;
        if flush {
            stdout.flush()?;
        }
    }

    stdout.flush()?;

    let stats = guard.stats();
    info!(
        decisions = stats.decisions,
        model_decisions = stats.model_decisions,
        fallback_decisions = stats.fallback_decisions,
        final_sleep_debt_hours = ledger.map(|l| l.sleep_debt_hours()),
        "Stream finished"
    );

    Ok(())
}

fn cmd_estimate(input: &Path, config: Option<&Path>, pretty: bool) -> Result<(), SleepGuardCliError> {
    let config = load_config(config)?;
    let guard = SleepGuard::offline(&config);

    let input_data = read_input(input)?;
    let reading = ReadingAdapter::parse(&input_data)?;
    let bundle = guard.estimator().estimate(&reading)?;

    println!("{}", to_json(&bundle, pretty)?);
    Ok(())
}

fn cmd_decide(
    input: &Path,
    config: Option<&Path>,
    offline: bool,
    pretty: bool,
) -> Result<(), SleepGuardCliError> {
    let config = load_config(config)?;
    let guard = build_guard(&config, offline)?;

    let bundle = read_bundle(input)?;
    let record = guard.decide_bundle(&bundle);

    println!("{}", to_json(&record, pretty)?);
    Ok(())
}

fn cmd_rules(
    input: Option<&Path>,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), SleepGuardCliError> {
    let config = load_config(config)?;
    let table = RuleTable::new(config.fallback.rules);

    let Some(input) = input else {
        println!("{}", to_json(&table.rules(), pretty)?);
        return Ok(());
    };

    let bundle = read_bundle(input)?;
    let matched = table
        .rules()
        .iter()
        .find(|rule| rule.matches(&bundle))
        .map(|rule| rule.name.clone());
    let action = materialize::apply(table.evaluate(&bundle), &bundle);

    let report = RuleReport { matched, action };
    println!("{}", to_json(&report, pretty)?);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), SleepGuardCliError> {
    let input_data = read_input(input)?;

    let payloads = match input_format {
        InputFormat::Ndjson => ReadingAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => ReadingAdapter::parse_array(&input_data)?,
    };

    if payloads.is_empty() {
        return Err(SleepGuardCliError::NoReadings);
    }

    let issues = ReadingAdapter::validate_payloads(&payloads);

    let report = ValidationReport {
        total_readings: payloads.len(),
        valid_readings: payloads.len() - issues.len(),
        invalid_readings: issues.len(),
        errors: issues
            .into_iter()
            .map(|issue| ValidationErrorDetail {
                index: issue.index,
                timestamp: issue.timestamp,
                error: issue.error,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total readings:   {}", report.total_readings);
        println!("Valid readings:   {}", report.valid_readings);
        println!("Invalid readings: {}", report.invalid_readings);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Reading at {} (index {}): {}",
                    err.timestamp.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_readings > 0 {
        Err(SleepGuardCliError::ValidationFailed(report.invalid_readings))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), SleepGuardCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("SleepGuard version {}", SLEEPGUARD_VERSION),
    });

    // Config file, falling back to defaults when absent or broken
    let loaded = match config {
        Some(path) if !path.exists() => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Config file {} does not exist", path.display()),
            });
            Config::default()
        }
        Some(path) => match Config::from_file(path) {
            Ok(c) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Config file {} is valid", path.display()),
                });
                c
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                });
                Config::default()
            }
        },
        None => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: "Using built-in defaults".to_string(),
            });
            Config::default()
        }
    };

    let fallback_message = match loaded.fallback.mode {
        FallbackMode::RuleTable => {
            format!("Rule table with {} rules", loaded.fallback.rules.len())
        }
        FallbackMode::SafeDefault => "Safe default (WARN)".to_string(),
    };
    checks.push(DoctorCheck {
        name: "fallback".to_string(),
        status: CheckStatus::Ok,
        message: fallback_message,
    });

    match GeminiClient::new(&loaded.arbiter, None) {
        Ok(client) => checks.push(DoctorCheck {
            name: "endpoint".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} ({} attempts, {} ms timeout)",
                client.url(),
                loaded.arbiter.max_attempts,
                loaded.arbiter.timeout_ms
            ),
        }),
        Err(e) => checks.push(DoctorCheck {
            name: "endpoint".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    let credentials = if api_key_from_env().is_some() {
        DoctorCheck {
            name: "credentials".to_string(),
            status: CheckStatus::Ok,
            message: "API key found".to_string(),
        }
    } else {
        DoctorCheck {
            name: "credentials".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "No API key in {}; decisions will come from the fallback",
                API_KEY_VARS.join(" or ")
            ),
        }
    };
    checks.push(credentials);

    // Check stdin is available (for streaming mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: SLEEPGUARD_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("SleepGuard Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SleepGuardCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), SleepGuardCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: sensor reading");
                println!();
                println!("- timestamp: ISO-8601 instant (required)");
                println!("- alarm_time: ISO-8601 instant of the next alarm");
                println!("- caffeine_log: [{{ mg, time, type }}]");
                println!("- screen_total_minutes_last_2hr: minutes (>= 0)");
                println!("- brightness_level: 0-1");
                println!("- noise_db_last_5min: dB");
                println!("- sleep_debt_hours: hours (negative means surplus)");
                println!("- sleep_goal_hours: hours (default 8)");
                println!("- recent_actions: actions issued on earlier requests");
                println!();
                println!("Missing optional fields default to neutral values.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: action record");
                println!();
                println!("- action: {}", join_names(Action::ALL.iter().map(Action::as_str)));
                println!("- urgency: {}", join_names(Urgency::ALL.iter().map(Urgency::as_str)));
                println!("- value: string, number, boolean or null");
                println!("- notification_message: non-empty string");
                println!("- confidence: 0-1");
                println!("- reasoning_summary: string");
                println!("- source: MODEL | RULE_FALLBACK");
            }
        }
    }

    Ok(())
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<Config, SleepGuardCliError> {
    match path {
        Some(path) => Ok(Config::from_file(path)?),
        None => Ok(Config::default()),
    }
}

fn build_guard(config: &Config, offline: bool) -> Result<SleepGuard, SleepGuardCliError> {
    if offline {
        Ok(SleepGuard::offline(config))
    } else {
        Ok(SleepGuard::from_config(config)?)
    }
}

fn read_input(input: &Path) -> Result<String, SleepGuardCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_bundle(input: &Path) -> Result<RiskBundle, SleepGuardCliError> {
    let input_data = read_input(input)?;
    Ok(serde_json::from_str(&input_data)?)
}

fn write_output(output: &Path, data: &str) -> Result<(), SleepGuardCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(
    value: &T,
    pretty: bool,
) -> Result<String, SleepGuardCliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(" | ")
}

fn get_input_json_schema() -> String {
    let actions: Vec<&str> = Action::ALL.iter().map(Action::as_str).collect();
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "sleepguard.reading",
        "description": "Phone sensor reading for one request",
        "type": "object",
        "required": ["timestamp"],
        "properties": {
            "timestamp": { "type": "string", "format": "date-time" },
            "alarm_time": { "type": "string", "format": "date-time" },
            "caffeine_log": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["mg", "time"],
                    "properties": {
                        "mg": { "type": "number", "exclusiveMinimum": 0 },
                        "time": { "type": "string", "format": "date-time" },
                        "type": { "type": "string" }
                    }
                }
            },
            "screen_total_minutes_last_2hr": { "type": "number", "minimum": 0 },
            "brightness_level": { "type": "number", "minimum": 0, "maximum": 1 },
            "noise_db_last_5min": { "type": "number" },
            "sleep_debt_hours": { "type": "number" },
            "sleep_goal_hours": { "type": "number", "exclusiveMinimum": 0 },
            "recent_actions": {
                "type": "array",
                "items": { "type": "string", "enum": actions }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let actions: Vec<&str> = Action::ALL.iter().map(Action::as_str).collect();
    let urgencies: Vec<&str> = Urgency::ALL.iter().map(Urgency::as_str).collect();
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "sleepguard.action_record",
        "description": "Single recommended intervention",
        "type": "object",
        "required": ["action", "urgency", "value", "notification_message", "confidence", "reasoning_summary", "source"],
        "properties": {
            "action": { "type": "string", "enum": actions },
            "urgency": { "type": "string", "enum": urgencies },
            "value": { "type": ["string", "number", "boolean", "null"] },
            "notification_message": { "type": "string", "minLength": 1 },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
            "reasoning_summary": { "type": "string" },
            "source": { "type": "string", "enum": ["MODEL", "RULE_FALLBACK"] }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum SleepGuardCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoReadings,
    ValidationFailed(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for SleepGuardCliError {
    fn from(e: io::Error) -> Self {
        SleepGuardCliError::Io(e)
    }
}

impl From<ComputeError> for SleepGuardCliError {
    fn from(e: ComputeError) -> Self {
        SleepGuardCliError::Compute(e)
    }
}

impl From<serde_json::Error> for SleepGuardCliError {
    fn from(e: serde_json::Error) -> Self {
        SleepGuardCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SleepGuardCliError> for CliError {
    fn from(e: SleepGuardCliError) -> Self {
        match e {
            SleepGuardCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SleepGuardCliError::Compute(ComputeError::ConfigError(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'sleepguard doctor --config <file>' for details".to_string()),
            },
            SleepGuardCliError::Compute(e @ ComputeError::Validation(_)) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'sleepguard validate' for details".to_string()),
            },
            SleepGuardCliError::Compute(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches 'sleepguard schema input'".to_string()),
            },
            SleepGuardCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SleepGuardCliError::NoReadings => CliError {
                code: "NO_READINGS".to_string(),
                message: "No readings found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            SleepGuardCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} readings failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            SleepGuardCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            SleepGuardCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct RuleReport {
    matched: Option<String>,
    action: sleepguard::ActionRecord,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_readings: usize,
    valid_readings: usize,
    invalid_readings: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    timestamp: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
