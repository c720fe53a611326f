//! staffdesk - session and leave tooling for the HR desk
//!
//! Wires the engines to a terminal:
//! - Configuration loading
//! - Store initialization
//! - Session monitor runtime (stdin as the activity source)
//! - Leave request form against a JSON file directory

mod console;
mod directory;
mod runtime;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use console::{ConsoleSignals, StdinActivitySource};
use directory::JsonFileDirectory;
use runtime::{RuntimeExit, SessionSupervisor};
use staffdesk_api::{LeaveKind, SessionEndReason};
use staffdesk_config::{load_config_or_default, Policy};
use staffdesk_core::{
    peek_session, FormStatus, LeaveRequestForm, SessionMonitor, SubmitDecision,
};
use staffdesk_host_api::LeaveDirectory;
use staffdesk_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use staffdesk_util::{
    data_dir_without_env, database_path, default_config_path,
    format_datetime_full, format_duration, parse_calendar_day, EmployeeId, SessionKey,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// staffdesk - inactivity-guarded sessions and leave requests
#[derive(Parser, Debug)]
#[command(name = "staffdesk")]
#[command(about = "Inactivity-guarded sessions and leave requests", long_about = None)]
struct Cli {
    /// Configuration file path (default: ~/.config/staffdesk/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set STAFFDESK_DATA_DIR env var)
    #[arg(short, long, env = "STAFFDESK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticated session lifecycle
    #[command(subcommand)]
    Session(SessionCommand),

    /// Vacation and permission requests
    #[command(subcommand)]
    Leave(LeaveCommand),

    /// Show recent audit events
    Audit {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Start a new session
    Login(ProfileArgs),
    /// Show the persisted session, if any
    Status(ProfileArgs),
    /// End the session and clear its persisted state
    Logout(ProfileArgs),
    /// Keep the session open; every line on stdin counts as activity
    Watch(ProfileArgs),
}

#[derive(Args, Debug)]
struct ProfileArgs {
    /// Session key the persisted state is stored under
    #[arg(short, long, default_value = "default")]
    profile: String,
}

#[derive(Subcommand, Debug)]
enum LeaveCommand {
    /// Show day count and conflicts without submitting
    Check(LeaveArgs),
    /// Submit the request if it is valid and conflict-free
    Submit {
        #[command(flatten)]
        leave: LeaveArgs,

        /// Permission hours (default: days * work_hours_per_day)
        #[arg(long)]
        hours: Option<u32>,

        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Args, Debug)]
struct LeaveArgs {
    /// JSON file holding vacation and permission records
    #[arg(long, env = "STAFFDESK_DIRECTORY")]
    directory: PathBuf,

    #[arg(long)]
    employee: i64,

    /// vacation or permission
    #[arg(long)]
    kind: LeaveKind,

    #[arg(long, value_parser = parse_day)]
    start: NaiveDate,

    #[arg(long, value_parser = parse_day)]
    end: NaiveDate,
}

fn parse_day(value: &str) -> Result<NaiveDate, String> {
    parse_calendar_day(value).map_err(|e| e.to_string())
}

/// Loaded configuration and opened store
struct App {
    policy: Policy,
    store: Arc<dyn Store>,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let policy = load_config_or_default(&cli.config)
            .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

        debug!(
            config_path = %cli.config.display(),
            timeout_ms = policy.session.timeout.as_millis() as u64,
            "Configuration loaded"
        );

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| policy.service.data_dir.clone())
            .unwrap_or_else(data_dir_without_env);

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = database_path(&data_dir);
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        debug!(db_path = %db_path.display(), "Store initialized");

        Ok(Self { policy, store })
    }

    async fn run(self, command: Command) -> Result<ExitCode> {
        match command {
            Command::Session(cmd) => self.session(cmd).await,
            Command::Leave(cmd) => self.leave(cmd).await,
            Command::Audit { limit } => self.audit(limit),
        }
    }

    fn restore(&self, profile: &str) -> Option<SessionMonitor> {
        SessionMonitor::restore(
            SessionKey::new(profile),
            self.policy.session,
            self.store.clone(),
            staffdesk_util::now(),
        )
    }

    fn login(&self, profile: &str) -> SessionMonitor {
        SessionMonitor::login(
            SessionKey::new(profile),
            self.policy.session,
            self.store.clone(),
            staffdesk_util::now(),
        )
    }

    async fn session(self, command: SessionCommand) -> Result<ExitCode> {
        match command {
            SessionCommand::Login(args) => {
                let monitor = self.login(&args.profile);
                println!(
                    "Session started for '{}' (expires after {} of inactivity)",
                    args.profile,
                    format_duration(self.policy.session.timeout)
                );
                debug!(session_id = %monitor.session_id(), "Login complete");
                Ok(ExitCode::SUCCESS)
            }

            SessionCommand::Status(args) => {
                let key = SessionKey::new(&args.profile);
                let now = staffdesk_util::now();
                let Some(peek) = peek_session(&self.store, &key, &self.policy.session, now) else {
                    println!("No active session for '{}'", args.profile);
                    return Ok(ExitCode::from(1));
                };

                println!("Session:       {}", key.as_str());
                println!("State:         {}", peek.state);
                println!("Last activity: {}", format_datetime_full(&peek.last_activity_at));
                println!("Expires in:    {}", format_duration(peek.time_remaining));
                Ok(ExitCode::SUCCESS)
            }

            SessionCommand::Logout(args) => match self.restore(&args.profile) {
                Some(mut monitor) => {
                    monitor.end(SessionEndReason::Logout);
                    println!("Logged out of '{}'", args.profile);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    println!("No active session for '{}'", args.profile);
                    Ok(ExitCode::SUCCESS)
                }
            },

            SessionCommand::Watch(args) => self.watch(&args.profile).await,
        }
    }

    async fn watch(self, profile: &str) -> Result<ExitCode> {
        let monitor = match self.restore(profile) {
            Some(monitor) => {
                println!("Resumed session for '{}'", profile);
                monitor
            }
            None => {
                println!("Started session for '{}'", profile);
                self.login(profile)
            }
        };
        println!("Press Enter to register activity, Ctrl-C to detach.");

        let mut supervisor = SessionSupervisor::new();
        {
            let runtime = supervisor
                .mount(
                    monitor,
                    Arc::new(StdinActivitySource::new()),
                    Arc::new(ConsoleSignals),
                )
                .await
                .context("Failed to start session runtime")?;

            tokio::select! {
                _ = runtime.wait() => {}
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    info!("Interrupted, detaching from session");
                }
            }
        }

        match supervisor.unmount().await.unwrap_or(RuntimeExit::Shutdown) {
            RuntimeExit::Expired => {
                println!("Session expired.");
                Ok(ExitCode::from(1))
            }
            RuntimeExit::LoggedOut => Ok(ExitCode::SUCCESS),
            RuntimeExit::Shutdown => {
                println!("Detached; the session stays valid until it times out.");
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    async fn leave(self, command: LeaveCommand) -> Result<ExitCode> {
        match command {
            LeaveCommand::Check(args) => {
                let directory = JsonFileDirectory::new(&args.directory);
                let employee_id = EmployeeId::new(args.employee);

                let snapshot = directory
                    .list_leave_periods(employee_id)
                    .await
                    .with_context(|| format!("Failed to read {:?}", args.directory))?;

                let mut form = LeaveRequestForm::new(employee_id, args.kind, self.policy.leave);
                form.apply_snapshot(Ok(snapshot));
                form.set_start_date(Some(args.start));
                let status = form.set_end_date(Some(args.end));

                Ok(print_status(status))
            }

            LeaveCommand::Submit { leave: args, hours, reason } => {
                let directory = JsonFileDirectory::new(&args.directory);
                let employee_id = EmployeeId::new(args.employee);

                let mut form = LeaveRequestForm::new(employee_id, args.kind, self.policy.leave);
                form.refresh(&directory).await;
                form.set_start_date(Some(args.start));
                form.set_end_date(Some(args.end));
                form.set_hours(hours);
                form.set_reason(reason);

                let decision = form
                    .submit(&directory)
                    .await
                    .with_context(|| format!("Failed to submit to {:?}", args.directory))?;

                Ok(self.report_submission(args.kind, employee_id, decision))
            }
        }
    }

    fn report_submission(
        &self,
        kind: LeaveKind,
        employee_id: EmployeeId,
        decision: SubmitDecision,
    ) -> ExitCode {
        match decision {
            SubmitDecision::Submitted(created) => {
                let _ = self.store.append_audit(AuditEvent::new(AuditEventType::LeaveSubmitted {
                    leave_id: created.id,
                    kind: created.kind,
                    employee_id: created.employee_id,
                    start_date: created.start_date,
                    end_date: created.end_date,
                    day_count: created.day_count,
                }));

                println!(
                    "Submitted {} #{}: {} to {} ({} day(s))",
                    created.kind, created.id, created.start_date, created.end_date, created.day_count
                );
                ExitCode::SUCCESS
            }
            SubmitDecision::Blocked { reasons } => {
                let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();

                let _ = self.store.append_audit(AuditEvent::new(AuditEventType::LeaveBlocked {
                    kind,
                    employee_id,
                    reasons: reasons.clone(),
                }));

                eprintln!("Request not submitted:");
                for reason in &reasons {
                    eprintln!("  - {}", reason);
                }
                ExitCode::from(1)
            }
        }
    }

    fn audit(&self, limit: usize) -> Result<ExitCode> {
        let events = self
            .store
            .get_recent_audits(limit)
            .context("Failed to read audit log")?;

        for event in events.iter().rev() {
            let detail = serde_json::to_string(&event.event)?;
            println!("{}  {}", format_datetime_full(&event.timestamp), detail);
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn print_status(status: &FormStatus) -> ExitCode {
    match status {
        FormStatus::Ready { day_count } => {
            println!("{} day(s), no conflict", day_count);
            ExitCode::SUCCESS
        }
        FormStatus::Conflict { day_count, message, .. } => {
            println!("{} day(s)", day_count);
            println!("Conflict: {}", message);
            ExitCode::from(1)
        }
        FormStatus::InvalidRange(e) | FormStatus::Incomplete(e) => {
            println!("Invalid: {}", e);
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "staffdesk starting");

    if staffdesk_util::is_mock_time_active() {
        warn!(now = %format_datetime_full(&staffdesk_util::now()), "Mock time active");
    }

    let app = App::new(&cli)?;
    app.run(cli.command).await
}
