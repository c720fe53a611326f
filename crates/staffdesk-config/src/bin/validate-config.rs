//! Config validation CLI tool
//!
//! Validates a staffdesk configuration file and reports any errors.

use staffdesk_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a staffdesk configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match staffdesk_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", staffdesk_config::CURRENT_CONFIG_VERSION);
            println!("  Session timeout: {}", format_duration(policy.session.timeout));
            println!(
                "  Warning window: {}",
                format_duration(policy.session.warning_window)
            );
            println!(
                "  Poll interval: {}",
                format_duration(policy.session.poll_interval)
            );
            println!(
                "  Expiry grace: {}ms",
                policy.session.expiry_grace.as_millis()
            );
            println!("  Work hours per day: {}", policy.leave.work_hours_per_day);
            if let Some(data_dir) = &policy.service.data_dir {
                println!("  Data dir: {}", data_dir.display());
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                staffdesk_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                staffdesk_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                staffdesk_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                staffdesk_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        staffdesk_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
