//! Room Booking: management CLI
//!
//! Runs the server and the offline maintenance tasks that are meant to be
//! scheduled (cron, systemd timers) or run once during setup.
//!
//! ```sh
//! # Run the REST API with default config (~/.config/room-booking/config.toml)
//! booking-manage serve
//!
//! # Email owners of approved bookings starting in ~24h
//! booking-manage send-booking-reminders --hours 24
//!
//! # See what would be sent without sending anything
//! booking-manage send-booking-reminders --dry-run
//!
//! # Fresh signing key for the .env file
//! booking-manage generate-secret-key
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use room_booking::application::{
    format_datetime, ReminderJob, ReminderOptions, ReminderOutcome, ReminderReport,
};
use room_booking::config::AppConfig;
use room_booking::domain::MAX_REMINDER_HOURS;
use room_booking::infrastructure::crypto::secret_key::generate_secret_key;
use room_booking::server::{
    build_mailer, connect_database, init_tracing, ServerHandle, ServerOptions,
};
use room_booking::SeaOrmRepositoryProvider;

/// Room booking service management commands.
#[derive(Parser, Debug)]
#[command(
    name = "booking-manage",
    version,
    about = "Room booking service: server and maintenance commands",
    long_about = "Runs the room booking REST API and its scheduled maintenance \
                  tasks.\n\nDefault config: ~/.config/room-booking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, env = "BOOKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST API server.
    Serve {
        /// Override the listen port.
        #[arg(long)]
        port: Option<u16>,

        /// Skip database migrations on startup.
        #[arg(long)]
        no_migrate: bool,

        /// Skip creating the default admin user.
        #[arg(long)]
        no_admin: bool,
    },

    /// Send reminder emails for upcoming approved bookings.
    SendBookingReminders {
        /// Hours before booking start to send the reminder, from 0 to 87600
        /// (default: 24, or `reminders.default_hours`).
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_REMINDER_HOURS))]
        hours: Option<i64>,

        /// Run without actually sending emails (for testing).
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a new random SECRET_KEY for the .env file.
    GenerateSecretKey,

    /// Validate the configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenerateSecretKey = cli.command {
        print!("{}", secret_key_banner(&generate_secret_key()));
        return Ok(());
    }

    dotenvy::dotenv().ok();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(room_booking::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::from_env(), Some(e)),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    match cli.command {
        Command::Serve {
            port,
            no_migrate,
            no_admin,
        } => {
            if let Some(port) = port {
                info!("CLI override: port = {}", port);
                config.server.port = port;
            }
            serve(config, !no_migrate, !no_admin).await
        }
        Command::SendBookingReminders { hours, dry_run } => {
            let options = ReminderOptions {
                hours: hours.unwrap_or(config.reminders.default_hours),
                dry_run,
            };
            send_booking_reminders(&config, options).await
        }
        Command::CheckConfig => check_config(&config, &config_path),
        Command::GenerateSecretKey => Ok(()),
    }
}

async fn serve(
    config: AppConfig,
    auto_migrate: bool,
    create_default_admin: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate,
        create_default_admin,
    })
    .await?;

    handle.install_signal_handler();
    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}

async fn send_booking_reminders(
    config: &AppConfig,
    options: ReminderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = connect_database(config, false).await?;
    let mailer = build_mailer(config)?;
    let repos = std::sync::Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    let report = ReminderJob::new(repos, mailer)
        .run(chrono::Utc::now(), options)
        .await?;

    for line in render_report(&report) {
        println!("{}", line);
    }

    db.close().await?;
    Ok(())
}

fn check_config(
    config: &AppConfig,
    config_path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    println!("✅ Configuration is valid");
    println!("   Config file : {}", config_path.display());
    println!("   Address     : {}", config.server.address());
    println!("   Database    : {}", config.database.url);
    println!("   Log level   : {}", config.logging.level);
    println!("   Mail backend: {:?}", config.email.backend);
    println!("   Reminders   : {}h ahead", config.reminders.default_hours);
    if config.uses_default_secret() {
        println!("⚠️  Using the built-in development secret key; set SECRET_KEY");
    }
    Ok(())
}

/// Console report for one reminder pass: status lines, then the summary.
fn render_report(report: &ReminderReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Found {} booking(s) to send reminders for",
        report.found()
    )];
    if report.dry_run {
        lines.push("DRY RUN MODE - No emails will be sent".to_string());
    }

    for entry in &report.entries {
        let start = format_datetime(entry.start_datetime);
        lines.push(match &entry.outcome {
            ReminderOutcome::Sent => format!(
                "✓ Reminder sent for booking {} (User: {}, Start: {})",
                entry.booking_id, entry.email, start
            ),
            ReminderOutcome::DryRun => format!(
                "[DRY RUN] Would send reminder for booking {} (User: {}, Start: {})",
                entry.booking_id, entry.email, start
            ),
            ReminderOutcome::Failed(reason) => format!(
                "✗ Failed to send reminder for booking {}: {}",
                entry.booking_id, reason
            ),
        });
    }

    lines.push(String::new());
    lines.push("=".repeat(50));
    if report.dry_run {
        lines.push(format!("DRY RUN: Would send {} reminder(s)", report.found()));
    } else {
        lines.push(format!("Successfully sent {} reminder(s)", report.sent()));
        if report.failed() > 0 {
            lines.push(format!("Failed to send {} reminder(s)", report.failed()));
        }
    }
    lines
}

fn secret_key_banner(key: &str) -> String {
    let rule = "=".repeat(60);
    format!(
        "\n{rule}\nGenerated SECRET_KEY:\n{rule}\n{key}\n{rule}\n\n\
         Add this to your .env file:\nSECRET_KEY={key}\n\n\
         ⚠️  Keep this key secret! Never commit it to git.\n\n"
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use room_booking::application::ReminderEntry;
    use room_booking::domain::ReminderWindow;

    use super::*;

    fn report(dry_run: bool, outcomes: Vec<ReminderOutcome>) -> ReminderReport {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 30, 0).unwrap();
        ReminderReport {
            window: ReminderWindow::new(now, 24).unwrap(),
            dry_run,
            entries: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| ReminderEntry {
                    booking_id: i as i32 + 1,
                    email: "ann@example.com".into(),
                    start_datetime: start,
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn reports_sent_and_failed() {
        let lines = render_report(&report(
            false,
            vec![
                ReminderOutcome::Sent,
                ReminderOutcome::Failed("connection refused".into()),
            ],
        ));

        assert_eq!(lines[0], "Found 2 booking(s) to send reminders for");
        assert_eq!(
            lines[1],
            "✓ Reminder sent for booking 1 (User: ann@example.com, Start: 2024-01-02 00:30:00+00:00)"
        );
        assert_eq!(
            lines[2],
            "✗ Failed to send reminder for booking 2: connection refused"
        );
        assert_eq!(lines[4], "=".repeat(50));
        assert_eq!(lines[5], "Successfully sent 1 reminder(s)");
        assert_eq!(lines[6], "Failed to send 1 reminder(s)");
    }

    #[test]
    fn dry_run_summary() {
        let lines = render_report(&report(true, vec![ReminderOutcome::DryRun]));

        assert_eq!(lines[1], "DRY RUN MODE - No emails will be sent");
        assert!(lines[2].starts_with("[DRY RUN] Would send reminder for booking 1"));
        assert_eq!(lines.last().unwrap(), "DRY RUN: Would send 1 reminder(s)");
    }

    #[test]
    fn no_failure_line_when_all_sent() {
        let lines = render_report(&report(false, vec![]));
        assert_eq!(lines[0], "Found 0 booking(s) to send reminders for");
        assert_eq!(lines.last().unwrap(), "Successfully sent 0 reminder(s)");
    }

    #[test]
    fn banner_contains_env_line() {
        let banner = secret_key_banner("abc");
        assert!(banner.contains("\nabc\n"));
        assert!(banner.contains("SECRET_KEY=abc\n"));
    }

    #[test]
    fn hours_above_ten_years_are_rejected() {
        let over = (MAX_REMINDER_HOURS + 1).to_string();
        let parsed = Cli::try_parse_from(["booking-manage", "send-booking-reminders", "--hours", &over]);
        assert!(parsed.is_err());

        let huge = i64::MAX.to_string();
        let parsed = Cli::try_parse_from(["booking-manage", "send-booking-reminders", "--hours", &huge]);
        assert!(parsed.is_err());

        let max = MAX_REMINDER_HOURS.to_string();
        let parsed =
            Cli::try_parse_from(["booking-manage", "send-booking-reminders", "--hours", &max])
                .unwrap();
        assert!(matches!(
            parsed.command,
            Command::SendBookingReminders { hours: Some(MAX_REMINDER_HOURS), .. }
        ));
    }

    #[test]
    fn hours_help_states_the_range() {
        use clap::CommandFactory;

        let cmd = Cli::command();
        let sub = cmd.find_subcommand("send-booking-reminders").unwrap();
        let hours = sub.get_arguments().find(|a| a.get_id() == "hours").unwrap();
        let help = hours.get_help().unwrap().to_string();
        assert!(help.contains("from 0 to 87600"));
    }

    #[test]
    fn hours_must_not_be_negative() {
        let parsed = Cli::try_parse_from(["booking-manage", "send-booking-reminders", "--hours", "-1"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["booking-manage", "send-booking-reminders", "--dry-run"])
            .unwrap();
        assert!(matches!(
            parsed.command,
            Command::SendBookingReminders {
                hours: None,
                dry_run: true
            }
        ));
    }
}
