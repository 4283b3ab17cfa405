use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    http_transport, load_file, ClientSettings, CredentialGate, NoticeBoard, SubmitOutcome,
    UploadController,
};
use shared::range::{parse_measurement, ReferenceRange};
use tracing_subscriber::EnvFilter;

mod render;
mod shell;

#[derive(Parser, Debug)]
#[command(name = "healthify", about = "Upload a health report and review flagged lab values")]
struct Cli {
    /// Settings file; defaults to ./healthify.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    upload_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a single value against a reference range.
    Classify {
        #[arg(long)]
        value: String,
        #[arg(long)]
        range: String,
    },
    /// Sign in, upload one report and print the extracted parameters.
    Upload {
        file: PathBuf,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Print the detail view of every row after the table.
        #[arg(long)]
        details: bool,
    },
    /// Line-driven session: sign in, pick or drop files, submit and inspect results.
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), cli.upload_url.as_deref())?;

    match cli.command {
        Command::Classify { value, range } => {
            println!("{}", classify(&value, &range));
            Ok(())
        }
        Command::Upload {
            file,
            username,
            password,
            details,
        } => upload(&settings, &file, &username, &password, details).await,
        Command::Shell => shell::run(&settings).await,
    }
}

fn load_settings(config: Option<&Path>, upload_url: Option<&str>) -> Result<ClientSettings> {
    let settings = ClientSettings::load(config).context("failed to load settings")?;
    with_upload_url(settings, upload_url)
}

fn with_upload_url(
    mut settings: ClientSettings,
    upload_url: Option<&str>,
) -> Result<ClientSettings> {
    if let Some(url) = upload_url {
        settings.upload_url = url.to_string();
        settings.validate()?;
    }
    tracing::debug!(upload_url = %settings.upload_url, "settings loaded");
    Ok(settings)
}

fn classify(value: &str, range: &str) -> String {
    let verdict = if shared::is_abnormal(value, range) {
        "Needs Attention"
    } else {
        "Normal"
    };
    let reason = match (parse_measurement(value), ReferenceRange::parse(range)) {
        (None, _) => "value is not numeric; not flagged".to_string(),
        (Some(_), ReferenceRange::Unrecognized) => "range not recognized; not flagged".to_string(),
        (Some(_), ReferenceRange::Interval { lo, hi }) => format!("normal within {lo} to {hi}"),
        (Some(_), ReferenceRange::UpperBound { threshold }) => {
            format!("normal below {threshold}")
        }
        (Some(_), ReferenceRange::LowerBound { threshold }) => {
            format!("normal above {threshold}")
        }
    };
    format!("{verdict} ({reason})")
}

async fn upload(
    settings: &ClientSettings,
    path: &Path,
    username: &str,
    password: &str,
    details: bool,
) -> Result<()> {
    let notices = NoticeBoard::new();
    let gate = CredentialGate::new(
        settings.username.clone(),
        settings.password.clone(),
        notices.clone(),
    )
    .with_notice_delay(settings.login_notice_delay);
    if !gate.attempt(username, password) {
        if let Some(notice) = notices.current() {
            eprintln!("{}", render::notice_line(&notice));
        }
        bail!("sign-in failed");
    }

    let controller = UploadController::with_notice_delay(
        http_transport(settings)?,
        notices.clone(),
        settings.upload_notice_delay,
    );
    controller.select_file(load_file(path).await?)?;
    println!(
        "{}",
        render::status_line(&controller.state(), controller.drag_active())
    );

    let outcome = controller.submit().await;
    if let Some(notice) = notices.current() {
        println!("{}", render::notice_line(&notice));
    }

    match outcome {
        SubmitOutcome::Succeeded { .. } => {
            let view = controller.result_view();
            if let Some(rendered) = render::result_view(&view) {
                println!("{rendered}");
            }
            if details {
                for row in view.rows() {
                    println!("\n{}", row.details());
                }
            }
            Ok(())
        }
        SubmitOutcome::Failed(err) => Err(err.into()),
        SubmitOutcome::NothingSelected | SubmitOutcome::AlreadyInFlight => {
            bail!("nothing was submitted")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_explains_verdict() {
        assert_eq!(
            classify("120", "70-110"),
            "Needs Attention (normal within 70 to 110)"
        );
        assert_eq!(classify("5", "< 10"), "Normal (normal below 10)");
        assert_eq!(classify("2", "> 3"), "Needs Attention (normal above 3)");
        assert_eq!(
            classify("120", "N/A"),
            "Normal (range not recognized; not flagged)"
        );
        assert_eq!(
            classify("high", "70-110"),
            "Normal (value is not numeric; not flagged)"
        );
    }

    #[test]
    fn cli_parses_upload_arguments() {
        let cli = Cli::try_parse_from([
            "healthify",
            "--upload-url",
            "http://127.0.0.1:8000/api/v1/upload",
            "upload",
            "report.pdf",
            "--username",
            "user",
            "--password",
            "pass",
        ])
        .expect("parse");
        assert_eq!(
            cli.upload_url.as_deref(),
            Some("http://127.0.0.1:8000/api/v1/upload")
        );
        assert!(matches!(
            cli.command,
            Command::Upload { details: false, .. }
        ));
    }

    #[test]
    fn invalid_upload_url_flag_is_rejected() {
        assert!(with_upload_url(ClientSettings::default(), Some("not a url")).is_err());
        let settings = with_upload_url(
            ClientSettings::default(),
            Some("https://reports.example.test/api/v1/upload"),
        )
        .expect("valid url");
        assert_eq!(
            settings.upload_url,
            "https://reports.example.test/api/v1/upload"
        );
        assert_eq!(
            with_upload_url(ClientSettings::default(), None).expect("no flag"),
            ClientSettings::default()
        );
    }
}
