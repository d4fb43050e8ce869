use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use hc1verify::{inspect, strip_scheme, PublicKeyMaterial};

mod report;

/// Decode an HC1 health certificate token and verify it against a DSC.
#[derive(Debug, Parser)]
#[command(name = "hc1verify", version)]
struct Args {
    /// Document signer certificate, PEM or DER.
    #[arg(short, long, env = "HC1_CERT", default_value = "./demo-dsc.crt")]
    cert: PathBuf,

    /// Token text, with or without the `HC1:` prefix. Read from stdin when
    /// omitted.
    #[arg(short, long, env = "HC1_TOKEN")]
    token: Option<String>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Failure] {:#}", err);
            ExitCode::from(report::EXIT_UNREADABLE)
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let cert = fs::read(&args.cert)
        .with_context(|| format!("can't read certificate {}", args.cert.display()))?;
    let key = PublicKeyMaterial::from_certificate(&cert)
        .with_context(|| format!("can't load key from {}", args.cert.display()))?;

    let data = match args.token {
        Some(token) => token,
        None => {
            let mut data = String::new();
            io::stdin()
                .read_to_string(&mut data)
                .context("can't read token from stdin")?;
            data
        }
    };

    let inspection = match inspect(strip_scheme(&data), &key) {
        Ok(inspection) => inspection,
        Err(err) => {
            eprintln!("[Failure] {} stage: {}", err.stage(), err);
            return Ok(ExitCode::from(report::EXIT_UNREADABLE));
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &report::to_json(&inspection, &key))?;
        writeln!(out)?;
    } else {
        report::write_text(&mut out, &inspection, &key)?;
    }

    Ok(ExitCode::from(report::exit_status(&inspection)))
}
