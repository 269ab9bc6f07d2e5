//! Terminal front end for the annual report extractor.
//!
//! Picks a PDF (argument, typed path or drag & drop), picks a model, uploads
//! it to the extraction service and prints the download link or the error.

mod cli;
mod surface;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Term;
use report_session::{
    ClientConfig, Document, ExtractionClient, ModelId, Phase, ResultLocator, SessionController,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

/// Conventional exit status for an interrupted run.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    // Initialize logging (stderr, so the result stays clean on stdout)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,report_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let term = Term::stderr();
    let interactive = cli.interactive();

    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;
    if let Some(base_url) = cli.base_url.clone() {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = cli.timeout_secs {
        if secs == 0 {
            bail!("--timeout-secs must be greater than zero");
        }
        config = config.with_timeout(Some(Duration::from_secs(secs)));
    }

    let client = Arc::new(
        ExtractionClient::new(&config).context("Failed to build extraction client")?,
    );
    let controller = Arc::new(SessionController::with_default_model(
        client.clone(),
        config.default_model,
    ));
    tracing::debug!(endpoint = %client.endpoint(), "Extraction client ready");

    if interactive {
        surface::print_banner(&term)?;
    }

    // Upload surface: argument, typed path and dropped file all end up here.
    let path = match cli.file.clone() {
        Some(path) => path,
        None if interactive => surface::prompt_file(&term)?,
        None => bail!("no PDF given; pass a path or run without --no-input"),
    };
    let document = Document::from_path(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let source_name = document.name().to_string();

    if controller.select_file(document).is_err() {
        return Ok(ExitCode::from(finish(&controller, client.base_url(), &term)));
    }

    match cli.model.as_deref() {
        Some(id) => {
            if let Err(err) = controller.select_model(id) {
                let supported: Vec<&str> = ModelId::variants().iter().map(|m| m.as_str()).collect();
                term.write_line(&format!(
                    "{} (supported: {})",
                    err.to_string().red(),
                    supported.join(", ")
                ))?;
                return Ok(ExitCode::FAILURE);
            }
        }
        None if interactive => {
            let current = controller.session().selected_model();
            let model = surface::prompt_model(&term, current)?;
            controller.select_model(model.as_str())?;
        }
        None => {}
    }

    // Ctrl-C aborts the in-flight request instead of killing the process.
    let interrupt = tokio::spawn({
        let controller = controller.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                controller.cancel();
            }
        }
    });

    term.write_line(&surface::render_status(&controller.view()))?;
    let submitted = controller.submit().await;
    interrupt.abort();

    let status = finish(&controller, client.base_url(), &term);

    let (Ok(Some(locator)), Some(dir)) = (&submitted, &cli.output) else {
        return Ok(ExitCode::from(status));
    };

    // The link is already on stdout; a failed download only warns.
    tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            term.write_line(&format!("{}", "Download cancelled".yellow()))?;
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        saved = save_artifact(&client, locator, dir, &source_name) => {
            match saved {
                Ok(target) => term.write_line(&format!("{} {}", "Saved".green(), target.display()))?,
                Err(err) => {
                    tracing::warn!(error = %err, "Download failed");
                    term.write_line(&format!("{} {:#}", "Could not save PDF:".yellow(), err))?;
                }
            }
            Ok(ExitCode::from(status))
        }
    }
}

/// Download the extracted PDF into `dir`, returning the written path.
async fn save_artifact(
    client: &ExtractionClient,
    locator: &ResultLocator,
    dir: &Path,
    source: &str,
) -> Result<PathBuf> {
    let bytes = client
        .fetch_artifact(locator)
        .await
        .context("Failed to download extracted PDF")?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let target = surface::output_path(dir, source, locator.as_str());
    tokio::fs::write(&target, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(target)
}

/// Render the result surface and return the exit status for the final phase.
fn finish(controller: &SessionController, base: &url::Url, term: &Term) -> u8 {
    let view = controller.view();
    let rendered = surface::render_result(&view, base);

    match view.phase {
        Phase::Success => {
            if let Some(text) = rendered {
                println!("{}", text);
            }
        }
        Phase::Error => {
            if let Some(text) = rendered {
                let _ = term.write_line(&text);
            }
        }
        _ => {
            let _ = term.write_line(&format!("{}", "Cancelled".yellow()));
        }
    }
    exit_status(view.phase)
}

fn exit_status(phase: Phase) -> u8 {
    match phase {
        Phase::Success => 0,
        Phase::Error => 1,
        _ => EXIT_INTERRUPTED,
    }
}
