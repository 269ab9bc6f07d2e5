//! Terminal upload and result surfaces.

use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use report_session::{ModelId, Phase, ResultView, SessionView};
use url::Url;

pub fn print_banner(term: &Term) -> Result<()> {
    term.write_line(&format!(
        "{}",
        "╔════════════════════════════════════════╗".bright_cyan()
    ))?;
    term.write_line(&format!(
        "{}",
        "║        Annual Report Extractor         ║".bright_cyan()
    ))?;
    term.write_line(&format!(
        "{}",
        "╚════════════════════════════════════════╝".bright_cyan()
    ))?;
    Ok(())
}

/// Ask for a PDF path. Dropping a file onto the terminal pastes its path here.
pub fn prompt_file(term: &Term) -> Result<PathBuf> {
    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Drag & drop your PDF here, or type its path")
        .interact_text_on(term)?;
    Ok(normalize_dropped_path(&raw))
}

pub fn prompt_model(term: &Term, current: ModelId) -> Result<ModelId> {
    let models = ModelId::variants();
    let labels: Vec<&str> = models.iter().map(|m| m.label()).collect();
    let default = models.iter().position(|m| *m == current).unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select AI Model")
        .items(&labels)
        .default(default)
        .interact_on(term)?;

    Ok(models[selection])
}

/// Undo the quoting terminals apply to dropped paths.
///
/// Handles `'...'` and `"..."` wrapping, backslash-escaped spaces and
/// `file://` prefixes.
pub fn normalize_dropped_path(raw: &str) -> PathBuf {
    let mut path = raw.trim();
    for quote in ['\'', '"'] {
        if path.len() >= 2 && path.starts_with(quote) && path.ends_with(quote) {
            path = &path[1..path.len() - 1];
            break;
        }
    }
    let path = path.strip_prefix("file://").unwrap_or(path);
    PathBuf::from(path.replace("\\ ", " "))
}

/// Text for the result surface, or `None` when there is nothing to show.
pub fn render_result(view: &SessionView, base: &Url) -> Option<String> {
    match view.result.as_ref()? {
        ResultView::Download(link) => {
            let target = link
                .resolve(base)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| link.href.clone());
            Some(format!("{} {}", format!("{}:", link.label).green().bold(), target.underline()))
        }
        ResultView::Error { message } => Some(format!("{}", message.red())),
    }
}

pub fn render_status(view: &SessionView) -> String {
    let file = view.file_name.as_deref().unwrap_or("no file");
    match view.phase {
        Phase::Submitting => format!("{} {} ({})", view.action_label.yellow(), file, view.model_label),
        _ => format!("{} {} ({})", "Selected".dimmed(), file, view.model_label),
    }
}

/// Where a downloaded artifact is written inside `dir`.
///
/// The name comes from the last path segment of the locator when that is a
/// plain `.pdf` file name, otherwise from the source file's stem.
pub fn output_path(dir: &Path, source: &str, href: &str) -> PathBuf {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    let from_href = path
        .rsplit('/')
        .next()
        .filter(|name| is_plain_pdf_name(name));

    match from_href {
        Some(name) => dir.join(name),
        None => {
            let stem = Path::new(source)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "report".to_string());
            dir.join(format!("{}-summary.pdf", stem))
        }
    }
}

fn is_plain_pdf_name(name: &str) -> bool {
    name.len() > ".pdf".len()
        && name.ends_with(".pdf")
        && !name.starts_with('.')
        && !name.contains(['\\', ':'])
}
