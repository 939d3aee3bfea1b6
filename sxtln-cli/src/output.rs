///! Output formatting for CLI
///!
///! Command results go to stdout as JSON or YAML; status lines and
///! errors go to stderr so results stay pipeable.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use sxtln_common::OutputFormat;

/// Render a result in the configured format
pub fn render<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
    };
    Ok(rendered)
}

/// Print a single item in the specified format
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(data, format)?.trim_end());
    Ok(())
}

/// Write an opaque payload (kubeconfig files) to stdout unchanged
pub fn print_raw(bytes: &[u8]) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    if !bytes.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

/// Print a success message with green checkmark
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message.green());
}

/// Print an error message with red X
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Spinner shown while waiting on the server
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use sxtln_common::Document;

    #[test]
    fn test_render_formats() {
        let doc = Document::new().with("ok", true);
        assert_eq!(render(&doc, OutputFormat::Json).unwrap(), "{\n  \"ok\": true\n}");
        assert_eq!(render(&doc, OutputFormat::Yaml).unwrap(), "ok: true\n");
    }
}
