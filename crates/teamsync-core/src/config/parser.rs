//! TOML parser with helpful error messages

use super::schema::TeamsyncConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse teamsync.toml with detailed error messages
pub fn parse_teamsync_toml(path: &Path) -> Result<TeamsyncConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_teamsync_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse teamsync.toml content from string
pub fn parse_teamsync_toml_str(content: &str) -> Result<TeamsyncConfig> {
    let config: TeamsyncConfig =
        toml::from_str(content).map_err(|e| describe_toml_error(e, content))?;
    config.validate()?;
    Ok(config)
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &TeamsyncConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration to TOML")
}

fn describe_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();
    match error.span() {
        Some(span) => {
            let line = content[..span.start.min(content.len())].matches('\n').count() + 1;
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line,
                line_context(content, line),
                message
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

/// Up to two lines either side of `line_num`, with the offending line marked
fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(3);
    let end = (line_num + 2).min(lines.len());

    (start..end)
        .map(|i| {
            let num = i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, lines[i])
        })
        .collect::<Vec<_>>()
        .join("\n")
}
