use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tokio::io::AsyncReadExt;

use crate::{BatchReport, ChatOptions};

use super::super::Container;

pub struct BatchController<'a> {
    container: &'a Container,
}

impl<'a> BatchController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn batch(
        &self,
        file: PathBuf,
        scenario: String,
        temperature: Option<f32>,
        json: bool,
    ) -> Result<String> {
        let messages = read_messages(&file).await?;
        if messages.is_empty() {
            bail!("No messages found in {}", file.display());
        }

        let options = ChatOptions::new()
            .with_scenario(scenario)
            .with_temperature(temperature);

        let progress_bar = ProgressBar::new(messages.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")?
                .progress_chars("#>-"),
        );

        let report = self
            .container
            .batch_use_case()
            .execute_with_progress(&messages, &options, |item| {
                progress_bar.set_message(if item.success { "ok" } else { "failed" });
                progress_bar.inc(1);
            })
            .await;
        progress_bar.finish_and_clear();

        if json {
            Ok(serde_json::to_string_pretty(&report_json(&report))?)
        } else {
            Ok(self.format_report(&report))
        }
    }

    fn format_report(&self, report: &BatchReport) -> String {
        let mut output = String::new();
        for item in &report.items {
            output.push_str(&format!("[{}] {}\n", item.index + 1, item.message));
            match (&item.response, &item.error) {
                (Some(response), _) => output.push_str(&format!("    {}\n\n", response)),
                (None, Some(error)) => output.push_str(&format!("    Error: {}\n\n", error)),
                (None, None) => output.push('\n'),
            }
        }
        output.push_str(&format!(
            "Processed {} messages: {} successful, {} failed in {:.2}s",
            report.total(),
            report.successful(),
            report.failed(),
            report.elapsed_secs
        ));
        output
    }
}

/// Response shape shared by the CLI and `POST /api/batch`.
pub fn report_json(report: &BatchReport) -> serde_json::Value {
    json!({
        "success": true,
        "total_messages": report.total(),
        "successful": report.successful(),
        "failed": report.failed(),
        "total_time": report.elapsed_secs,
        "results": report.items,
    })
}

/// One message per non-blank line. `-` reads standard input.
async fn read_messages(path: &Path) -> Result<Vec<String>> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        buffer
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BatchItem;

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.txt");
        std::fs::write(&path, "first\n\n   \nsecond\n").unwrap();

        let messages = read_messages(&path).await.unwrap();

        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn json_report_carries_counts_and_results() {
        let report = BatchReport::new(
            vec![
                BatchItem::succeeded(0, "a", "A"),
                BatchItem::failed(1, "b", "boom"),
            ],
            1.5,
        );

        let value = report_json(&report);

        assert_eq!(value["total_messages"], 2);
        assert_eq!(value["successful"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["results"][1]["error"], "boom");
    }
}
