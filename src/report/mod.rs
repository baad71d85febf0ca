pub mod types;

pub use types::{LabelEntry, LabelReport, PullRequestRef, Rgb};

use crate::config::SiteConfig;
use crate::digest::AnalysisResult;
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Build the label index report for one analyzed digest.
pub fn build(analysis: &AnalysisResult, date_key: &str, site: &SiteConfig) -> LabelReport {
    let page_url = site.page_url(date_key);
    let labels = analysis
        .label_index()
        .iter()
        .map(|(name, prs)| LabelEntry {
            name: name.clone(),
            color: analysis.label_color(name).map(str::to_string),
            pull_requests: prs
                .iter()
                .map(|m| PullRequestRef {
                    title: m.title_text.clone(),
                    url: format!("{}#{}", page_url, m.anchor_id),
                })
                .collect(),
        })
        .collect();

    LabelReport {
        date_key: date_key.to_string(),
        total: analysis.total_count(),
        community: analysis.community_count(),
        bots: analysis.bot_count(),
        labels,
    }
}

/// Output the report to terminal (default) or to a markdown file.
#[instrument(skip(report), fields(date = %report.date_key, labels = report.labels.len()))]
pub fn output(report: &LabelReport, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(report);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            std::fs::write(path, markdown_report(report))?;
            Ok(())
        }
    }
}

/// Print the label index with each label painted in its digest color.
///
/// 2025/01/15: 3 PRs (community 2 / bot 1), 4 labels
///
///  bug  (1)
///   • #1234 Fix null ref in Dictionary
fn print_terminal_report(report: &LabelReport) {
    println!();
    println!(
        "{}: {} PRs (community {} / bot {}), {} labels",
        report.date_key.as_str().bold(),
        report.total,
        report.community,
        report.bots,
        report.labels.len()
    );
    println!();

    for label in &report.labels {
        println!(
            "{} ({})",
            label_chip(&label.name, label.color.as_deref()),
            label.pull_requests.len()
        );
        for pr in &label.pull_requests {
            println!("  • {}", pr.title);
        }
        println!();
    }
}

/// Render the report as markdown:
///
/// # Labels for 2025/01/15
/// **PRs:** 3 | **Community:** 2 | **Bot:** 1
///
/// ## bug
/// Color: `#d73a4a`
/// - [#1234 Fix null ref](https://.../2025/01/15.html#1234)
fn markdown_report(report: &LabelReport) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Labels for {}\n\n", report.date_key));
    md.push_str(&format!(
        "**PRs:** {} | **Community:** {} | **Bot:** {} | **Labels:** {}\n\n",
        report.total,
        report.community,
        report.bots,
        report.labels.len()
    ));

    for label in &report.labels {
        md.push_str(&format!("## {}\n\n", label.name));
        if let Some(color) = &label.color {
            md.push_str(&format!("Color: `{}`\n\n", color));
        }
        for pr in &label.pull_requests {
            md.push_str(&format!("- [{}]({})\n", pr.title, pr.url));
        }
        md.push('\n');
    }
    md
}

/// Label name on its own background color when the token is `#rrggbb`.
fn label_chip(name: &str, color: Option<&str>) -> colored::ColoredString {
    let chip = format!(" {} ", name);
    match color.and_then(Rgb::parse) {
        Some(rgb) => {
            let Rgb(r, g, b) = rgb;
            let painted = chip.as_str().on_truecolor(r, g, b);
            if rgb.is_light() {
                painted.black()
            } else {
                painted.white()
            }
        }
        None => chip.as_str().bold(),
    }
}
