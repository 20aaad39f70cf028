//! Markdown rendering of the analysis results
//!
//! Formats the correlation report and the per-user / per-term summaries as
//! a human-readable Markdown document for the presentation layer. Pure
//! formatting: nothing here is persisted or authoritative.

use std::fmt::Write as _;

use crate::models::{
    CorrelationOutcome, CorrelationReport, SentimentLabel, TermSentimentSummary, UserMetrics,
};
use crate::pipeline::BatchStats;

/// Absolute coefficient above which a correlation is called out as a key
/// finding.
const NOTABLE_COEFFICIENT: f64 = 0.3;

/// Render a full analysis report as Markdown.
pub fn render_markdown(
    report: &CorrelationReport,
    user_metrics: &[UserMetrics],
    term_summaries: &[TermSentimentSummary],
    stats: &BatchStats,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Social Media and Mental Health Analysis Report\n");
    let _ = writeln!(
        out,
        "Generated on: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    let _ = writeln!(out, "## Sentiment Distribution\n");
    let _ = writeln!(out, "| Label | Posts |\n|---|---|");
    for (label, count) in [
        (SentimentLabel::Positive, stats.positive),
        (SentimentLabel::Neutral, stats.neutral),
        (SentimentLabel::Negative, stats.negative),
    ] {
        let _ = writeln!(out, "| {} | {count} |", label.as_str());
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} of {} posts annotated, {} failed, {} skipped.\n",
        stats.annotated, stats.total_posts, stats.failed, stats.skipped
    );
    if let Some(agreement) = stats.label_agreement {
        let _ = writeln!(
            out,
            "Polarity and compound labels agree on {:.1}% of posts.\n",
            agreement * 100.0
        );
    }

    let _ = writeln!(out, "## Mental Health Terms\n");
    if term_summaries.is_empty() {
        let _ = writeln!(out, "No mental health terms matched.\n");
    } else {
        let mut by_count: Vec<&TermSentimentSummary> = term_summaries.iter().collect();
        by_count.sort_by(|a, b| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then_with(|| a.term.cmp(&b.term))
        });
        let _ = writeln!(
            out,
            "| Term | Category | Occurrences | Mean polarity | Mean compound |\n|---|---|---|---|---|"
        );
        for summary in by_count.iter().take(10) {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {:+.4} | {:+.4} |",
                summary.term,
                summary.category.as_str(),
                summary.occurrence_count,
                summary.mean_polarity,
                summary.mean_compound
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Sentiment by Category\n");
    if report.category_sentiment.is_empty() {
        let _ = writeln!(out, "No category-level data available.\n");
    } else {
        let _ = writeln!(
            out,
            "| Category | Records | Mean polarity | Mean compound |\n|---|---|---|---|"
        );
        for cat in &report.category_sentiment {
            let _ = writeln!(
                out,
                "| {} | {} | {:+.4} | {:+.4} |",
                cat.category.as_str(),
                cat.record_count,
                cat.mean_polarity,
                cat.mean_compound
            );
        }
        let _ = writeln!(out);
        for diff in &report.category_differences {
            let _ = writeln!(
                out,
                "- {} vs {}: mean compound differs by {:+.4}",
                diff.category_a.as_str(),
                diff.category_b.as_str(),
                diff.compound_difference
            );
        }
        if !report.category_differences.is_empty() {
            let _ = writeln!(out);
        }
    }

    let _ = writeln!(out, "## User Metrics\n");
    if user_metrics.is_empty() {
        let _ = writeln!(out, "No user metrics data available.\n");
    } else {
        let count = user_metrics.len() as f64;
        let avg_mh = user_metrics
            .iter()
            .map(|u| u.mental_health_post_fraction)
            .sum::<f64>()
            / count;
        let avg_polarity = user_metrics.iter().map(|u| u.average_polarity).sum::<f64>() / count;
        let avg_engagement = user_metrics
            .iter()
            .map(|u| u.average_engagement)
            .sum::<f64>()
            / count;
        let _ = writeln!(out, "Users analyzed: {}\n", user_metrics.len());
        let _ = writeln!(
            out,
            "Average share of mental health posts per user: {:.2}%\n",
            avg_mh * 100.0
        );
        let _ = writeln!(out, "Average sentiment polarity: {avg_polarity:+.4}\n");
        let _ = writeln!(out, "Average engagement: {avg_engagement:.2}\n");
    }

    let _ = writeln!(out, "## Correlations\n");
    let _ = writeln!(out, "| Name | Samples | Coefficient | Significant |\n|---|---|---|---|");
    for entry in &report.entries {
        match &entry.outcome {
            CorrelationOutcome::Computed {
                coefficient,
                significant,
            } => {
                let _ = writeln!(
                    out,
                    "| {} | {} | {:+.4} | {} |",
                    entry.name,
                    entry.sample_size,
                    coefficient,
                    if *significant { "yes" } else { "no" }
                );
            }
            CorrelationOutcome::InsufficientData { reason } => {
                let _ = writeln!(
                    out,
                    "| {} | {} | insufficient data ({reason}) | - |",
                    entry.name, entry.sample_size
                );
            }
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Key Findings\n");
    let mut findings = Vec::new();
    for entry in &report.entries {
        if let CorrelationOutcome::Computed { coefficient, .. } = entry.outcome {
            if coefficient.abs() > NOTABLE_COEFFICIENT {
                let direction = if coefficient > 0.0 { "positive" } else { "negative" };
                findings.push(format!(
                    "There is a {direction} correlation ({coefficient:.4}) for {}.",
                    entry.name
                ));
            }
        }
    }
    if let Some(top) = term_summaries.iter().max_by_key(|s| s.occurrence_count) {
        findings.push(format!(
            "The most frequently matched term is '{}' with {} occurrences.",
            top.term, top.occurrence_count
        ));
    }
    if findings.is_empty() {
        let _ = writeln!(out, "Insufficient data to generate key findings.");
    } else {
        for (i, finding) in findings.iter().enumerate() {
            let _ = writeln!(out, "{}. {finding}", i + 1);
        }
    }
    let _ = writeln!(
        out,
        "\nAll statistics are descriptive; no causal direction is implied."
    );

    out
}
