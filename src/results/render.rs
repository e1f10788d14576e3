//! Text rendering shared by the tool and REST front-ends

use super::types::{ExtractionStatus, PageExtraction, SearchResponse};
use std::fmt::Write;

/// Render a full search, with extracted content where available
pub fn render_search(response: &SearchResponse) -> String {
    let mut out = format!(
        "Search completed for '{}' with {} results:\n\n",
        response.query, response.total_results
    );

    for (i, entry) in response.results.iter().enumerate() {
        write_hit_header(&mut out, i + 1, &entry.hit.title, &entry.hit.url, &entry.hit.description);

        match entry.content.status {
            ExtractionStatus::Ok if !entry.content.text.is_empty() => {
                let _ = write!(out, "\n**Full Content:**\n{}\n", entry.content.text);
            }
            ExtractionStatus::Failed => {
                let reason = entry.content.error.as_deref().unwrap_or("unknown error");
                let _ = writeln!(out, "\n**Content Extraction Failed:** {reason}");
            }
            _ => {}
        }

        out.push_str("\n---\n\n");
    }

    out
}

/// Render hits only
pub fn render_summaries(response: &SearchResponse) -> String {
    let mut out = format!(
        "Search summaries for '{}' with {} results:\n\n",
        response.query, response.total_results
    );

    for (i, entry) in response.results.iter().enumerate() {
        write_hit_header(&mut out, i + 1, &entry.hit.title, &entry.hit.url, &entry.hit.description);
        out.push_str("\n---\n\n");
    }

    out
}

/// Render a single page extraction
pub fn render_page(page: &PageExtraction) -> String {
    let outcome = &page.outcome;
    match outcome.status {
        ExtractionStatus::Failed => format!(
            "**Failed to extract content from: {}**\n\n{}\n",
            outcome.url,
            outcome.error.as_deref().unwrap_or("unknown error")
        ),
        _ => format!(
            "**Page Content from: {}**\n\n{}\n\n**Word count:** {}\n",
            outcome.url,
            outcome.text,
            page.word_count()
        ),
    }
}

fn write_hit_header(out: &mut String, n: usize, title: &str, url: &str, description: &str) {
    let _ = writeln!(out, "**{n}. {title}**");
    let _ = writeln!(out, "URL: {url}");
    let _ = writeln!(out, "Description: {description}");
}
