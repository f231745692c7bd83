//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each document is shown by its identity first (positional index and title),
//! with filesystem paths as indented context lines. The output reads as a
//! content inventory while still pointing at the files involved.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 About (page) → pages/about.html
//!     Source: pages/about.adoc
//! 002 Hello (post) → posts/2024-01-01-hello.html
//!     Source: posts/2024-01-01-hello.adoc
//!
//! Index → index.html (1 post, 0 reading)
//! Images → 3 files copied
//!
//! Skipped
//!     misc/loose.adoc
//!
//! Failed
//!     posts/2023-05-01-broken.adoc: render failed: ...
//!
//! Built 2 pages, 1 skipped, 1 failed
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 About (page)
//!     Source: pages/about.adoc
//!     Sections: 2
//!
//! Checked 1 document, 0 failed
//! ```
//!
//! ## Toc
//!
//! ```text
//! 0 Title #_title
//!     1 First #_first
//!         1.1 Nested #_nested
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::blocks::{BlockKind, ContentBlock};
use crate::pipeline::{BuildReport, Compilation, Failure};
use crate::toc::TocEntry;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn failure_lines(failures: &[Failure], lines: &mut Vec<String>) {
    if failures.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Failed".to_string());
    for failure in failures {
        lines.push(format!(
            "{}{}: {}",
            indent(1),
            failure.path.display(),
            failure.error
        ));
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format the result of a full build.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.pages.is_empty() {
        lines.push("Pages".to_string());
        for (i, page) in report.pages.iter().enumerate() {
            lines.push(format!(
                "{} {} ({}) → {}",
                format_index(i + 1),
                page.title,
                page.content_type,
                page.output.display()
            ));
            lines.push(format!("{}Source: {}", indent(1), page.source.display()));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "Index → index.html ({}, {} reading)",
        plural(report.index.posts, "post"),
        report.index.reading
    ));
    if let Some(copied) = report.images_copied {
        lines.push(format!("Images → {} copied", plural(copied, "file")));
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for path in &report.skipped {
            lines.push(format!("{}{}", indent(1), path.display()));
        }
    }

    failure_lines(&report.failures, &mut lines);

    lines.push(String::new());
    lines.push(format!(
        "Built {}, {} skipped, {} failed",
        plural(report.pages.len(), "page"),
        report.skipped.len(),
        report.failures.len()
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format a compile-only run: what would be written, and what failed.
pub fn format_check_output(compilation: &Compilation) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, doc) in compilation.documents.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            doc.title,
            doc.content_type
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            doc.source.rel_path.display()
        ));
        lines.push(format!("{}Sections: {}", indent(1), doc.sections().len()));
        if let Some(blocks) = &doc.blocks {
            lines.push(format!("{}Blocks: {}", indent(1), blocks.len()));
        }
    }

    failure_lines(&compilation.failures, &mut lines);

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let total = compilation.documents.len() + compilation.failures.len();
    lines.push(format!(
        "Checked {}, {} failed",
        plural(total, "document"),
        compilation.failures.len()
    ));
    lines
}

pub fn print_check_output(compilation: &Compilation) {
    for line in format_check_output(compilation) {
        println!("{}", line);
    }
}

// ============================================================================
// Toc
// ============================================================================

/// One line per entry, indented by heading depth.
pub fn format_toc(entries: &[TocEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}{} {} #{}",
                indent(usize::from(entry.depth.saturating_sub(1))),
                entry.number,
                entry.label,
                entry.anchor
            )
        })
        .collect()
}

pub fn print_toc(entries: &[TocEntry]) {
    for line in format_toc(entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Blocks
// ============================================================================

fn kind_label(kind: &BlockKind) -> String {
    match kind {
        BlockKind::Title => "TITLE".to_string(),
        BlockKind::Paragraph => "PARAGRAPH".to_string(),
        BlockKind::SectionStart => "SECTION_START".to_string(),
        BlockKind::Link => "LINK".to_string(),
        BlockKind::Unrecognized(tag) => format!("UNRECOGNIZED <{tag}>"),
    }
}

/// One line per block: kind, then text when there is any.
pub fn format_blocks(blocks: &[ContentBlock]) -> Vec<String> {
    blocks
        .iter()
        .map(|block| {
            let label = kind_label(&block.kind);
            if block.text.is_empty() {
                label
            } else {
                format!("{label} {}", block.text)
            }
        })
        .collect()
}

pub fn print_blocks(blocks: &[ContentBlock]) {
    for line in format_blocks(blocks) {
        println!("{}", line);
    }
}
