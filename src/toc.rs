//! Table of contents extraction from raw markup.
//!
//! Headings are recognised by their line prefix, not by the renderer, so the
//! TOC can be built without a subprocess:
//!
//! ```text
//! = Post Title          → "0"      (the page title, not a navigable section)
//! == Setup              → "1"
//! === Tools             → "1.1"
//! ==== Editors          → "1.1.1"
//! === Config            → "1.2"
//! == Usage              → "2"
//! ```
//!
//! Each depth below the title keeps its own counter. A heading resets the
//! counters of every deeper level, so numbering restarts under each parent.
//! Nesting is not validated: a `====` heading with no `==` above it is
//! numbered `0.0.1`.

use crate::anchor;
use serde::Serialize;

/// Number label given to the document title entry.
pub const TITLE_NUMBER: &str = "0";

/// Deepest heading level that is recognised (`==== `).
const MAX_DEPTH: usize = 4;

/// One heading in a document's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Dotted position label, e.g. `"2.1"`; `"0"` for the title.
    pub number: String,
    /// Heading text with emphasis asterisks removed.
    pub label: String,
    /// Fragment identifier of the heading, see [`anchor::normalize`].
    pub anchor: String,
    /// Heading level, 1 (title) to 4.
    pub depth: u8,
}

impl TocEntry {
    pub fn is_title(&self) -> bool {
        self.depth == 1
    }
}

/// Heading counters for depths 2, 3 and 4.
#[derive(Debug, Default)]
struct Counters {
    section: u32,
    subsection: u32,
    subsubsection: u32,
}

impl Counters {
    fn advance(&mut self, depth: usize) -> String {
        match depth {
            2 => {
                self.section += 1;
                self.subsection = 0;
                self.subsubsection = 0;
                self.section.to_string()
            }
            3 => {
                self.subsection += 1;
                self.subsubsection = 0;
                format!("{}.{}", self.section, self.subsection)
            }
            _ => {
                self.subsubsection += 1;
                format!(
                    "{}.{}.{}",
                    self.section, self.subsection, self.subsubsection
                )
            }
        }
    }
}

/// Split a line into its heading depth and text, if it is a heading.
///
/// A heading is 1 to 4 `=` characters followed by a space.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let depth = line.chars().take_while(|&c| c == '=').count();
    if depth == 0 || depth > MAX_DEPTH {
        return None;
    }
    line[depth..].strip_prefix(' ').map(|text| (depth, text))
}

/// Extract the table of contents from raw markup, in source order.
///
/// The result includes the title entry (number `"0"`) when the document has
/// one; use [`sections`] to get the entries a rendered TOC should show.
///
/// Only the first depth-1 heading is taken as the title. Later `= ` lines
/// are ignored so that number labels stay unique.
pub fn extract(raw: &str) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut counters = Counters::default();
    let mut seen_title = false;

    for line in raw.lines() {
        let Some((depth, text)) = parse_heading(line) else {
            continue;
        };

        let number = if depth == 1 {
            if seen_title {
                continue;
            }
            seen_title = true;
            TITLE_NUMBER.to_string()
        } else {
            counters.advance(depth)
        };

        // The anchor sees the text before asterisks are removed
        let anchor = anchor::normalize(text);
        entries.push(TocEntry {
            number,
            label: text.replace('*', ""),
            anchor,
            depth: depth as u8,
        });
    }

    entries
}

/// The navigable part of a TOC: every entry except the document title.
pub fn sections(toc: &[TocEntry]) -> &[TocEntry] {
    match toc.first() {
        Some(first) if first.is_title() => &toc[1..],
        _ => toc,
    }
}
