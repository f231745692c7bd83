//! Content blocks recovered from the renderer's DocBook output.
//!
//! The HTML backend flattens a document into markup that is awkward to take
//! apart again. The DocBook backend keeps the structure explicit, so the body
//! of a document is read back from it as a flat, ordered list of blocks:
//!
//! ```text
//! <article>
//!   <info><title>Post</title></info>   (skipped: duplicates the page title)
//!   <section>                          SECTION_START
//!     <title>Setup</title>             TITLE      "Setup"
//!     <simpara>Install                 PARAGRAPH  "Install the tool ."
//!       <link href="…">the tool</link> LINK       "the tool"
//!     .</simpara>
//!   </section>
//! </article>
//! ```
//!
//! Elements are visited in document order and matched on their local name
//! only, so the nesting grammar of DocBook never has to be modelled. A
//! section carries no text of its own; its heading follows as a `TITLE`.
//!
//! ## Recovery
//!
//! Renderer output is not trusted to be well-formed. Before parsing, a BOM
//! and leading whitespace are dropped, control characters that XML 1.0
//! forbids are removed, and stray `&` are escaped. Mismatched end tags are
//! ignored, unclosed elements are closed at end of input, and a hard syntax
//! error ends parsing with whatever tree was built so far. The only fatal
//! outcome is a tree without an `article` (or `book`) element.

use maud::{Markup, html};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::anchor;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContentError {
    #[error("no structural root found")]
    NoRoot,
}

/// Element names accepted as the document root.
const ROOT_TAGS: &[&str] = &["article", "book"];

/// Metadata child of the root; skipped during traversal.
const INFO_TAG: &str = "info";

/// The kind of a content block, decided by element name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockKind {
    Title,
    Paragraph,
    SectionStart,
    Link,
    /// Any other element, carrying its tag name.
    Unrecognized(String),
}

impl BlockKind {
    /// Map a DocBook element name to a block kind. Total: unknown names map
    /// to [`BlockKind::Unrecognized`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "title" => Self::Title,
            "simpara" => Self::Paragraph,
            "section" => Self::SectionStart,
            "link" | "xref" => Self::Link,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub kind: BlockKind,
    /// Whitespace-collapsed text of the element; empty for section starts.
    pub text: String,
}

/// Parses DocBook XML into content blocks.
///
/// Elements with no block kind of their own are logged and skipped. They
/// are emitted as [`BlockKind::Unrecognized`] only when requested with
/// [`keep_unrecognized`](Self::keep_unrecognized).
#[derive(Debug, Clone, Default)]
pub struct BlockParser {
    keep_unrecognized: bool,
}

impl BlockParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit [`BlockKind::Unrecognized`] blocks instead of skipping them.
    pub fn keep_unrecognized(mut self, keep: bool) -> Self {
        self.keep_unrecognized = keep;
        self
    }

    pub fn parse(&self, xml: &str) -> Result<Vec<ContentBlock>, ContentError> {
        let cleaned = sanitize(xml);
        let tree = build_tree(&cleaned);
        let root = tree.find_first(ROOT_TAGS).ok_or(ContentError::NoRoot)?;

        let mut blocks = Vec::new();
        for child in root.elements() {
            if child.name == INFO_TAG {
                continue;
            }
            self.visit(child, &mut blocks);
        }
        Ok(blocks)
    }

    fn visit(&self, element: &Element, blocks: &mut Vec<ContentBlock>) {
        match BlockKind::from_tag(&element.name) {
            BlockKind::SectionStart => blocks.push(ContentBlock {
                kind: BlockKind::SectionStart,
                text: String::new(),
            }),
            BlockKind::Unrecognized(tag) => {
                debug!(tag = %tag, kept = self.keep_unrecognized, "unrecognized element");
                if self.keep_unrecognized {
                    blocks.push(ContentBlock {
                        text: element.flat_text(),
                        kind: BlockKind::Unrecognized(tag),
                    });
                }
            }
            kind => blocks.push(ContentBlock {
                kind,
                text: element.flat_text(),
            }),
        }

        for child in element.elements() {
            self.visit(child, blocks);
        }
    }
}

/// Parse DocBook XML with the default options (unrecognized elements skipped).
pub fn parse(xml: &str) -> Result<Vec<ContentBlock>, ContentError> {
    BlockParser::new().parse(xml)
}

/// Render blocks as an HTML fragment.
///
/// Titles get the same anchor ids as the TOC, so a page whose body is built
/// from blocks keeps working TOC links. Link blocks produce no output: a link
/// is inline, and its text is already part of the enclosing paragraph.
pub fn to_html(blocks: &[ContentBlock]) -> Markup {
    html! {
        @for block in blocks {
            @match &block.kind {
                BlockKind::Title => {
                    h2 id=(anchor::normalize(&block.text)) { (block.text) }
                }
                BlockKind::Paragraph => {
                    p { (block.text) }
                }
                BlockKind::SectionStart => {
                    hr.section-start;
                }
                BlockKind::Link | BlockKind::Unrecognized(_) => {}
            }
        }
    }
}

// ============================================================================
// Input cleanup
// ============================================================================

/// Characters XML 1.0 does not allow, other than tab, LF and CR.
fn is_illegal_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}')
}

fn sanitize(xml: &str) -> String {
    let trimmed = xml.trim_start_matches('\u{feff}').trim_start();
    let legal: String = trimmed.chars().filter(|&c| !is_illegal_control(c)).collect();
    escape_stray_ampersands(&legal)
}

/// Escape `&` that does not start an entity or character reference.
fn escape_stray_ampersands(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c == '&' && !starts_reference(&s[i + 1..]) {
            out.push_str("&amp;");
        } else {
            out.push(c);
        }
    }
    out
}

fn starts_reference(rest: &str) -> bool {
    let Some(end) = rest.find(';') else {
        return false;
    };
    let name = &rest[..end];
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(dec) = name.strip_prefix('#') {
        return !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit());
    }
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

// ============================================================================
// Tree building
// ============================================================================

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Node>,
}

impl Element {
    fn named(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First element in document order (including `self`) with one of `names`.
    fn find_first(&self, names: &[&str]) -> Option<&Element> {
        if names.contains(&self.name.as_str()) {
            return Some(self);
        }
        self.elements().find_map(|child| child.find_first(names))
    }

    /// All descendant text nodes joined by spaces, whitespace collapsed.
    fn flat_text(&self) -> String {
        let mut pieces = Vec::new();
        self.collect_text(&mut pieces);
        pieces
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn collect_text<'a>(&'a self, pieces: &mut Vec<&'a str>) {
        for node in &self.children {
            match node {
                Node::Text(text) => pieces.push(text),
                Node::Element(el) => el.collect_text(pieces),
            }
        }
    }
}

/// Open elements, innermost last. The first entry is a synthetic document
/// node that is never closed.
struct TreeBuilder {
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Element::default()],
        }
    }

    fn current(&mut self) -> &mut Element {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn open(&mut self, name: String) {
        self.stack.push(Element::named(name));
    }

    fn leaf(&mut self, name: String) {
        self.current()
            .children
            .push(Node::Element(Element::named(name)));
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let current = self.current();
        if let Some(Node::Text(last)) = current.children.last_mut() {
            last.push_str(text);
        } else {
            current.children.push(Node::Text(text.to_string()));
        }
    }

    /// Close the innermost open element called `name`, and everything opened
    /// inside it. An end tag with no matching open element is ignored.
    fn close(&mut self, name: &str) {
        let Some(pos) = self.stack.iter().skip(1).rposition(|el| el.name == name) else {
            debug!(tag = name, "ignoring unmatched end tag");
            return;
        };
        let target = pos + 1;
        while self.stack.len() > target {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if self.stack.len() > 1
            && let Some(el) = self.stack.pop()
        {
            self.current().children.push(Node::Element(el));
        }
    }

    fn finish(mut self) -> Element {
        while self.stack.len() > 1 {
            self.pop();
        }
        self.stack.pop().unwrap_or_default()
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn build_tree(xml: &str) -> Element {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut builder = TreeBuilder::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => builder.open(local_name(e.local_name().as_ref())),
            Ok(Event::Empty(e)) => builder.leaf(local_name(e.local_name().as_ref())),
            Ok(Event::End(e)) => builder.close(&local_name(e.local_name().as_ref())),
            Ok(Event::Text(e)) => builder.text(&String::from_utf8_lossy(&e)),
            Ok(Event::CData(e)) => builder.text(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => {
                builder.text(&decode_entity(&String::from_utf8_lossy(&e)));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(
                    position = reader.error_position(),
                    error = %err,
                    "malformed XML, keeping the tree parsed so far"
                );
                break;
            }
        }
    }
    builder.finish()
}

/// Resolve an entity or character reference name (without `&` and `;`).
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "amp" => "&".to_string(),
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        "nbsp" => "\u{a0}".to_string(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => format!("&{entity};"),
    }
}
