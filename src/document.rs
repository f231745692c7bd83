//! Source documents and their compiled form.
//!
//! A [`SourceDocument`] is one markup file read from the source tree. Compiling
//! it produces a [`CompiledDocument`]: its title, content type, body HTML, table
//! of contents, and the output path it will be written to.
//!
//! ## Content Types
//!
//! The content type is decided by the document's location, checked in this
//! order (first match wins):
//!
//! | Path contains | Type | Template |
//! |---------------|------|----------|
//! | `pages` | [`ContentType::Page`] | `page.html` |
//! | `posts` | [`ContentType::Post`] | `post.html` |
//! | `research` | [`ContentType::Research`] | `post.html` |
//! | `reading` | [`ContentType::Reading`] | `post.html` |
//!
//! Anything else is [`ContentType::Unknown`]; such documents compile but are
//! not written.
//!
//! ## Output Paths
//!
//! The output path mirrors the source tree: `src/posts/2024-01-01-x.adoc`
//! becomes `docs/posts/2024-01-01-x.html`. [`CompiledDocument::output_path`]
//! holds the part relative to the output root (`posts/2024-01-01-x.html`).

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::blocks::{self, ContentBlock, ContentError};
use crate::config::{BodySource, RendererConfig};
use crate::render::{Backend, RenderError, Renderer};
use crate::toc::{self, TocEntry};

/// Title used when a document does not start with a `= ` heading.
pub const PLACEHOLDER_TITLE: &str = "No Title";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("cannot read source: {0}")]
    Discovery(#[from] std::io::Error),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
}

/// Classification of a document, decided by its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Page,
    Post,
    Research,
    Reading,
    Unknown,
}

/// Path markers in priority order.
const MARKERS: &[(&str, ContentType)] = &[
    ("pages", ContentType::Page),
    ("posts", ContentType::Post),
    ("research", ContentType::Research),
    ("reading", ContentType::Reading),
];

impl ContentType {
    /// Classify a path by substring match against the directory markers.
    pub fn classify(path: &Path) -> Self {
        let path = path.to_string_lossy();
        MARKERS
            .iter()
            .find(|(marker, _)| path.contains(marker))
            .map(|&(_, kind)| kind)
            .unwrap_or(Self::Unknown)
    }

    /// Template used to render documents of this type.
    pub fn template(self) -> Option<&'static str> {
        match self {
            Self::Page => Some("page.html"),
            Self::Post | Self::Research | Self::Reading => Some("post.html"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Page => "page",
            Self::Post => "post",
            Self::Research => "research",
            Self::Reading => "reading",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A markup file read from the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path as discovered (source root joined with `rel_path`).
    pub path: PathBuf,
    /// Path relative to the source root.
    pub rel_path: PathBuf,
    /// Unmodified file contents.
    pub raw: String,
}

impl SourceDocument {
    /// Read a document below `root`.
    pub fn read(root: &Path, path: &Path) -> Result<Self, DocumentError> {
        let raw = fs::read_to_string(path)?;
        let rel_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        Ok(Self {
            path: path.to_path_buf(),
            rel_path,
            raw,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Title from the first line, which must be a `= ` heading.
    ///
    /// Surrounding whitespace is trimmed from the title.
    pub fn title(&self) -> String {
        self.raw
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("= "))
            .map(|title| title.trim().to_string())
            .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string())
    }
}

/// Options controlling how a document is compiled.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub body: BodySource,
    /// Parse DocBook blocks even when the body comes from HTML.
    pub structure: bool,
}

impl From<&RendererConfig> for CompileOptions {
    fn from(config: &RendererConfig) -> Self {
        Self {
            body: config.body,
            structure: config.structure,
        }
    }
}

impl CompileOptions {
    fn needs_blocks(&self) -> bool {
        self.structure || self.body == BodySource::Blocks
    }
}

/// A fully compiled document, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument {
    pub source: SourceDocument,
    pub title: String,
    pub content_type: ContentType,
    /// Body HTML.
    pub content: String,
    /// DocBook blocks, when they were requested and could be parsed.
    pub blocks: Option<Vec<ContentBlock>>,
    /// Full table of contents, title entry included.
    pub toc: Vec<TocEntry>,
    /// Output path relative to the output root.
    pub output_path: PathBuf,
}

impl CompiledDocument {
    /// TOC entries to show on the page (the title entry is left out).
    pub fn sections(&self) -> &[TocEntry] {
        toc::sections(&self.toc)
    }

    pub fn file_name(&self) -> String {
        self.source.file_name()
    }

    /// Site-relative URL, e.g. `/posts/2024-01-01-hello.html`.
    pub fn url(&self) -> String {
        let parts: Vec<String> = self
            .output_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("/{}", parts.join("/"))
    }
}

/// Output path for a source path relative to the source root.
pub fn output_path_for(rel_path: &Path) -> PathBuf {
    rel_path.with_extension("html")
}

/// Compile one source document.
///
/// Renders the body (HTML backend, or DocBook blocks when configured),
/// extracts the TOC from the raw text, and derives the output path. With
/// `structure` enabled and an HTML body, a document whose DocBook output has
/// no root still compiles, without blocks.
pub fn compile(
    source: SourceDocument,
    renderer: &dyn Renderer,
    options: CompileOptions,
) -> Result<CompiledDocument, DocumentError> {
    let title = source.title();
    let content_type = ContentType::classify(&source.rel_path);

    let blocks = if options.needs_blocks() {
        let xml = renderer.render(&source, Backend::DocBook)?;
        match blocks::parse(&xml) {
            Ok(parsed) => Some(parsed),
            Err(err) if options.body == BodySource::Html => {
                warn!(path = %source.path.display(), error = %err, "no blocks extracted");
                None
            }
            Err(err) => return Err(err.into()),
        }
    } else {
        None
    };

    let content = match (options.body, &blocks) {
        (BodySource::Blocks, Some(parsed)) => blocks::to_html(parsed).into_string(),
        _ => renderer.render(&source, Backend::Html)?,
    };

    let toc = toc::extract(&source.raw);
    let output_path = output_path_for(&source.rel_path);

    Ok(CompiledDocument {
        source,
        title,
        content_type,
        content,
        blocks,
        toc,
        output_path,
    })
}
