//! # adoc-site
//!
//! A small static site generator for AsciiDoc blogs. The source tree is the
//! data source: every `.adoc` file becomes one HTML page at the same relative
//! path, its directory decides which template renders it, and posts and
//! reading notes are listed on a generated index page.
//!
//! # Architecture
//!
//! ```text
//! src/**/*.adoc ──discover──▶ SourceDocument
//!                               │  asciidoctor (HTML, optionally DocBook)
//!                               ▼
//!                           CompiledDocument  (title, type, body, TOC, blocks)
//!                               │  minijinja templates
//!                               ▼
//!                           docs/**/*.html + docs/index.html
//! ```
//!
//! Conversion of markup is delegated to an external renderer behind the
//! [`render::Renderer`] trait. Everything this crate derives itself (TOC,
//! anchors, content blocks, classification, output paths) is computed from
//! the raw text or the renderer's output, so it can be tested with fixed
//! inputs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`anchor`] | Heading text → fragment identifier, shared by TOC and block output |
//! | [`toc`] | Numbered table of contents from `=` heading lines |
//! | [`blocks`] | Tolerant DocBook XML parsing into typed content blocks |
//! | [`render`] | The external renderer trait and its `asciidoctor` implementation |
//! | [`document`] | Source and compiled documents, content-type classification, compilation |
//! | [`templates`] | minijinja environment with overridable built-in templates |
//! | [`index`] | Landing page listing posts and reading notes, newest first |
//! | [`pipeline`] | Discovery, parallel compilation, writing, image copying |
//! | [`config`] | `config.toml` loading, validation and stock defaults |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## One Anchor Function
//!
//! TOC links and heading ids are both produced by [`anchor::normalize`]. The
//! renderer's own id generation is never consulted, so a TOC entry links to
//! the heading it was built from as long as both sides see the same text.
//!
//! ## Dates From File Names
//!
//! Posts are named `YYYY-MM-DD-slug.adoc`. The index orders entries by file
//! name, descending, which is reverse-chronological without any date
//! parsing or front matter.
//!
//! ## Per-Document Failures
//!
//! A document that cannot be read, rendered or parsed is reported with its
//! path and left out; the rest of the site is still built. Template errors
//! stop the build, since they affect every document of a class.

pub mod anchor;
pub mod blocks;
pub mod config;
pub mod document;
pub mod index;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod templates;
pub mod toc;

#[cfg(test)]
pub(crate) mod test_helpers;
