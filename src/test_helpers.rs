//! Shared test utilities for the adoc-site test suite.
//!
//! Provides a [`Renderer`] with fixed outputs so compilation and page
//! rendering can be tested without `asciidoctor` installed, plus small
//! builders for source documents and source trees.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let renderer = FixtureRenderer::default();
//! let doc = compile(source_doc("posts/a.adoc", "= A\n"), &renderer, CompileOptions::default()).unwrap();
//! assert_eq!(doc.content, FIXTURE_HTML);
//! assert_eq!(renderer.calls(), vec![Backend::Html]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::document::SourceDocument;
use crate::render::{Backend, RenderError, Renderer};

/// HTML body returned by [`FixtureRenderer`].
pub const FIXTURE_HTML: &str = "<p>rendered</p>";

/// DocBook returned by [`FixtureRenderer`] unless replaced.
pub const FIXTURE_DOCBOOK: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<article xmlns=\"http://docbook.org/ns/docbook\" version=\"5.0\">\
<info><title>Fixture</title></info>\
<title>Fixture Section</title>\
<simpara>Fixture body.</simpara>\
</article>";

// =========================================================================
// Renderer
// =========================================================================

/// Renderer with canned outputs that records every call.
pub struct FixtureRenderer {
    docbook: String,
    /// Fail for sources whose path contains this text (`""` fails all).
    fail_on: Option<String>,
    calls: Mutex<Vec<Backend>>,
}

impl Default for FixtureRenderer {
    fn default() -> Self {
        Self {
            docbook: FIXTURE_DOCBOOK.to_string(),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FixtureRenderer {
    pub fn with_docbook(xml: &str) -> Self {
        Self {
            docbook: xml.to_string(),
            ..Self::default()
        }
    }

    /// Fails every render.
    pub fn failing() -> Self {
        Self::failing_for("")
    }

    /// Fails renders of sources whose path contains `marker`.
    pub fn failing_for(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Self::default()
        }
    }

    /// Backends requested so far, in call order.
    pub fn calls(&self) -> Vec<Backend> {
        self.calls.lock().unwrap().clone()
    }
}

impl Renderer for FixtureRenderer {
    fn render(&self, source: &SourceDocument, backend: Backend) -> Result<String, RenderError> {
        self.calls.lock().unwrap().push(backend);
        if let Some(marker) = &self.fail_on
            && source.path.to_string_lossy().contains(marker.as_str())
        {
            return Err(RenderError::Failed {
                status: "exit status: 1".to_string(),
                stderr: format!("fixture failure for {}", source.path.display()),
            });
        }
        Ok(match backend {
            Backend::Html => FIXTURE_HTML.to_string(),
            Backend::DocBook => self.docbook.clone(),
        })
    }
}

// =========================================================================
// Sources
// =========================================================================

/// An in-memory source document at `src/<rel>`.
pub fn source_doc(rel: &str, raw: &str) -> SourceDocument {
    SourceDocument {
        path: Path::new("src").join(rel),
        rel_path: PathBuf::from(rel),
        raw: raw.to_string(),
    }
}

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}
