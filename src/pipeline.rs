//! The build pipeline.
//!
//! ```text
//! 1. Discover   src/**/*.adoc        →  sorted source paths
//! 2. Compile    each source path     →  CompiledDocument   (parallel, rayon)
//! 3. Write      each document        →  docs/<same path>.html
//! 4. Index      posts + reading      →  docs/index.html
//! 5. Assets     src/posts/images/    →  docs/images/
//! ```
//!
//! ## Failure Handling
//!
//! Compilation failures are per document: an unreadable file, a renderer
//! crash or unusable DocBook output is logged with the file's path and
//! recorded in the [`BuildReport`], and the rest of the site is still built.
//! Callers decide how to surface them (the CLI exits non-zero).
//!
//! Template failures abort the build. A broken template affects every
//! document of its class, so continuing would only repeat the same error.
//!
//! ## Ordering
//!
//! Discovery sorts paths, and compiled results are collected back into
//! discovery order, so the report and the written site are the same no
//! matter which worker finishes first.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::document::{CompileOptions, CompiledDocument, ContentType, DocumentError, SourceDocument, compile};
use crate::index::Index;
use crate::render::Renderer;
use crate::templates::{Renderable, TemplateError, Templates};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source directory not found: {0}")]
    MissingSource(PathBuf),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

/// A document that failed to compile.
#[derive(Debug)]
pub struct Failure {
    /// Path relative to the source root.
    pub path: PathBuf,
    pub error: DocumentError,
}

/// Result of compiling every discovered document.
#[derive(Debug, Default)]
pub struct Compilation {
    /// Successfully compiled documents, in discovery order.
    pub documents: Vec<CompiledDocument>,
    pub failures: Vec<Failure>,
}

/// A page written to the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    pub title: String,
    pub content_type: ContentType,
    /// Path relative to the source root.
    pub source: PathBuf,
    /// Path relative to the output root.
    pub output: PathBuf,
}

/// Counts of documents listed on the index page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub posts: usize,
    pub reading: usize,
}

/// Everything a build did.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub pages: Vec<WrittenPage>,
    /// Documents compiled but not written because their content type is unknown.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<Failure>,
    pub index: IndexSummary,
    /// Number of image files copied, if the image directory exists.
    pub images_copied: Option<usize>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Find source documents below `source`, sorted by path.
///
/// Files with a configured extension are included unless their name
/// contains the skip marker. Unreadable directory entries are logged and
/// skipped.
pub fn discover(source: &Path, config: &SiteConfig) -> Result<Vec<PathBuf>, BuildError> {
    if !source.is_dir() {
        return Err(BuildError::MissingSource(source.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| config.extensions.iter().any(|x| x == ext));
        if !has_extension {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !config.skip_marker.is_empty() && name.contains(config.skip_marker.as_str()) {
            debug!(path = %path.display(), "skipping draft");
            continue;
        }
        paths.push(path.to_path_buf());
    }
    paths.sort();
    Ok(paths)
}

/// Read and compile every path, in parallel on the current rayon pool.
pub fn compile_all(
    source: &Path,
    paths: &[PathBuf],
    renderer: &dyn Renderer,
    options: CompileOptions,
) -> Compilation {
    let results: Vec<(PathBuf, Result<CompiledDocument, DocumentError>)> = paths
        .par_iter()
        .map(|path| {
            let result = SourceDocument::read(source, path)
                .and_then(|doc| compile(doc, renderer, options));
            (path.clone(), result)
        })
        .collect();

    let mut compilation = Compilation::default();
    for (path, result) in results {
        match result {
            Ok(doc) => compilation.documents.push(doc),
            Err(err) => {
                let rel = path.strip_prefix(source).unwrap_or(&path).to_path_buf();
                error!(path = %path.display(), error = %err, "document failed to compile");
                compilation.failures.push(Failure {
                    path: rel,
                    error: err,
                });
            }
        }
    }
    compilation
}

/// Discover and compile the whole source tree without writing anything.
pub fn compile_site(
    source: &Path,
    config: &SiteConfig,
    renderer: &dyn Renderer,
) -> Result<Compilation, BuildError> {
    let paths = discover(source, config)?;
    info!(count = paths.len(), source = %source.display(), "discovered documents");
    Ok(compile_all(
        source,
        &paths,
        renderer,
        CompileOptions::from(&config.renderer),
    ))
}

/// Build the site from `source` into `output`.
pub fn build(
    source: &Path,
    output: &Path,
    config: &SiteConfig,
    renderer: &dyn Renderer,
    templates: &Templates,
) -> Result<BuildReport, BuildError> {
    let compilation = compile_site(source, config, renderer)?;
    fs::create_dir_all(output)?;

    let mut report = BuildReport {
        failures: compilation.failures,
        ..BuildReport::default()
    };

    for doc in &compilation.documents {
        if doc.content_type == ContentType::Unknown {
            warn!(path = %doc.source.path.display(), "no content type, not written");
            report.skipped.push(doc.source.rel_path.clone());
            continue;
        }
        let written = write_output(output, doc, templates)?;
        report.pages.push(WrittenPage {
            title: doc.title.clone(),
            content_type: doc.content_type,
            source: doc.source.rel_path.clone(),
            output: written,
        });
    }

    let index = Index::aggregate(&compilation.documents);
    report.index = IndexSummary {
        posts: index.posts.len(),
        reading: index.reading.len(),
    };
    write_output(output, &index, templates)?;

    report.images_copied = copy_images(
        &source.join(&config.images.source),
        &output.join(&config.images.target),
    )?;

    Ok(report)
}

/// Render one item and write it below `output`, creating parent directories.
fn write_output(
    output: &Path,
    item: &dyn Renderable,
    templates: &Templates,
) -> Result<PathBuf, BuildError> {
    let html = item.render(templates)?;
    let rel = item.output_name();
    let path = output.join(&rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, html)?;
    info!(path = %path.display(), "rendered");
    Ok(rel)
}

/// Replace `target` with a copy of `source`.
///
/// Returns `None` without touching `target` when `source` does not exist.
pub fn copy_images(source: &Path, target: &Path) -> Result<Option<usize>, BuildError> {
    if !source.is_dir() {
        debug!(path = %source.display(), "no image directory");
        return Ok(None);
    }
    if target.exists() {
        fs::remove_dir_all(target)?;
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }
    info!(count = copied, target = %target.display(), "copied images");
    Ok(Some(copied))
}
