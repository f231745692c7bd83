//! The external markup renderer.
//!
//! Converting AsciiDoc is delegated to `asciidoctor`, run once per document
//! and backend. Everything else in the crate talks to it through the
//! [`Renderer`] trait, so parsers and page rendering can be tested against
//! fixed outputs without spawning a process.
//!
//! Source text is piped through stdin and the result read from stdout. The
//! document's directory is passed as the base dir so relative includes and
//! image paths resolve the same way they would when rendering the file
//! directly.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

use crate::config::RendererConfig;
use crate::document::SourceDocument;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("failed to talk to renderer: {0}")]
    Io(#[from] std::io::Error),
    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("renderer output is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Output format requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Embeddable HTML body, without document header and footer.
    Html,
    /// A complete DocBook 5 document rooted at `<article>`.
    DocBook,
}

/// Converts one source document to text in the requested backend.
///
/// Implementations must be usable from several worker threads at once.
pub trait Renderer: Send + Sync {
    fn render(&self, source: &SourceDocument, backend: Backend) -> Result<String, RenderError>;
}

/// Renders through the `asciidoctor` command line tool.
#[derive(Debug, Clone)]
pub struct Asciidoctor {
    program: PathBuf,
    attributes: Vec<String>,
}

impl Asciidoctor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            attributes: Vec::new(),
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(&config.program).with_attributes(config.attributes.iter().cloned())
    }

    /// Document attributes passed as `-a <attr>` on every invocation.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = String>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Command line arguments for one invocation, excluding the program.
    fn args(&self, backend: Backend, base_dir: &Path) -> Vec<String> {
        let mut args = vec!["-q".to_string()];
        match backend {
            Backend::Html => {
                args.extend(["-b".to_string(), "html5".to_string(), "-s".to_string()]);
            }
            Backend::DocBook => {
                args.extend(["-b".to_string(), "docbook5".to_string()]);
            }
        }
        for attr in &self.attributes {
            args.push("-a".to_string());
            args.push(attr.clone());
        }
        args.push("-B".to_string());
        args.push(base_dir.to_string_lossy().into_owned());
        args.extend(["-o".to_string(), "-".to_string(), "-".to_string()]);
        args
    }
}

impl Renderer for Asciidoctor {
    fn render(&self, source: &SourceDocument, backend: Backend) -> Result<String, RenderError> {
        let base_dir = source
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let args = self.args(backend, base_dir);
        debug!(path = %source.path.display(), ?backend, "invoking renderer");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // Feed stdin from a separate thread so a large document cannot
        // deadlock against a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.raw.clone();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child.wait_with_output()?;
        let written = match writer.map(|handle| handle.join()) {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(std::io::Error::other("stdin writer thread panicked")),
            None => Ok(()),
        };

        // A renderer that exits early closes stdin; report the exit status,
        // not the broken pipe.
        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;
        Ok(String::from_utf8(output.stdout)?)
    }
}
