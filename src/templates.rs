//! Page templates.
//!
//! Pages are rendered with [minijinja](https://docs.rs/minijinja) from three
//! templates, looked up by name:
//!
//! | Template | Used for | Context |
//! |----------|----------|---------|
//! | `page.html` | [`ContentType::Page`] | `title`, `content`, `toc`, `blocks`, `url` |
//! | `post.html` | posts, research and reading notes | same as `page.html` |
//! | `index.html` | the landing page | `posts`, `reading` |
//!
//! A template is read from the configured template directory when a file of
//! that name exists there, otherwise the built-in version compiled into the
//! binary is used. Sites can override one template without copying the rest.
//!
//! The environment is strict: a template that references a variable missing
//! from its context fails to render instead of printing an empty string.
//! Output is not auto-escaped, since `content` is already HTML.
//!
//! [`ContentType::Page`]: crate::document::ContentType::Page

use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::blocks::ContentBlock;
use crate::document::{CompiledDocument, ContentType};
use crate::toc::TocEntry;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template {name}: {source}")]
    Render {
        name: String,
        source: minijinja::Error,
    },
    #[error("no template for {0} documents")]
    Unroutable(ContentType),
}

const BUILTIN_PAGE: &str = include_str!("../templates/page.html");
const BUILTIN_POST: &str = include_str!("../templates/post.html");
const BUILTIN_INDEX: &str = include_str!("../templates/index.html");

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        "page.html" => Some(BUILTIN_PAGE),
        "post.html" => Some(BUILTIN_POST),
        "index.html" => Some(BUILTIN_INDEX),
        _ => None,
    }
}

/// Template engine handle.
///
/// Built once by the caller and passed by reference to everything that
/// renders output.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Templates from `dir`, falling back to the built-ins per file.
    ///
    /// `dir` does not have to exist.
    pub fn load(dir: &Path) -> Self {
        let dir = dir.to_path_buf();
        let mut env = Self::environment();
        env.set_loader(move |name| load_template(&dir, name));
        Self { env }
    }

    /// Built-in templates only.
    pub fn builtin() -> Self {
        let mut env = Self::environment();
        env.set_loader(|name| Ok(builtin(name).map(str::to_string)));
        Self { env }
    }

    /// Templates from in-memory sources, with no fallback.
    pub fn from_sources<I>(sources: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env = Self::environment();
        for (name, source) in sources {
            env.add_template_owned(name.clone(), source)
                .map_err(|source| TemplateError::Render { name, source })?;
        }
        Ok(Self { env })
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env
    }

    /// Render the named template against a serializable context.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, TemplateError> {
        let wrap = |source| TemplateError::Render {
            name: name.to_string(),
            source,
        };
        let template = self.env.get_template(name).map_err(wrap)?;
        template.render(context).map_err(wrap)
    }
}

fn load_template(dir: &Path, name: &str) -> Result<Option<String>, minijinja::Error> {
    let path: PathBuf = dir.join(name);
    if path.is_file() {
        return fs::read_to_string(&path).map(Some).map_err(|err| {
            minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("cannot read {}", path.display()),
            )
            .with_source(err)
        });
    }
    Ok(builtin(name).map(str::to_string))
}

/// Something that becomes one output file.
pub trait Renderable {
    /// Render the final output text.
    fn render(&self, templates: &Templates) -> Result<String, TemplateError>;

    /// Output path relative to the output root.
    fn output_name(&self) -> PathBuf;
}

/// Context passed to `page.html` and `post.html`.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub toc: &'a [TocEntry],
    pub blocks: &'a [ContentBlock],
    pub url: String,
}

impl<'a> PageContext<'a> {
    pub fn new(doc: &'a CompiledDocument) -> Self {
        Self {
            title: &doc.title,
            content: &doc.content,
            toc: doc.sections(),
            blocks: doc.blocks.as_deref().unwrap_or(&[]),
            url: doc.url(),
        }
    }
}

impl Renderable for CompiledDocument {
    fn render(&self, templates: &Templates) -> Result<String, TemplateError> {
        let name = self
            .content_type
            .template()
            .ok_or(TemplateError::Unroutable(self.content_type))?;
        templates.render(name, PageContext::new(self))
    }

    fn output_name(&self) -> PathBuf {
        self.output_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CompileOptions, compile};
    use crate::test_helpers::{FixtureRenderer, source_doc};
    use tempfile::TempDir;

    fn compiled(rel: &str, raw: &str) -> CompiledDocument {
        compile(
            source_doc(rel, raw),
            &FixtureRenderer::default(),
            CompileOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn builtin_post_renders_title_content_and_toc() {
        let doc = compiled("posts/x.adoc", "= Hello World\n== First Part\n");
        let html = doc.render(&Templates::builtin()).unwrap();

        assert!(html.contains("<title>Hello World</title>"));
        assert!(html.contains("<p>rendered</p>"));
        assert!(html.contains(r##"href="#_first_part""##));
        assert!(html.contains("First Part"));
    }

    #[test]
    fn toc_excludes_document_title() {
        let doc = compiled("pages/about.adoc", "= About Me\n== Contact\n");
        let html = doc.render(&Templates::builtin()).unwrap();
        assert!(!html.contains(r##"href="#_about_me""##));
    }

    #[test]
    fn content_is_not_escaped() {
        let doc = compiled("pages/about.adoc", "= About\n");
        let html = doc.render(&Templates::builtin()).unwrap();
        assert!(html.contains("<p>rendered</p>"));
        assert!(!html.contains("&lt;p&gt;"));
    }

    #[test]
    fn unknown_type_is_unroutable() {
        let doc = compiled("misc/x.adoc", "= X\n");
        let err = doc.render(&Templates::builtin()).unwrap_err();
        assert!(matches!(err, TemplateError::Unroutable(ContentType::Unknown)));
    }

    #[test]
    fn missing_context_key_is_error() {
        let templates = Templates::from_sources([(
            "post.html".to_string(),
            "{{ title }} {{ author }}".to_string(),
        )])
        .unwrap();
        let doc = compiled("posts/x.adoc", "= X\n");
        let err = doc.render(&templates).unwrap_err();
        assert!(matches!(err, TemplateError::Render { ref name, .. } if name == "post.html"));
    }

    #[test]
    fn missing_template_is_error() {
        let templates = Templates::from_sources(Vec::new()).unwrap();
        let doc = compiled("posts/x.adoc", "= X\n");
        assert!(matches!(
            doc.render(&templates),
            Err(TemplateError::Render { .. })
        ));
    }

    #[test]
    fn directory_template_overrides_builtin() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("post.html"), "custom: {{ title }}").unwrap();
        let templates = Templates::load(tmp.path());

        let post = compiled("posts/x.adoc", "= Mine\n");
        assert_eq!(post.render(&templates).unwrap(), "custom: Mine");

        // page.html is not in the directory, so the built-in is used
        let page = compiled("pages/y.adoc", "= Page\n");
        assert!(page.render(&templates).unwrap().contains("<title>Page</title>"));
    }

    #[test]
    fn missing_directory_uses_builtins() {
        let templates = Templates::load(Path::new("/nonexistent/template/dir"));
        let doc = compiled("posts/x.adoc", "= X\n");
        assert!(doc.render(&templates).is_ok());
    }

    #[test]
    fn output_name_is_relative_output_path() {
        let doc = compiled("reading/2023-01-01-book.adoc", "= Book\n");
        assert_eq!(
            doc.output_name(),
            PathBuf::from("reading/2023-01-01-book.html")
        );
    }
}
