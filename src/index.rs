//! The landing page.
//!
//! Lists posts and reading notes, newest first. Source files follow a
//! `YYYY-MM-DD-slug.adoc` naming convention, so sorting file names in
//! descending order gives reverse-chronological order without parsing
//! any dates. Files without a date prefix still sort by name.
//!
//! The index only borrows from compiled documents: title, URL and file name.

use serde::Serialize;
use std::path::PathBuf;

use crate::document::{CompiledDocument, ContentType};
use crate::templates::{Renderable, TemplateError, Templates};

pub const INDEX_TEMPLATE: &str = "index.html";
pub const INDEX_FILE: &str = "index.html";

/// One listed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry<'a> {
    pub title: &'a str,
    pub url: String,
    pub file_name: String,
    /// `YYYY-MM-DD` prefix of the file name, when present.
    pub date: Option<String>,
}

impl<'a> IndexEntry<'a> {
    fn new(doc: &'a CompiledDocument) -> Self {
        let file_name = doc.file_name();
        Self {
            title: &doc.title,
            url: doc.url(),
            date: date_prefix(&file_name).map(str::to_string),
            file_name,
        }
    }
}

/// The `YYYY-MM-DD` at the start of a file name.
fn date_prefix(name: &str) -> Option<&str> {
    let prefix = name.get(..10)?;
    let well_formed = prefix.char_indices().all(|(i, c)| match i {
        4 | 7 => c == '-',
        _ => c.is_ascii_digit(),
    });
    well_formed.then_some(prefix)
}

/// Posts and reading notes selected for the landing page, sorted newest first.
#[derive(Debug, Serialize)]
pub struct Index<'a> {
    pub posts: Vec<IndexEntry<'a>>,
    pub reading: Vec<IndexEntry<'a>>,
}

impl<'a> Index<'a> {
    pub fn aggregate<I>(docs: I) -> Self
    where
        I: IntoIterator<Item = &'a CompiledDocument>,
    {
        let mut posts = Vec::new();
        let mut reading = Vec::new();
        for doc in docs {
            match doc.content_type {
                ContentType::Post => posts.push(IndexEntry::new(doc)),
                ContentType::Reading => reading.push(IndexEntry::new(doc)),
                _ => {}
            }
        }
        sort_newest_first(&mut posts);
        sort_newest_first(&mut reading);
        Self { posts, reading }
    }
}

fn sort_newest_first(entries: &mut [IndexEntry<'_>]) {
    entries.sort_by(|a, b| b.file_name.cmp(&a.file_name));
}

impl Renderable for Index<'_> {
    fn render(&self, templates: &Templates) -> Result<String, TemplateError> {
        templates.render(INDEX_TEMPLATE, self)
    }

    fn output_name(&self) -> PathBuf {
        PathBuf::from(INDEX_FILE)
    }
}
