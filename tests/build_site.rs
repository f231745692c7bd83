//! End-to-end builds through the public API.
//!
//! Most tests use an in-process renderer that turns each heading line into an
//! `<h2>` so page bodies can be checked against their source. The
//! `asciidoctor_stub` test runs the real subprocess renderer against a small
//! shell script standing in for `asciidoctor`.

use adoc_site::config::{self, BodySource, SiteConfig};
use adoc_site::document::SourceDocument;
use adoc_site::pipeline;
use adoc_site::render::{Backend, RenderError, Renderer};
use adoc_site::templates::Templates;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Renders `== ` lines as headings and everything else as paragraphs.
struct LineRenderer;

impl Renderer for LineRenderer {
    fn render(&self, source: &SourceDocument, backend: Backend) -> Result<String, RenderError> {
        let mut out = String::new();
        match backend {
            Backend::Html => {
                for line in source.raw.lines().skip(1) {
                    if let Some(heading) = line.strip_prefix("== ") {
                        out.push_str(&format!("<h2>{heading}</h2>\n"));
                    } else if !line.trim().is_empty() {
                        out.push_str(&format!("<p>{line}</p>\n"));
                    }
                }
            }
            Backend::DocBook => {
                out.push_str("<article><info><title>ignored</title></info>");
                for line in source.raw.lines().skip(1) {
                    if let Some(heading) = line.strip_prefix("== ") {
                        out.push_str(&format!("<section><title>{heading}</title></section>"));
                    } else if !line.trim().is_empty() {
                        out.push_str(&format!("<simpara>{line}</simpara>"));
                    }
                }
                out.push_str("</article>");
            }
        }
        Ok(out)
    }
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn blog() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(
        &src,
        "posts/2024-03-01-rust.adoc",
        "= Learning Rust\n\nIntro text.\n\n== Ownership\n\n== What's *Next*\n",
    );
    write(&src, "posts/2023-11-20-hello.adoc", "= Hello\n\nFirst post.\n");
    write(&src, "posts/xxxx-2024-04-01-draft.adoc", "= Draft\n");
    write(&src, "pages/about.adoc", "= About\n\nWho I am.\n");
    write(&src, "reading/2024-01-05-sicp.adoc", "= SICP\n\nNotes.\n");
    write(&src, "posts/images/diagram.svg", "<svg/>");
    tmp
}

#[test]
fn builds_complete_site() {
    let tmp = blog();
    let src = tmp.path().join("src");
    let out = tmp.path().join("docs");

    let report = pipeline::build(
        &src,
        &out,
        &SiteConfig::default(),
        &LineRenderer,
        &Templates::builtin(),
    )
    .unwrap();

    assert!(report.is_success());
    assert_eq!(report.pages.len(), 4);
    assert!(out.join("posts/2024-03-01-rust.html").is_file());
    assert!(out.join("posts/2023-11-20-hello.html").is_file());
    assert!(out.join("pages/about.html").is_file());
    assert!(out.join("reading/2024-01-05-sicp.html").is_file());
    assert!(!out.join("posts/xxxx-2024-04-01-draft.html").exists());
    assert!(out.join("images/diagram.svg").is_file());
}

#[test]
fn post_toc_links_match_anchor_rules() {
    let tmp = blog();
    let src = tmp.path().join("src");
    let out = tmp.path().join("docs");
    pipeline::build(
        &src,
        &out,
        &SiteConfig::default(),
        &LineRenderer,
        &Templates::builtin(),
    )
    .unwrap();

    let html = fs::read_to_string(out.join("posts/2024-03-01-rust.html")).unwrap();
    assert!(html.contains("<title>Learning Rust</title>"));
    assert!(html.contains("<h2>Ownership</h2>"));
    assert!(html.contains(r##"href="#_ownership""##));
    assert!(html.contains(r##"href="#_whats_next""##));
    assert!(html.contains("Next</a>"));
    assert!(!html.contains("*Next*</a>"));
    assert!(!html.contains(r##"href="#_learning_rust""##));
}

#[test]
fn index_lists_newest_first() {
    let tmp = blog();
    let src = tmp.path().join("src");
    let out = tmp.path().join("docs");
    let report = pipeline::build(
        &src,
        &out,
        &SiteConfig::default(),
        &LineRenderer,
        &Templates::builtin(),
    )
    .unwrap();
    assert_eq!(report.index.posts, 2);
    assert_eq!(report.index.reading, 1);

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    let rust = index.find("/posts/2024-03-01-rust.html").unwrap();
    let hello = index.find("/posts/2023-11-20-hello.html").unwrap();
    assert!(rust < hello);
    assert!(index.contains("/reading/2024-01-05-sicp.html"));
    assert!(!index.contains("/pages/about.html"));
}

#[test]
fn rebuild_is_byte_identical() {
    let tmp = blog();
    let src = tmp.path().join("src");
    let first = tmp.path().join("first");
    let second = tmp.path().join("second");
    let config = SiteConfig::default();
    let templates = Templates::builtin();
    pipeline::build(&src, &first, &config, &LineRenderer, &templates).unwrap();
    pipeline::build(&src, &second, &config, &LineRenderer, &templates).unwrap();

    for rel in [
        "index.html",
        "posts/2024-03-01-rust.html",
        "pages/about.html",
    ] {
        assert_eq!(
            fs::read(first.join(rel)).unwrap(),
            fs::read(second.join(rel)).unwrap(),
            "{rel} differs between builds"
        );
    }
}

#[test]
fn project_templates_override_builtins() {
    let tmp = blog();
    let src = tmp.path().join("src");
    let out = tmp.path().join("docs");
    write(
        tmp.path(),
        "template/page.html",
        "<main class=\"custom\">{{ title }}|{{ content }}</main>",
    );

    pipeline::build(
        &src,
        &out,
        &SiteConfig::default(),
        &LineRenderer,
        &Templates::load(&tmp.path().join("template")),
    )
    .unwrap();

    let about = fs::read_to_string(out.join("pages/about.html")).unwrap();
    assert!(about.starts_with("<main class=\"custom\">About|"));
    let post = fs::read_to_string(out.join("posts/2023-11-20-hello.html")).unwrap();
    assert!(post.contains("<title>Hello</title>"));
}

#[test]
fn blocks_body_from_config_file() {
    let tmp = blog();
    let src = tmp.path().join("src");
    let out = tmp.path().join("docs");
    fs::write(
        tmp.path().join("config.toml"),
        "[renderer]\nbody = \"blocks\"\n",
    )
    .unwrap();
    let config = config::load_config(tmp.path()).unwrap();
    assert_eq!(config.renderer.body, BodySource::Blocks);

    pipeline::build(&src, &out, &config, &LineRenderer, &Templates::builtin()).unwrap();

    let html = fs::read_to_string(out.join("posts/2024-03-01-rust.html")).unwrap();
    assert!(html.contains(r#"<h2 id="_ownership">Ownership</h2>"#));
    assert!(html.contains(r#"<hr class="section-start">"#));
    assert!(html.contains("<p>Intro text.</p>"));
}

#[cfg(unix)]
#[test]
fn asciidoctor_stub() {
    use adoc_site::render::Asciidoctor;
    use std::os::unix::fs::PermissionsExt;

    let tmp = blog();
    let script = tmp.path().join("fake-asciidoctor");
    fs::write(
        &script,
        "#!/bin/sh\n\
         cat > /dev/null\n\
         case \"$*\" in\n\
           *docbook5*) echo '<article><simpara>docbook</simpara></article>' ;;\n\
           *) echo '<p>from stub</p>' ;;\n\
         esac\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let src = tmp.path().join("src");
    let out = tmp.path().join("docs");
    let renderer = Asciidoctor::new(&script);
    let report = pipeline::build(
        &src,
        &out,
        &SiteConfig::default(),
        &renderer,
        &Templates::builtin(),
    )
    .unwrap();

    assert!(report.is_success());
    let about = fs::read_to_string(out.join("pages/about.html")).unwrap();
    assert!(about.contains("<p>from stub</p>"));
}
