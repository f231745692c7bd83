use adoc_site::blocks::BlockParser;
use adoc_site::document::SourceDocument;
use adoc_site::render::{Asciidoctor, Backend, Renderer};
use adoc_site::templates::Templates;
use adoc_site::{config, output, pipeline, toc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adoc-site")]
#[command(about = "Static site generator for AsciiDoc blogs")]
#[command(long_about = "\
Static site generator for AsciiDoc blogs

Every .adoc file below the source directory becomes one HTML page at the
same relative path in the output directory. The directory a file lives in
decides how it is rendered:

  src/
  ├── pages/about.adoc                 # page.html
  ├── posts/2024-01-01-hello.adoc      # post.html, listed on the index
  ├── posts/images/                    # copied to docs/images/
  ├── research/notes.adoc              # post.html
  ├── reading/2024-02-01-book.adoc     # post.html, listed on the index
  └── posts/xxxx-draft.adoc            # skipped (name contains the skip marker)

Templates are read from the project's template/ directory; any of page.html,
post.html and index.html that is missing there falls back to the built-in.

Documents are converted with asciidoctor, which must be on PATH (or set
renderer.program in config.toml).

Run 'adoc-site gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Source directory
    #[arg(long, default_value = "src", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "docs", global = true)]
    output: PathBuf,

    /// Project directory holding config.toml and the template directory
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Log each rendered page
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the whole site
    Build,
    /// Compile every document without writing anything
    Check,
    /// Print the table of contents of one file
    Toc {
        file: PathBuf,
        /// Indented text instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Render one file to DocBook and print its content blocks
    Blocks {
        file: PathBuf,
        /// Also print elements with no block kind
        #[arg(long)]
        all: bool,
        /// One line per block instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build => {
            let site_config = config::load_config(&cli.project)?;
            init_thread_pool(&site_config.processing);
            let renderer = Asciidoctor::from_config(&site_config.renderer);
            let templates = Templates::load(&cli.project.join(&site_config.templates));

            println!(
                "==> Building {} → {}",
                cli.source.display(),
                cli.output.display()
            );
            let report = pipeline::build(
                &cli.source,
                &cli.output,
                &site_config,
                &renderer,
                &templates,
            )?;
            output::print_build_output(&report);
            if !report.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Check => {
            let site_config = config::load_config(&cli.project)?;
            init_thread_pool(&site_config.processing);
            let renderer = Asciidoctor::from_config(&site_config.renderer);

            println!("==> Checking {}", cli.source.display());
            let compilation = pipeline::compile_site(&cli.source, &site_config, &renderer)?;
            output::print_check_output(&compilation);
            if !compilation.failures.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Toc { file, text } => {
            let raw = std::fs::read_to_string(&file)?;
            let entries = toc::extract(&raw);
            if text {
                output::print_toc(&entries);
            } else {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
        }
        Command::Blocks {
            file,
            all,
            text,
        } => {
            let site_config = config::load_config(&cli.project)?;
            let renderer = Asciidoctor::from_config(&site_config.renderer);
            let source = SourceDocument::read(file_root(&file), &file)?;
            let xml = renderer.render(&source, Backend::DocBook)?;
            let blocks = BlockParser::new()
                .keep_unrecognized(all)
                .parse(&xml)?;
            if text {
                output::print_blocks(&blocks);
            } else {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins; otherwise `info` with `--verbose`, `warn` without.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Directory a single file is read relative to.
fn file_root(file: &Path) -> &Path {
    file.parent().unwrap_or(Path::new(""))
}
