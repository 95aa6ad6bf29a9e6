pub mod script;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use doc_model::{
    Annotation, AnnotationBody, AnnotationStyle, Color, Document, PageSource, Rect,
};
use pdf_engine::PdfDocument;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use storage::{load_sidecar, write_sidecar, AppConfig, JsonSidecar, Storage};
use viewer_core::{Session, ViewState, Viewport, ZoomLimits};

#[derive(Debug, Parser)]
#[command(name = "folio-cli")]
#[command(about = "Folio document viewer CLI")]
pub struct Cli {
    /// Log more (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Directory for config and recent files (defaults to FOLIO_DATA_DIR or
    /// the per-user data directory).
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable document metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List the pages containing a term, starting from a page.
    Search {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        term: String,
        #[arg(long, default_value_t = 1)]
        from_page: u32,
    },
    /// Print the saved annotations of a document.
    Annotations {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Add a highlight and save it to the annotation sidecar.
    Highlight {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page coordinates in points: X1,Y1,X2,Y2
        #[arg(long, value_parser = parse_rect)]
        rect: Rect,
        #[arg(long)]
        color: Option<Color>,
    },
    /// Drive a viewer session from a JSON script and save the result.
    ///
    /// The viewport starts out matching the first page at the configured
    /// zoom, so device and page coordinates coincide at zoom 1.
    Replay {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
    /// Render a page to PNG.
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Copy one page into a new PDF.
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show or change configuration values.
    Config {
        key: Option<String>,
        /// JSON value; bare words are taken as strings.
        value: Option<String>,
        #[arg(long, conflicts_with_all = ["key", "value"])]
        reset: bool,
    },
    /// List recently opened documents.
    Recent {
        #[arg(long)]
        clear: bool,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: PageSizeOutput,
    annotation_count: usize,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    term: &'a str,
    pages: Vec<u32>,
    unreadable_pages: Vec<String>,
}

#[derive(Debug, Serialize)]
struct HighlightOutput {
    id: String,
    page: u32,
    rect: Rect,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
    #[serde(flatten)]
    log: script::ReplayLog,
    page: u32,
    zoom: f32,
    annotation_count: usize,
    saved: bool,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    let storage = match cli.data_dir {
        Some(root) => Storage::with_root(root),
        None => Storage::from_env_or_default().context("failed to locate data directory")?,
    };

    match cli.command {
        Commands::Info { file } => run_info(&storage, &file),
        Commands::Search { file, term, from_page } => run_search(&storage, &file, &term, from_page),
        Commands::Annotations { file } => run_annotations(&file),
        Commands::Highlight { file, page, rect, color } => {
            run_highlight(&storage, &file, page, rect, color)
        }
        Commands::Replay { file, script } => run_replay(&storage, &file, &script),
        Commands::Render { file, page, scale, output } => {
            run_render(&storage, &file, page, scale, output.as_deref())
        }
        Commands::Export { file, page, output } => {
            run_export(&storage, &file, page, output.as_deref())
        }
        Commands::Config { key, value, reset } => run_config(&storage, key, value, reset),
        Commands::Recent { clear } => run_recent(&storage, clear),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    // `run` may be called more than once per process in tests.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

fn run_info(storage: &Storage, file: &Path) -> Result<()> {
    let document = open_document(storage, file)?;

    let size = document.page_dimensions(0);
    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count: document.page_count(),
        first_page_size_pt: PageSizeOutput { width: size.width_pt, height: size.height_pt },
        annotation_count: document.annotations().len(),
    };

    print_json(&payload)
}

fn run_search(storage: &Storage, file: &Path, term: &str, from_page: u32) -> Result<()> {
    let page_index = page_index(from_page, "--from-page")?;
    let document = open_document(storage, file)?;
    let mut session = Session::new(document, ZoomLimits::default());
    if !session.go_to(page_index) {
        anyhow::bail!("--from-page {from_page} is past the last page");
    }

    let outcome = session.search(term);
    let payload = SearchOutput {
        term: term.trim(),
        pages: outcome.pages.iter().map(|page| page + 1).collect(),
        unreadable_pages: outcome.failed.iter().map(ToString::to_string).collect(),
    };

    print_json(&payload)
}

fn run_annotations(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;
    let annotations: Vec<Annotation> = load_sidecar(file)
        .with_context(|| format!("failed to read annotations for {}", file.display()))?;
    print_json(&annotations)
}

fn run_highlight(
    storage: &Storage,
    file: &Path,
    page: u32,
    rect: Rect,
    color: Option<Color>,
) -> Result<()> {
    let page_index = page_index(page, "--page")?;
    let mut document = open_document(storage, file)?;

    let style = match color {
        Some(color) => AnnotationStyle { color, ..AnnotationStyle::highlight() },
        None => AnnotationStyle::highlight(),
    };
    let id = document
        .annotations_mut()
        .add(page_index, AnnotationBody::Highlight { rect }, style)
        .context("highlight was rejected")?;

    document
        .save_with(&JsonSidecar, false, |bytes| write_sidecar(file, bytes))
        .context("failed to save annotations")?;

    print_json(&HighlightOutput { id: id.to_string(), page, rect: rect.normalized() })
}

fn run_replay(storage: &Storage, file: &Path, script_path: &Path) -> Result<()> {
    let bytes = fs::read(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let steps = script::parse(&bytes)
        .with_context(|| format!("invalid script {}", script_path.display()))?;

    let config = load_config(storage);
    let document = open_document(storage, file)?;
    let view = ViewState::new(document.page_count(), ZoomLimits::default())
        .with_zoom(config.zoom_level);
    let mut session = Session::with_view(document, view);

    let first = session.document().page_dimensions(0);
    let zoom = session.view().zoom();
    session.set_viewport(Some(Viewport::new(first.width_pt * zoom, first.height_pt * zoom)));

    let log = script::replay(&mut session, steps);

    let saved = session.document().has_unsaved_changes();
    if saved {
        session
            .save_with(&JsonSidecar, false, |bytes| write_sidecar(file, bytes))
            .context("failed to save annotations")?;
    }

    print_json(&ReplayOutput {
        log,
        page: session.current_page() + 1,
        zoom: session.view().zoom(),
        annotation_count: session.document().annotations().len(),
        saved,
    })
}

fn run_render(
    storage: &Storage,
    file: &Path,
    page: u32,
    scale: f32,
    output: Option<&Path>,
) -> Result<()> {
    let page_index = page_index(page, "--page")?;
    let document = open_document(storage, file)?;

    let image =
        document.source().render(page_index, scale).context("failed to render page")?;

    let output =
        output.map(ToOwned::to_owned).unwrap_or_else(|| default_page_output(file, page, "png"));

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    image
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());

    Ok(())
}

fn run_export(storage: &Storage, file: &Path, page: u32, output: Option<&Path>) -> Result<()> {
    let page_index = page_index(page, "--page")?;
    let document = open_document(storage, file)?;

    let output =
        output.map(ToOwned::to_owned).unwrap_or_else(|| default_page_output(file, page, "pdf"));
    if output == file {
        anyhow::bail!("refusing to overwrite {} with one of its pages", file.display());
    }
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    document
        .source()
        .export_page(page_index, &output)
        .with_context(|| format!("failed to export page {page}"))?;

    println!("{}", output.display());

    Ok(())
}

fn run_config(
    storage: &Storage,
    key: Option<String>,
    value: Option<String>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = storage.reset_config().context("failed to reset config")?;
        return print_json(&config);
    }

    let mut config = storage.load_config().context("failed to read config")?;
    match (key, value) {
        (None, _) => print_json(&config),
        (Some(key), None) => {
            let value = config.get(&key).with_context(|| format!("unknown config key: {key}"))?;
            print_json(&value)
        }
        (Some(key), Some(raw)) => {
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            config.set(&key, value).with_context(|| format!("cannot set {key}"))?;
            storage.save_config(&config).context("failed to save config")?;
            print_json(&config)
        }
    }
}

fn run_recent(storage: &Storage, clear: bool) -> Result<()> {
    let config = load_config(storage);
    let mut recent = storage
        .load_recent_files(config.recent_files_limit)
        .context("failed to read recent files")?;

    if clear {
        recent.clear();
        storage.save_recent_files(&recent).context("failed to save recent files")?;
    }

    print_json(&recent.files())
}

fn open_document(storage: &Storage, file: &Path) -> Result<Document<PdfDocument>> {
    ensure_pdf_exists(file)?;

    let pdf = PdfDocument::open(file).context("failed to open PDF")?;
    let annotations = load_sidecar(file)
        .with_context(|| format!("failed to read annotations for {}", file.display()))?;
    let document = Document::with_annotations(pdf, annotations)
        .context("saved annotations do not fit the document")?;

    remember_recent(storage, file);
    Ok(document)
}

/// Recent-file bookkeeping never fails the command.
fn remember_recent(storage: &Storage, file: &Path) {
    let config = load_config(storage);
    let result = storage.load_recent_files(config.recent_files_limit).and_then(|mut recent| {
        recent.add(file);
        storage.save_recent_files(&recent)
    });
    if let Err(err) = result {
        log::warn!("could not update recent files: {err}");
    }
}

fn load_config(storage: &Storage) -> AppConfig {
    storage.load_config().unwrap_or_else(|err| {
        log::warn!("using default config: {err}");
        AppConfig::default()
    })
}

fn print_json<T: Serialize + ?Sized>(payload: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;
    println!("{json}");
    Ok(())
}

fn page_index(page: u32, flag: &str) -> Result<u32> {
    page.checked_sub(1).with_context(|| format!("{flag} is 1-based and must be >= 1"))
}

fn parse_rect(raw: &str) -> Result<Rect, String> {
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid number in rect: {err}"))?;
    match values.as_slice() {
        [x1, y1, x2, y2] => Ok(Rect::new(*x1, *y1, *x2, *y2).normalized()),
        _ => Err(format!("expected X1,Y1,X2,Y2 but got {} value(s)", values.len())),
    }
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_page_output(file: &Path, page: u32, extension: &str) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("page");

    file.with_file_name(format!("{stem}-page-{page}.{extension}"))
}
