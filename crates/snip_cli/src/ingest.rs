//! `snip ingest`: updates the cache from a batch of extracted snippets.
//!
//! A batch is the JSON record of one documentation build: the documents it
//! removed and, for every document it resolved, the document's source file
//! and the snippets found in it. Line ranges are 1-based with an exclusive
//! end; source paths are relative to the batch file.
//!
//! ```json
//! {
//!   "project": "wiki",
//!   "removed": ["old/page"],
//!   "documents": [{
//!     "docname": "howto/shell",
//!     "source": "howto/shell.rst",
//!     "snippets": [
//!       {"kind": "headline", "title": "Shell", "start": 1, "end": 3},
//!       {"kind": "code", "description": ["List files."], "language": "sh",
//!        "titlepath": ["Shell"], "keywords": [["ls", 1.0]], "start": 5, "end": 8}
//!     ]
//!   }]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use snip_cache::{BuildSession, Code, Headline, Item, Origin, Snippet};
use tracing::debug;

use crate::context::load_settings;
use crate::{GlobalArgs, IngestArgs};

/// One build's worth of changes.
#[derive(Debug, Deserialize)]
struct Batch {
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    removed: Vec<String>,
    #[serde(default)]
    documents: Vec<BatchDocument>,
}

#[derive(Debug, Deserialize)]
struct BatchDocument {
    docname: String,
    source: PathBuf,
    #[serde(default)]
    snippets: Vec<BatchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum BatchSnippet {
    Headline {
        title: String,
        #[serde(default)]
        subtitle: Option<String>,
        #[serde(flatten)]
        common: SnippetCommon,
    },
    Code {
        #[serde(default)]
        description: Vec<String>,
        #[serde(default)]
        language: String,
        #[serde(flatten)]
        common: SnippetCommon,
    },
}

#[derive(Debug, Deserialize)]
struct SnippetCommon {
    #[serde(default)]
    titlepath: Vec<String>,
    #[serde(default)]
    keywords: Vec<(String, f64)>,
    start: usize,
    #[serde(default)]
    end: Option<usize>,
    #[serde(default)]
    refid: Option<String>,
}

/// What an ingest changed.
#[derive(Debug, Default, PartialEq, Eq)]
struct IngestReport {
    purged: usize,
    documents: usize,
    added: usize,
}

/// Runs the `snip ingest` command.
pub fn run(args: &IngestArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let batch = read_batch(&args.batch)?;

    let project = args
        .project
        .clone()
        .or_else(|| batch.project.clone())
        .unwrap_or_else(|| settings.config.build.project.clone());
    let patterns = settings.config.compiled_patterns()?;

    let session = BuildSession::start(&settings.cache_dir, &project, patterns)
        .with_layout(settings.config.layout());
    let base = args.batch.parent().unwrap_or(Path::new(""));
    let (report, cache) = ingest(session, &batch, base)?;

    if !global.quiet {
        eprintln!(
            "ingested {} document(s): {} snippet(s) added, {} purged, {} cached",
            report.documents,
            report.added,
            report.purged,
            cache.len()
        );
    }
    Ok(0)
}

fn read_batch(path: &Path) -> Result<Batch, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read batch {}: {e}", path.display()))?;
    let batch = serde_json::from_str(&text)
        .map_err(|e| format!("invalid batch {}: {e}", path.display()))?;
    Ok(batch)
}

/// Feeds `batch` through `session` and finishes it.
fn ingest(
    mut session: BuildSession,
    batch: &Batch,
    base: &Path,
) -> Result<(IngestReport, snip_cache::SnippetCache), Box<dyn std::error::Error>> {
    let mut report = IngestReport {
        purged: session.documents_removed(&batch.removed)?,
        ..IngestReport::default()
    };

    for document in &batch.documents {
        let path = base.join(&document.source);
        let source = std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read source {}: {e}", path.display()))?;
        let items: Vec<Item> = document
            .snippets
            .iter()
            .map(|snippet| to_item(session.project(), document, snippet, &source))
            .collect();
        let keys = session.document_resolved(&document.docname, items)?;
        debug!(docname = document.docname.as_str(), added = keys.len(), "resolved document");
        report.documents += 1;
        report.added += keys.len();
    }

    let cache = session.finish()?;
    Ok((report, cache))
}

fn to_item(project: &str, document: &BatchDocument, snippet: &BatchSnippet, source: &str) -> Item {
    let (snippet, common): (Snippet, &SnippetCommon) = match snippet {
        BatchSnippet::Headline {
            title,
            subtitle,
            common,
        } => (
            Headline::extract(title, subtitle.as_deref(), origin(document, common), source).into(),
            common,
        ),
        BatchSnippet::Code {
            description,
            language,
            common,
        } => (
            Code::extract(description.as_slice(), language, origin(document, common), source).into(),
            common,
        ),
    };
    Item::new(
        project,
        document.docname.as_str(),
        common.titlepath.clone(),
        snippet,
        common.keywords.clone(),
    )
}

fn origin(document: &BatchDocument, common: &SnippetCommon) -> Origin {
    let origin = Origin::new(document.source.clone(), common.start, common.end);
    match &common.refid {
        Some(refid) => origin.with_refid(refid.as_str()),
        None => origin,
    }
}
