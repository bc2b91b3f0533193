//! `snip mgmt` and `snip purge-doc`: cache statistics, listings and maintenance.

use std::fmt::Write as _;

use snip_cache::{SnippetCache, SnippetKind, StoreStat};
use tracing::info;

use crate::context::{load_settings, open_cache};
use crate::{GlobalArgs, MgmtArgs, PurgeDocArgs};

/// Runs the `snip mgmt` command.
///
/// Each flag prints one section; several flags may be combined. `--purge`
/// runs last so the other sections still describe the cache before it.
pub fn run(args: &MgmtArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let kinds = parse_kinds(&args.kinds)?;
    let mut cache = open_cache(&settings)?;

    if args.stat {
        println!("snippets are loaded from {}", cache.root().display());
        print!("{}", render_stat(&cache.stat()));
    }

    if args.dump_config {
        print!("{}", settings.config.to_toml()?);
    }

    if args.dump_index {
        print!("{}", cache.render_index()?);
    }

    if args.list {
        print!("{}", render_list(&mut cache, kinds.as_deref())?);
    }

    if args.purge {
        let count = cache.len();
        cache.clear()?;
        cache.dump()?;
        info!(purged = count, "purged snippet cache");
        if !global.quiet {
            eprintln!("purged {count} snippet(s)");
        }
    }

    Ok(0)
}

/// Runs the `snip purge-doc` command.
pub fn purge_doc(args: &PurgeDocArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let mut cache = open_cache(&settings)?;

    let purged = cache.purge_doc(&args.project, &args.docname)?;
    cache.dump()?;

    if !global.quiet {
        eprintln!(
            "purged {purged} snippet(s) of {}",
            document_label(&args.project, &args.docname)
        );
    }
    Ok(0)
}

fn document_label(project: &str, docname: &str) -> String {
    if project.is_empty() {
        docname.to_string()
    } else {
        format!("{project}:{docname}")
    }
}

/// Parses a kind filter. `None` means every kind.
fn parse_kinds(filter: &str) -> Result<Option<Vec<SnippetKind>>, String> {
    if filter.contains('*') {
        return Ok(None);
    }
    filter.chars()
        .map(|c| SnippetKind::from_char(c).ok_or_else(|| format!("unknown snippet kind '{c}'")))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn render_stat(stat: &StoreStat) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} project(s), {} document(s) and {} snippet(s)",
        stat.project_count(),
        stat.document_count(),
        stat.snippet_count()
    );
    for (project, documents) in &stat.projects {
        let name = if project.is_empty() { "<unnamed>" } else { project.as_str() };
        let snippets: usize = documents.values().sum();
        let _ = writeln!(out, "project {name}:");
        let _ = writeln!(out, "\t{} document(s), {snippets} snippet(s)", documents.len());
    }
    out
}

fn render_list(
    cache: &mut SnippetCache,
    kinds: Option<&[SnippetKind]>,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut out = String::new();
    for (key, item) in cache.list()? {
        let kind = item.snippet.kind();
        if kinds.is_some_and(|kinds| !kinds.contains(&kind)) {
            continue;
        }
        let excerpt = item.snippet.excerpt().unwrap_or_default();
        let _ = writeln!(
            out,
            "{key}  {kind}  {}  {excerpt}",
            document_label(&item.project, &item.docname)
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snip_cache::{Code, Headline, Item, Origin};

    fn filled_cache(dir: &std::path::Path) -> SnippetCache {
        let mut cache = SnippetCache::new(dir);
        cache.add(Item::new(
            "wiki",
            "index",
            vec![],
            Headline::extract("Home", None, Origin::new("index.rst", 1, Some(2)), "Home\n"),
            vec![],
        ));
        cache.add(Item::new(
            "wiki",
            "shell",
            vec!["Shell".to_string()],
            Code::extract(&["List files."], "sh", Origin::new("shell.rst", 1, None), "ls"),
            vec![("ls".to_string(), 1.0)],
        ));
        cache.add(Item::new(
            "",
            "scratch",
            vec![],
            Code::extract(&["Show dir."], "sh", Origin::new("scratch.rst", 1, None), "pwd"),
            vec![],
        ));
        cache
    }

    #[test]
    fn kinds_parse() {
        assert_eq!(parse_kinds("*").unwrap(), None);
        assert_eq!(
            parse_kinds("dc").unwrap(),
            Some(vec![SnippetKind::Headline, SnippetKind::Code])
        );
        assert!(parse_kinds("x").is_err());
    }

    #[test]
    fn stat_counts_projects_and_documents() {
        let dir = tempfile::tempdir().unwrap();
        let cache = filled_cache(dir.path());
        let text = render_stat(&cache.stat());
        assert!(text.starts_with("2 project(s), 3 document(s) and 3 snippet(s)\n"));
        assert!(text.contains("project wiki:\n\t2 document(s), 2 snippet(s)\n"));
        assert!(text.contains("project <unnamed>:\n"));
    }

    #[test]
    fn list_filters_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = filled_cache(dir.path());

        let all = render_list(&mut cache, None).unwrap();
        assert_eq!(all.lines().count(), 3);

        let code = render_list(&mut cache, Some(&[SnippetKind::Code][..])).unwrap();
        assert_eq!(code.lines().count(), 2);
        assert!(code.contains("wiki:shell"));
        assert!(code.contains("  scratch  /sh/ Show dir."));
        assert!(!code.contains("<Home>"));
    }

    #[test]
    fn unnamed_project_label() {
        assert_eq!(document_label("", "index"), "index");
        assert_eq!(document_label("wiki", "index"), "wiki:index");
    }
}
