//! Snippet kinds stored in the cache.
//!
//! A snippet is an owned snapshot of a fragment of a source document. The
//! `extract` constructors copy only the lines the snippet covers out of the
//! borrowed document text, so a stored snippet never refers back into the
//! document tree it came from.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a snippet came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Source file of the document.
    pub file: PathBuf,
    /// First line of the snippet, 1-based.
    pub start: usize,
    /// Line after the last line of the snippet. `None` runs to end of file.
    pub end: Option<usize>,
    /// Reference id of the snippet's node, if it had one.
    pub refid: Option<String>,
}

impl Origin {
    /// Creates an origin covering `[start, end)` of `file`.
    pub fn new(file: impl Into<PathBuf>, start: usize, end: Option<usize>) -> Self {
        Self {
            file: file.into(),
            start,
            end,
            refid: None,
        }
    }

    /// Sets the reference id.
    pub fn with_refid(mut self, refid: impl Into<String>) -> Self {
        self.refid = Some(refid.into());
        self
    }

    /// Copies the lines covered by this origin out of `source`.
    fn slice(&self, source: &str) -> Vec<String> {
        let skip = self.start.saturating_sub(1);
        let take = match self.end {
            Some(end) => end.saturating_sub(1).saturating_sub(skip),
            None => usize::MAX,
        };
        source
            .lines()
            .skip(skip)
            .take(take)
            .map(str::to_string)
            .collect()
    }
}

/// Single-character tag used to filter snippets by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnippetKind {
    /// Document title and possible subtitle.
    Headline,
    /// Code block with a description.
    Code,
}

impl SnippetKind {
    /// Returns the tag character (`d` for headlines, `c` for code).
    pub fn as_char(self) -> char {
        match self {
            SnippetKind::Headline => 'd',
            SnippetKind::Code => 'c',
        }
    }

    /// Parses a tag character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(SnippetKind::Headline),
            'c' => Some(SnippetKind::Code),
            _ => None,
        }
    }
}

impl fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Document title and optional subtitle.
///
/// A headline stands for the whole document, so its text is the full source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    /// Document title.
    pub title: String,
    /// Document subtitle.
    pub subtitle: Option<String>,
    /// Location of the title in the source.
    pub origin: Origin,
    text: Vec<String>,
}

impl Headline {
    /// Snapshots a headline out of the document `source`.
    pub fn extract(title: &str, subtitle: Option<&str>, origin: Origin, source: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
            origin,
            text: source.lines().map(str::to_string).collect(),
        }
    }
}

/// A code block together with the paragraphs describing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    /// Description paragraphs preceding the block.
    pub description: Vec<String>,
    /// Language of the block (may be empty).
    pub language: String,
    /// Location of the description and block in the source.
    pub origin: Origin,
    text: Vec<String>,
}

impl Code {
    /// Snapshots a code snippet covering `origin` out of the document `source`.
    pub fn extract<S: AsRef<str>>(
        description: &[S],
        language: &str,
        origin: Origin,
        source: &str,
    ) -> Self {
        let text = origin.slice(source);
        Self {
            description: description.iter().map(|p| p.as_ref().to_string()).collect(),
            language: language.to_string(),
            origin,
            text,
        }
    }
}

/// A stored snippet, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Snippet {
    /// See [`Headline`].
    Headline(Headline),
    /// See [`Code`].
    Code(Code),
}

impl Snippet {
    /// The kind tag.
    pub fn kind(&self) -> SnippetKind {
        match self {
            Snippet::Headline(_) => SnippetKind::Headline,
            Snippet::Code(_) => SnippetKind::Code,
        }
    }

    /// Rendered source lines, without line terminators.
    pub fn lines(&self) -> &[String] {
        match self {
            Snippet::Headline(h) => &h.text,
            Snippet::Code(c) => &c.text,
        }
    }

    /// One-line excerpt for listings, if one can be derived.
    pub fn excerpt(&self) -> Option<String> {
        match self {
            Snippet::Headline(h) => {
                let title = h.title.replace(['\n', '\r'], "");
                Some(match &h.subtitle {
                    Some(subtitle) => format!("<{title} ~{}~>", subtitle.replace(['\n', '\r'], "")),
                    None => format!("<{title}>"),
                })
            }
            Snippet::Code(c) => {
                let first = c.description.first()?;
                Some(format!("/{}/ {}", c.language, first.replace(['\n', '\r'], "")))
            }
        }
    }

    /// Where the snippet came from.
    pub fn origin(&self) -> &Origin {
        match self {
            Snippet::Headline(h) => &h.origin,
            Snippet::Code(c) => &c.origin,
        }
    }
}

impl From<Headline> for Snippet {
    fn from(h: Headline) -> Self {
        Snippet::Headline(h)
    }
}

impl From<Code> for Snippet {
    fn from(c: Code) -> Self {
        Snippet::Code(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Rust Notes\n==========\n\nBuild in release mode:\n\n.. code:: sh\n\n   cargo build --release\n\nMore text.\n";

    #[test]
    fn code_extracts_scope_only() {
        let code = Code::extract(
            &["Build in release mode:"],
            "sh",
            Origin::new("notes/rust.rst", 4, Some(9)),
            DOC,
        );
        let snippet = Snippet::from(code);
        assert_eq!(
            snippet.lines(),
            &[
                "Build in release mode:",
                "",
                ".. code:: sh",
                "",
                "   cargo build --release",
            ]
        );
        assert_eq!(snippet.kind(), SnippetKind::Code);
    }

    #[test]
    fn open_scope_runs_to_end() {
        let origin = Origin::new("x.rst", 9, None);
        assert_eq!(origin.slice(DOC), vec!["", "More text."]);
    }

    #[test]
    fn code_excerpt_uses_first_paragraph() {
        let code = Code::extract(
            &["Build in\nrelease mode:", "second"],
            "sh",
            Origin::new("x.rst", 1, Some(2)),
            DOC,
        );
        assert_eq!(
            Snippet::Code(code).excerpt().as_deref(),
            Some("/sh/ Build inrelease mode:")
        );
    }

    #[test]
    fn code_without_description_has_no_excerpt() {
        let empty: [&str; 0] = [];
        let code = Code::extract(&empty, "py", Origin::new("x.rst", 1, Some(2)), DOC);
        assert!(Snippet::Code(code).excerpt().is_none());
    }

    #[test]
    fn headline_excerpt_and_text() {
        let plain = Headline::extract("Rust Notes", None, Origin::new("x.rst", 1, Some(3)), DOC);
        let snippet = Snippet::from(plain);
        assert_eq!(snippet.excerpt().as_deref(), Some("<Rust Notes>"));
        assert_eq!(snippet.lines().len(), DOC.lines().count());
        assert_eq!(snippet.kind().as_char(), 'd');

        let sub = Headline::extract("Rust", Some("notes"), Origin::new("x.rst", 1, Some(3)), DOC);
        assert_eq!(
            Snippet::from(sub).excerpt().as_deref(),
            Some("<Rust ~notes~>")
        );
    }

    #[test]
    fn excerpts_stay_on_one_line() {
        let headline = Headline::extract(
            "Line one\nline two",
            Some("sub\r\ntitle"),
            Origin::new("x.rst", 1, Some(3)),
            DOC,
        );
        assert_eq!(
            Snippet::from(headline).excerpt().as_deref(),
            Some("<Line oneline two ~subtitle~>")
        );
        let code = Code::extract(&["Run\r\nit"], "sh", Origin::new("x.rst", 1, Some(2)), DOC);
        assert_eq!(Snippet::from(code).excerpt().as_deref(), Some("/sh/ Runit"));
    }

    #[test]
    fn kind_chars_roundtrip() {
        for kind in [SnippetKind::Headline, SnippetKind::Code] {
            assert_eq!(SnippetKind::from_char(kind.as_char()), Some(kind));
        }
        assert!(SnippetKind::from_char('x').is_none());
    }

    #[test]
    fn origin_refid() {
        let origin = Origin::new("x.rst", 1, None).with_refid("build-release");
        assert_eq!(origin.refid.as_deref(), Some("build-release"));
    }
}
