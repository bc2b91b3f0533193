//! `snip show`: prints one snippet.

use snip_cache::{Item, SnippetCache};

use crate::context::{load_settings, open_cache};
use crate::{GlobalArgs, ShowArgs};

/// Runs the `snip show` command.
///
/// Returns exit code 1 when no snippet has the given ID.
pub fn run(args: &ShowArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let mut cache = open_cache(&settings)?;

    match render(&mut cache, &args.id, args.location)? {
        Some(text) => {
            println!("{text}");
            Ok(0)
        }
        None => {
            eprintln!("error: no snippet with id {}", args.id);
            Ok(1)
        }
    }
}

fn render(
    cache: &mut SnippetCache,
    id: &str,
    location: bool,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let Some(item) = cache.get(id)? else {
        return Ok(None);
    };
    Ok(Some(if location {
        location_of(item)
    } else {
        item.snippet.lines().join("\n")
    }))
}

/// `file:start` with the refid appended as `#refid` when known.
fn location_of(item: &Item) -> String {
    let origin = item.snippet.origin();
    let mut text = format!("{}:{}", origin.file.display(), origin.start);
    if let Some(refid) = &origin.refid {
        text.push('#');
        text.push_str(refid);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use snip_cache::{Code, Origin};

    #[test]
    fn renders_lines_and_location() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SnippetCache::new(dir.path());
        let key = cache.add(Item::new(
            "wiki",
            "shell",
            vec![],
            Code::extract(
                &["List files."],
                "sh",
                Origin::new("shell.rst", 2, Some(4)).with_refid("listing"),
                "intro\nls\n-la\ntail\n",
            ),
            vec![],
        ));

        let text = render(&mut cache, &key, false).unwrap().unwrap();
        assert_eq!(text, "ls\n-la");
        let loc = render(&mut cache, &key, true).unwrap().unwrap();
        assert_eq!(loc, "shell.rst:2#listing");
    }

    #[test]
    fn unknown_id_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SnippetCache::new(dir.path());
        assert!(render(&mut cache, "0000000", false).unwrap().is_none());
    }
}
