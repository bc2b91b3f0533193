//! Width-bounded rendering of title paths.

/// Separator placed between titles.
pub const SEPARATOR: &str = " > ";

/// Placeholder marking elided characters.
pub const ELLIPSIS: &str = "...";

/// Default maximum width of a rendered title path, in characters.
pub const DEFAULT_WIDTH: usize = 50;

/// Default number of trailing characters kept when truncating.
pub const DEFAULT_TAIL: usize = 30;

/// Joins `titles` root-to-leaf, truncating the middle to fit `width` characters.
///
/// When the joined path is too long, it keeps the leading
/// `width - tail - placeholder` characters, then `placeholder`, then the last
/// `tail` characters, so the leaf title stays visible.
pub fn join<S: AsRef<str>>(titles: &[S], width: usize, tail: usize, placeholder: &str) -> String {
    let parts: Vec<&str> = titles.iter().map(|t| t.as_ref()).collect();
    let full = parts.join(SEPARATOR);

    let chars: Vec<char> = full.chars().collect();
    if chars.len() <= width {
        return full;
    }

    // The result never exceeds `width`: the placeholder is cut first, then the tail.
    let placeholder: String = placeholder.chars().take(width).collect();
    let room = width - placeholder.chars().count();
    let tail = tail.min(room);
    let head = room - tail;
    let mut out: String = chars[..head].iter().collect();
    out.push_str(&placeholder);
    out.extend(&chars[chars.len() - tail..]);
    out
}
