use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Marker appended to shortened text.
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Shortens `text` to at most `max_chars` characters followed by "...".
///
/// Text that already fits is returned borrowed. When cutting, whitespace at
/// both ends of the kept part is trimmed, so `"Hello world"` cut at 6
/// becomes `"Hello..."` rather than `"Hello ..."` and leading indentation is
/// dropped too. Counts `char`s, not bytes, so multi-byte text never splits
/// mid-codepoint.
///
/// # Examples
///
/// ```
/// use newsdesk::util::truncate_text;
///
/// assert_eq!(truncate_text("Short", 10), "Short");
/// assert_eq!(truncate_text("Hello world", 6), "Hello...");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}{}", text[..cut].trim(), ELLIPSIS)),
    }
}

/// Builds a URL-safe slug from an article title.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, and strips leading/trailing dashes. Non-ASCII letters count as
/// separators. Distinct titles can produce the same slug.
///
/// # Examples
///
/// ```
/// use newsdesk::util::generate_slug;
///
/// assert_eq!(generate_slug("GPT-5: What's New?"), "gpt-5-what-s-new");
/// ```
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Display width of a string in terminal columns (CJK and emoji count as 2).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Fits `s` into exactly `width` terminal columns for table output.
///
/// Longer text is cut and ends in "..."; shorter text is right-padded with
/// spaces. Widths of 3 or less are filled with as many characters as fit.
pub fn fit_to_width(s: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;

    if display_width(s) > width {
        let budget = if width > ELLIPSIS_WIDTH {
            width - ELLIPSIS_WIDTH
        } else {
            width
        };
        for c in s.chars() {
            let w = UnicodeWidthChar::width(c).unwrap_or(0);
            if used + w > budget {
                break;
            }
            out.push(c);
            used += w;
        }
        if width > ELLIPSIS_WIDTH {
            out.push_str(ELLIPSIS);
            used += ELLIPSIS_WIDTH;
        }
    } else {
        out.push_str(s);
        used = display_width(s);
    }

    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

/// Removes control characters (ESC included) from backend-supplied text
/// before it is written to a terminal. Newlines and tabs are kept.
pub fn sanitize_for_terminal(s: &str) -> Cow<'_, str> {
    let is_unsafe = |c: char| c.is_control() && c != '\n' && c != '\t';
    if !s.chars().any(is_unsafe) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_unsafe(c)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_fits() {
        let result = truncate_text("exactly ten", 11);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "exactly ten");
    }

    #[test]
    fn test_truncate_text_cuts_and_trims() {
        assert_eq!(truncate_text("Hello world", 5), "Hello...");
        assert_eq!(truncate_text("Hello world", 6), "Hello...");
        assert_eq!(truncate_text("Hello world", 7), "Hello w...");
    }

    #[test]
    fn test_truncate_text_trims_leading_whitespace_when_cutting() {
        assert_eq!(truncate_text("  padded text here", 9), "padded...");
        // Fits, so left alone
        assert_eq!(truncate_text("  padded", 9), "  padded");
    }

    #[test]
    fn test_truncate_text_multibyte() {
        assert_eq!(truncate_text("日本語のテキスト", 3), "日本語...");
    }

    #[test]
    fn test_truncate_text_zero() {
        assert_eq!(truncate_text("abc", 0), "...");
        assert_eq!(truncate_text("", 0), "");
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("  --AI  Regulation!! 2024--  "), "ai-regulation-2024");
        assert_eq!(generate_slug("Llama 3.1 405B"), "llama-3-1-405b");
        assert_eq!(generate_slug("Über KI"), "ber-ki");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_fit_to_width_pads_and_cuts() {
        assert_eq!(fit_to_width("abc", 5), "abc  ");
        assert_eq!(fit_to_width("Hello World", 8), "Hello...");
        assert_eq!(fit_to_width("Hello", 2), "He");
        assert_eq!(fit_to_width("你好世界", 7), "你好...");
        assert_eq!(display_width(&fit_to_width("你好世界", 6)), 6);
    }

    #[test]
    fn test_sanitize_for_terminal() {
        assert!(matches!(sanitize_for_terminal("plain\ttext\n"), Cow::Borrowed(_)));
        assert_eq!(sanitize_for_terminal("\x1b[31mred\x1b[0m"), "[31mred[0m");
        assert_eq!(sanitize_for_terminal("a\x00b\x7fc"), "abc");
    }
}
