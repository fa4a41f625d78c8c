//! Minimal markdown rendering for chat answers.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*?)$").unwrap());
static H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*?)$").unwrap());

/// Render `**bold**`, `*em*`, `# h1` and `## h2` to HTML, turning newlines
/// into `<br>`. Other HTML in the input is escaped.
pub fn render_html(text: &str) -> String {
    let escaped = escape_html(text);
    let html = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let html = EMPHASIS.replace_all(&html, "<em>$1</em>");
    let html = H1.replace_all(&html, "<h1>$1</h1>");
    let html = H2.replace_all(&html, "<h2>$1</h2>");
    html.replace('\n', "<br>")
}

/// Drop the markup for terminal output
pub fn render_plain(text: &str) -> String {
    let plain = BOLD.replace_all(text, "$1");
    let plain = EMPHASIS.replace_all(&plain, "$1");
    let plain = H1.replace_all(&plain, "$1");
    H2.replace_all(&plain, "$1").into_owned()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_markup() {
        assert_eq!(
            render_html("**Entropy** is *always* rising"),
            "<strong>Entropy</strong> is <em>always</em> rising"
        );
    }

    #[test]
    fn test_headings_and_line_breaks() {
        assert_eq!(
            render_html("# Summary\n## Details\nline"),
            "<h1>Summary</h1><br><h2>Details</h2><br>line"
        );
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(render_html("<script>"), "&lt;script&gt;");
    }

    #[test]
    fn test_plain() {
        assert_eq!(render_plain("# Title\n**a** and *b*"), "Title\na and b");
    }
}
