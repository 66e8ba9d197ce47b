//! Description HTML filtering.
//!
//! Container descriptions accept a limited HTML subset. The filter here
//! is deliberately conservative: script and style blocks are removed
//! wholesale, event-handler attributes and javascript: URLs are
//! stripped, and everything else passes through. The plain-text half of
//! a description is always derived from the filtered HTML.

/// Filter untrusted description HTML for storage.
pub fn filter_description_html(html: &str) -> String {
    let without_blocks = strip_blocks(strip_blocks(html, "script"), "style");
    strip_dangerous_attributes(&without_blocks)
}

/// Wrap plain text in a paragraph, escaping HTML metacharacters.
pub fn escape_to_paragraph(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("<p>{}</p>", escape(text))
}

/// Reduce HTML to its text content.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Remove `<tag ...>...</tag>` blocks, including their content.
fn strip_blocks(html: impl AsRef<str>, tag: &str) -> String {
    let html = html.as_ref();
    let lower = html.to_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(start) = lower[pos..].find(&open) {
        let start = pos + start;
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => {
                // Unterminated block: drop the rest.
                return out;
            }
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Remove on* event attributes and javascript: URLs from remaining tags.
fn strip_dangerous_attributes(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        let Some(end) = rest[start..].find('>') else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&clean_tag(&rest[start..start + end + 1]));
        rest = &rest[start + end + 1..];
    }
    if !rest.contains('<') {
        out.push_str(rest);
    }
    out
}

/// A tag carrying an event handler or javascript: URL loses all of its
/// attributes; splitting quoted values apart is not worth the risk of
/// leaking half an attribute through.
fn clean_tag(tag: &str) -> String {
    let lower = tag.to_lowercase();
    let has_handler = lower
        .split_whitespace()
        .skip(1)
        .any(|part| part.starts_with("on") && part.contains('='));
    if !has_handler && !lower.contains("javascript:") {
        return tag.to_string();
    }

    let inner = tag.trim_start_matches('<').trim_start_matches('/');
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if tag.starts_with("</") {
        format!("</{name}>")
    } else {
        format!("<{name}>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_blocks_removed() {
        let html = "<p>before</p><script>alert(1)</script><p>after</p>";
        assert_eq!(
            filter_description_html(html),
            "<p>before</p><p>after</p>"
        );
    }

    #[test]
    fn test_event_handlers_removed() {
        let html = "<p onclick=\"steal()\">text</p>";
        assert_eq!(filter_description_html(html), "<p>text</p>");
    }

    #[test]
    fn test_javascript_urls_removed() {
        let html = "<a href=\"javascript:alert(1)\">x</a>";
        assert_eq!(filter_description_html(html), "<a>x</a>");
    }

    #[test]
    fn test_plain_markup_untouched() {
        let html = "<p>Hello <strong>world</strong></p>";
        assert_eq!(filter_description_html(html), html);
    }

    #[test]
    fn test_escape_to_paragraph() {
        assert_eq!(escape_to_paragraph("a < b & c"), "<p>a &lt; b &amp; c</p>");
        assert_eq!(escape_to_paragraph(""), "");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <em>world</em></p>"), "Hello world");
        assert_eq!(strip_tags("a &amp; b"), "a & b");
    }
}
