//! HTML directory listings.

use std::borrow::Cow;

/// Renders a listing of `entries` for the directory at `request_path`.
///
/// Each entry links to the request path joined with the entry name. Names
/// are HTML-escaped, and characters that would end or alter a URL path are
/// percent-encoded in the link target, in the directory part as well as the
/// entry name.
pub fn render_listing(request_path: &str, entries: &[String]) -> String {
    let title = escape_html(request_path);
    let mut doc = String::new();

    doc.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Index of ");
    doc.push_str(&title);
    doc.push_str("</title></head><body><h1>Index of ");
    doc.push_str(&title);
    doc.push_str("</h1><ul>");

    for name in entries {
        doc.push_str("<li><a href=\"");
        doc.push_str(&escape_html(&entry_href(request_path, name)));
        doc.push_str("\">");
        doc.push_str(&escape_html(name));
        doc.push_str("</a></li>");
    }

    doc.push_str("</ul></body></html>\n");
    doc
}

/// Link target for `name` inside the directory at `request_path`.
///
/// `request_path` is the decoded path, so every segment is encoded again.
pub fn entry_href(request_path: &str, name: &str) -> String {
    let mut href = String::with_capacity(request_path.len() + name.len() + 1);
    for segment in request_path.split('/').filter(|s| !s.is_empty()) {
        href.push('/');
        href.push_str(&encode_segment(segment));
    }
    href.push('/');
    href.push_str(&encode_segment(name));
    href
}

fn encode_segment(name: &str) -> Cow<'_, str> {
    if !name.contains(['%', '#', '?', ' ']) {
        return Cow::Borrowed(name);
    }

    let mut out = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        match c {
            '%' => out.push_str("%25"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
