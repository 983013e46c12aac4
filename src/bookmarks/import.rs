//! Bookmark-export HTML importer.
//!
//! Browser bookmark exports are nested `<DL><DT><H3>Folder</H3><DL>...</DL>`
//! trees with `<A HREF="...">` leaves. This importer does a streaming token
//! scan over the raw text instead of building a DOM, so truncated or
//! malformed exports degrade gracefully instead of failing the whole import.

use regex::Regex;

use super::models::ParsedBookmark;

/// Localized names browsers use for the toolbar/root folder. Entries on the
/// folder stack matching one of these (case-insensitively) never become a
/// category label.
const ROOT_FOLDER_NAMES: &[&str] = &["书签栏", "收藏夹栏", "bookmarks bar", "bookmarks"];

/// Parse bookmark-export HTML into a flat list of entries in document order.
///
/// Tracks currently open folders on a stack: an `<H3>` heading becomes the
/// pending folder name, the next `<DL>` pushes it, `</DL>` pops. Each anchor
/// gets the innermost non-root folder name as its category. Anchors whose
/// `href` is not an http(s) URL are dropped.
pub fn parse_bookmarks_html(html: &str) -> Vec<ParsedBookmark> {
    // One alternation scanned left to right: folder heading, folder close,
    // folder open, anchor. Tag and attribute matching is case-insensitive.
    let token_re = Regex::new(
        r#"(?is)<h3[^>]*>(?P<heading>.*?)</h3>|</dl\s*>|<dl[^>]*>|<a\s[^>]*?href\s*=\s*"(?P<href>[^"]*)"[^>]*>(?P<label>.*?)</a\s*>"#,
    )
    .unwrap();

    let mut folder_stack: Vec<String> = Vec::new();
    let mut pending_folder: Option<String> = None;
    let mut entries = Vec::new();

    for caps in token_re.captures_iter(html) {
        if let Some(heading) = caps.name("heading") {
            // Takes effect when the folder's <DL> opens.
            pending_folder = Some(decode_text(heading.as_str()));
        } else if let Some(href) = caps.name("href") {
            let url = href.as_str().trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                // javascript:, place:, ftp: and friends are silently dropped.
                continue;
            }
            let label = caps.name("label").map(|m| m.as_str()).unwrap_or("");
            let mut name = decode_text(label);
            if name.is_empty() {
                name = display_host(url);
            }
            entries.push(ParsedBookmark {
                name,
                url: url.to_string(),
                category: category_for(&folder_stack),
            });
        } else if caps[0].starts_with("</") {
            // Unmatched closes are a no-op so truncated exports still parse.
            folder_stack.pop();
        } else if let Some(name) = pending_folder.take() {
            folder_stack.push(name);
        }
    }

    entries
}

/// Innermost non-root, non-empty folder name, or "" for uncategorized.
fn category_for(folder_stack: &[String]) -> String {
    folder_stack
        .iter()
        .rev()
        .find(|name| !name.is_empty() && !is_root_folder(name))
        .cloned()
        .unwrap_or_default()
}

fn is_root_folder(name: &str) -> bool {
    let lower = name.to_lowercase();
    ROOT_FOLDER_NAMES.iter().any(|root| *root == lower)
}

/// Clean up heading/anchor inner text: strip nested tags, decode HTML
/// entities, collapse whitespace, trim.
fn decode_text(raw: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").unwrap();
    let mut text = tag_re.replace_all(raw, "").to_string();

    text = text.replace("&nbsp;", " ");
    text = html_escape::decode_html_entities(&text).to_string();

    let ws_re = Regex::new(r"\s+").unwrap();
    ws_re.replace_all(&text, " ").trim().to_string()
}

/// Host portion of a URL for display, lowercased with a leading `www.`
/// stripped. Fallback name for anchors with empty text.
fn display_host(url: &str) -> String {
    let rest = url.split("://").nth(1).unwrap_or(url);
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = host.rsplit('@').next().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    let host = host.to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}
