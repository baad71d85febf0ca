use crate::markdown::types::{descendants, Inline, ListItem};

use super::types::{Authorship, Metadata};

/// Heading text that opens the overview section of a PR entry.
pub const OVERVIEW_HEADING: &str = "概要";

/// Caption text preceding the label chips in the metadata list.
pub const LABEL_PLACEHOLDER: &str = "ラベル";

const BACKGROUND_COLOR: &str = "background-color:";
const BOT_SUFFIX: &[u8] = b"[bot]";
const ASSISTANT_MENTION: &str = "@copilot";

/// Text of the first link in a heading, used to match the table of contents.
///
/// Only the first link is considered; its first text child is the key.
pub fn heading_link_text(inlines: &[Inline]) -> Option<&str> {
    descendants(inlines)
        .into_iter()
        .find_map(Inline::as_link)
        .and_then(|(_, children)| children.iter().find_map(Inline::as_text))
}

/// First text node anywhere under a heading.
pub fn first_text(inlines: &[Inline]) -> Option<&str> {
    descendants(inlines).into_iter().find_map(Inline::as_text)
}

/// Build the metadata for a PR heading such as `## [#1234](url) Fix null ref`.
///
/// The first link's first text is the raw PR number; text and code spans make
/// up the title. An unresolved link delimiter right after a text node keeps
/// its literal and text content in the title.
pub fn heading_metadata(inlines: &[Inline], labels: Vec<String>) -> Metadata {
    let mut pr_number: Option<&str> = None;
    let mut title = String::new();

    for (i, inline) in inlines.iter().enumerate() {
        match inline {
            Inline::Link { children, .. } => {
                if pr_number.is_none() {
                    pr_number = children.iter().find_map(Inline::as_text);
                }
            }
            Inline::Text(text) => {
                title.push_str(text);
                if let Some(Inline::LinkDelimiter { literal, children }) = inlines.get(i + 1) {
                    title.push_str(literal);
                    for child in children.iter().filter_map(Inline::as_text) {
                        title.push_str(child);
                    }
                }
            }
            Inline::Code(code) => title.push_str(code),
            _ => {}
        }
    }

    let pr_number = pr_number.unwrap_or_default();
    Metadata {
        anchor_id: pr_number.trim_start_matches('#').to_string(),
        title_text: format!("{} {}", pr_number, title.trim()),
        labels,
    }
}

fn is_label_text(text: &str) -> bool {
    !text.trim().is_empty() && !text.contains(LABEL_PLACEHOLDER)
}

/// Label names of the labels item, in document order.
pub fn labels(item: &ListItem) -> Vec<String> {
    item.descendant_texts()
        .into_iter()
        .filter(|text| is_label_text(text))
        .map(|text| text.trim().to_string())
        .collect()
}

/// `(label, color)` pairs declared through `background-color` styles in the
/// labels item, in document order.
///
/// A color belongs to the nearest following text sibling that looks like a
/// label; a style with nothing after it is dropped.
pub fn label_colors(item: &ListItem) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    item.for_each_inline_run(&mut |run| {
        for (i, inline) in run.iter().enumerate() {
            let Inline::Html(tag) = inline else {
                continue;
            };
            let Some(color) = background_color(tag) else {
                continue;
            };
            let label = run[i + 1..]
                .iter()
                .filter_map(Inline::as_text)
                .find(|text| is_label_text(text));
            if let Some(label) = label {
                pairs.push((label.trim().to_string(), color.to_string()));
            }
        }
    });
    pairs
}

/// Value of the `background-color` declaration in a raw HTML tag.
fn background_color(tag: &str) -> Option<&str> {
    let start = tag.find(BACKGROUND_COLOR)? + BACKGROUND_COLOR.len();
    let rest = &tag[start..];
    let end = rest.find(';')?;
    let color = rest[..end].trim();
    (!color.is_empty()).then_some(color)
}

/// Author name from the author item: the second text span, after the caption.
pub fn author(item: &ListItem) -> Option<String> {
    item.descendant_texts()
        .get(1)
        .map(|name| name.trim().to_string())
}

/// Bot names end with `[bot]`; assistant-authored PRs mention `@Copilot`.
/// Both checks ignore ASCII case.
pub fn classify(author: Option<&str>) -> Authorship {
    let Some(name) = author else {
        return Authorship::Community;
    };
    let bytes = name.as_bytes();
    let bot_suffix = bytes.len() >= BOT_SUFFIX.len()
        && bytes[bytes.len() - BOT_SUFFIX.len()..].eq_ignore_ascii_case(BOT_SUFFIX);
    if bot_suffix || name.to_ascii_lowercase().contains(ASSISTANT_MENTION) {
        Authorship::Bot
    } else {
        Authorship::Community
    }
}

/// Flatten inline content to plain text, dropping markup but keeping the
/// text of links and emphasis.
pub fn flatten(inlines: &[Inline]) -> String {
    let mut out = String::new();
    flatten_into(inlines, &mut out);
    out
}

fn flatten_into(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Code(code) => out.push_str(code),
            Inline::LineBreak => out.push('\n'),
            Inline::Link { children, .. } | Inline::Emphasis(children) => {
                flatten_into(children, out)
            }
            _ => {}
        }
    }
}
