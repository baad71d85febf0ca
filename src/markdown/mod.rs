pub mod types;

pub use types::{Block, Document, Inline, List, ListItem};

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use tracing::{debug, instrument};

/// Parse Markdown text into a block tree.
///
/// Tables, footnotes, strikethrough and task lists are recognized so that
/// digests written with those extensions keep their block structure; their
/// content ends up in `Block::Container`.
#[instrument(skip(text), fields(bytes = text.len()))]
pub fn parse(text: &str) -> Document {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let mut builder = TreeBuilder {
        events: Parser::new_ext(text, options),
    };
    let blocks = builder.blocks_until_end();
    debug!(blocks = blocks.len(), "built block tree");
    Document { blocks }
}

struct TreeBuilder<I> {
    events: I,
}

impl<'a, I> TreeBuilder<I>
where
    I: Iterator<Item = Event<'a>>,
{
    /// Read blocks until the end of the enclosing container (the matching
    /// `End` event is consumed) or the end of input.
    ///
    /// Inline events that appear directly inside a container (tight list
    /// items, table cells) are gathered into an implicit paragraph.
    fn blocks_until_end(&mut self) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut loose: Vec<Inline> = Vec::new();

        while let Some(event) = self.events.next() {
            let block = match event {
                Event::End(_) => break,
                Event::Start(Tag::Paragraph) => Some(Block::Paragraph(self.inlines_until_end())),
                Event::Start(Tag::Heading { level, .. }) => Some(Block::Heading {
                    level: heading_level(level),
                    inlines: self.inlines_until_end(),
                }),
                Event::Start(Tag::List(start)) => Some(Block::List(self.list(start.is_some()))),
                Event::Start(Tag::CodeBlock(_)) => Some(Block::Code(self.raw_until_end())),
                Event::Start(Tag::HtmlBlock) => Some(Block::Html(self.raw_until_end())),
                Event::Rule => Some(Block::Rule),
                Event::Start(tag) if is_inline_tag(&tag) => {
                    push_inline(&mut loose, self.inline_container(tag));
                    None
                }
                Event::Start(_) => Some(Block::Container(self.blocks_until_end())),
                other => {
                    if let Some(inline) = leaf_inline(other) {
                        push_inline(&mut loose, inline);
                    }
                    None
                }
            };

            if let Some(block) = block {
                if !loose.is_empty() {
                    blocks.push(Block::Paragraph(std::mem::take(&mut loose)));
                }
                blocks.push(block);
            }
        }

        if !loose.is_empty() {
            blocks.push(Block::Paragraph(loose));
        }
        blocks
    }

    fn list(&mut self, ordered: bool) -> List {
        let mut items = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(Tag::Item) => items.push(ListItem {
                    blocks: self.blocks_until_end(),
                }),
                Event::End(_) => break,
                _ => {}
            }
        }
        List { ordered, items }
    }

    /// Read inline content until the matching `End` event.
    fn inlines_until_end(&mut self) -> Vec<Inline> {
        let mut inlines = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) => {
                    let inline = self.inline_container(tag);
                    push_inline(&mut inlines, inline);
                }
                other => {
                    if let Some(inline) = leaf_inline(other) {
                        push_inline(&mut inlines, inline);
                    }
                }
            }
        }
        inlines
    }

    fn inline_container(&mut self, tag: Tag<'a>) -> Inline {
        match tag {
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => Inline::Link {
                url: dest_url.to_string(),
                children: self.inlines_until_end(),
            },
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough => {
                Inline::Emphasis(self.inlines_until_end())
            }
            _ => {
                self.inlines_until_end();
                Inline::Other
            }
        }
    }

    /// Concatenate the raw text of a code or HTML block.
    fn raw_until_end(&mut self) -> String {
        let mut raw = String::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                    raw.push_str(&text)
                }
                _ => {}
            }
        }
        raw
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn leaf_inline(event: Event<'_>) -> Option<Inline> {
    let inline = match event {
        Event::Text(text) => Inline::Text(text.to_string()),
        Event::Code(code) => Inline::Code(code.to_string()),
        Event::InlineHtml(html) | Event::Html(html) => Inline::Html(html.to_string()),
        Event::SoftBreak | Event::HardBreak => Inline::LineBreak,
        Event::FootnoteReference(_) | Event::TaskListMarker(_) => Inline::Other,
        _ => return None,
    };
    Some(inline)
}

/// Append an inline, merging adjacent text so that a literal split by the
/// tokenizer (e.g. around brackets) stays one node.
fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let Inline::Text(next) = &inline {
        if let Some(Inline::Text(prev)) = inlines.last_mut() {
            prev.push_str(next);
            return;
        }
    }
    inlines.push(inline);
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
