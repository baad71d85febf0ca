/// A parsed Markdown document: the top-level blocks in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// ATX or setext heading
    Heading { level: u8, inlines: Vec<Inline> },
    /// Paragraph, including the implicit paragraph of a tight list item
    Paragraph(Vec<Inline>),
    /// Ordered or unordered list
    List(List),
    /// Fenced or indented code block (raw content)
    Code(String),
    /// Raw HTML block
    Html(String),
    /// Thematic break
    Rule,
    /// Any other container (block quote, table, footnote definition)
    Container(Vec<Block>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

/// An inline node inside a heading or paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Plain literal text
    Text(String),
    /// Code span (raw content without backticks)
    Code(String),
    /// Soft or hard line break
    LineBreak,
    /// Link or image; children are the link text
    Link { url: String, children: Vec<Inline> },
    /// Emphasis, strong emphasis or strikethrough
    Emphasis(Vec<Inline>),
    /// A single raw inline HTML tag, e.g. `<span style="...">`
    Html(String),
    /// An unresolved `[`/`![` opener left behind by reference-style link
    /// parsing, together with the inlines it swallowed.
    LinkDelimiter {
        literal: String,
        children: Vec<Inline>,
    },
    /// Anything else (footnote references, task markers)
    Other,
}

impl Block {
    /// Visit every inline sequence under this block, depth-first, in document order.
    ///
    /// Each call receives one run of siblings, so callers can look at the
    /// nodes following a given inline.
    pub fn for_each_inline_run<'a>(&'a self, f: &mut dyn FnMut(&'a [Inline])) {
        match self {
            Block::Heading { inlines, .. } | Block::Paragraph(inlines) => {
                visit_inline_runs(inlines, f);
            }
            Block::List(list) => {
                for item in &list.items {
                    item.for_each_inline_run(f);
                }
            }
            Block::Container(blocks) => {
                for block in blocks {
                    block.for_each_inline_run(f);
                }
            }
            Block::Code(_) | Block::Html(_) | Block::Rule => {}
        }
    }

    fn collect_inlines<'a>(&'a self, out: &mut Vec<&'a Inline>) {
        match self {
            Block::Heading { inlines, .. } | Block::Paragraph(inlines) => {
                for inline in inlines {
                    push_preorder(inline, out);
                }
            }
            Block::List(list) => {
                for item in &list.items {
                    for block in &item.blocks {
                        block.collect_inlines(out);
                    }
                }
            }
            Block::Container(blocks) => {
                for block in blocks {
                    block.collect_inlines(out);
                }
            }
            Block::Code(_) | Block::Html(_) | Block::Rule => {}
        }
    }
}

fn visit_inline_runs<'a>(run: &'a [Inline], f: &mut dyn FnMut(&'a [Inline])) {
    f(run);
    for inline in run {
        if let Some(children) = inline.children() {
            visit_inline_runs(children, f);
        }
    }
}

impl List {
    /// All list items under this list, nested lists included, in pre-order.
    pub fn descendant_items(&self) -> Vec<&ListItem> {
        let mut out = Vec::new();
        collect_items(self, &mut out);
        out
    }
}

fn collect_items<'a>(list: &'a List, out: &mut Vec<&'a ListItem>) {
    for item in &list.items {
        out.push(item);
        for block in &item.blocks {
            collect_nested_items(block, out);
        }
    }
}

fn collect_nested_items<'a>(block: &'a Block, out: &mut Vec<&'a ListItem>) {
    match block {
        Block::List(list) => collect_items(list, out),
        Block::Container(blocks) => {
            for block in blocks {
                collect_nested_items(block, out);
            }
        }
        _ => {}
    }
}

impl ListItem {
    pub fn for_each_inline_run<'a>(&'a self, f: &mut dyn FnMut(&'a [Inline])) {
        for block in &self.blocks {
            block.for_each_inline_run(f);
        }
    }

    /// Every inline node under this item, in pre-order.
    pub fn descendant_inlines(&self) -> Vec<&Inline> {
        let mut out = Vec::new();
        for block in &self.blocks {
            block.collect_inlines(&mut out);
        }
        out
    }

    /// Text of every `Inline::Text` under this item, in document order.
    pub fn descendant_texts(&self) -> Vec<&str> {
        self.descendant_inlines()
            .into_iter()
            .filter_map(Inline::as_text)
            .collect()
    }

    /// Target of the first link under this item.
    pub fn first_link_url(&self) -> Option<&str> {
        self.descendant_inlines()
            .into_iter()
            .find_map(Inline::as_link)
            .map(|(url, _)| url)
    }
}

fn push_preorder<'a>(inline: &'a Inline, out: &mut Vec<&'a Inline>) {
    out.push(inline);
    if let Some(children) = inline.children() {
        for child in children {
            push_preorder(child, out);
        }
    }
}

impl Inline {
    pub fn children(&self) -> Option<&[Inline]> {
        match self {
            Inline::Link { children, .. }
            | Inline::Emphasis(children)
            | Inline::LinkDelimiter { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<(&str, &[Inline])> {
        match self {
            Inline::Link { url, children } => Some((url.as_str(), children.as_slice())),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Inline::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Every inline node in `run` and below, in pre-order.
pub fn descendants(run: &[Inline]) -> Vec<&Inline> {
    let mut out = Vec::new();
    for inline in run {
        push_preorder(inline, &mut out);
    }
    out
}
