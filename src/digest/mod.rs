pub mod extract;
pub mod types;

pub use types::{AnalysisResult, Authorship, Metadata, Summary};

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::markdown::{Block, Document, Inline, List};

/// Items every PR metadata list must carry: author, created at, merged at, labels.
const METADATA_ITEMS: usize = 4;
const AUTHOR_ITEM: usize = 0;
const LABELS_ITEM: usize = 3;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Metadata list for {heading:?} has {found} items, expected at least {expected}")]
    Structure {
        heading: String,
        expected: usize,
        found: usize,
    },
}

/// Analyze a parsed digest document.
///
/// Walks the top-level blocks once. The first list is the table of contents;
/// every later heading whose link text appears in it opens a PR entry, the
/// next list supplies that entry's metadata, and a `概要` heading marks the
/// paragraph that becomes its summary.
#[instrument(skip(document), fields(blocks = document.blocks.len()))]
pub fn analyze(document: &Document) -> Result<AnalysisResult, AnalysisError> {
    let mut walker = DigestWalker::new();
    for block in &document.blocks {
        walker.visit(block)?;
    }
    let result = walker.finish();
    debug!(
        total = result.total_count(),
        community = result.community_count(),
        bots = result.bot_count(),
        labels = result.label_count(),
        summaries = result.summaries().len(),
        "digest analyzed"
    );
    Ok(result)
}

/// What the walker expects to see next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    None,
    /// A metadata list was just read; the next heading opens the entry body.
    Metadata,
    /// Inside the overview section; the next paragraph is the summary.
    Overview,
    /// Inside some other section of the entry body.
    Unknown,
}

/// Single-pass state machine over the top-level blocks of a digest.
struct DigestWalker<'a> {
    position: Position,
    /// Link targets of the table of contents; `None` until the first list.
    toc: Option<HashSet<String>>,
    pending_heading: Option<&'a [Inline]>,
    current: Option<Metadata>,

    total_count: usize,
    bot_count: usize,
    label_index: BTreeMap<String, Vec<Metadata>>,
    label_colors: HashMap<String, String>,
    community: Vec<Metadata>,
    bots: Vec<Metadata>,
    summaries: HashMap<String, Summary>,
}

impl<'a> DigestWalker<'a> {
    fn new() -> Self {
        Self {
            position: Position::None,
            toc: None,
            pending_heading: None,
            current: None,
            total_count: 0,
            bot_count: 0,
            label_index: BTreeMap::new(),
            label_colors: HashMap::new(),
            community: Vec::new(),
            bots: Vec::new(),
            summaries: HashMap::new(),
        }
    }

    fn visit(&mut self, block: &'a Block) -> Result<(), AnalysisError> {
        match block {
            Block::Heading { inlines, .. } => self.on_heading(inlines),
            Block::List(list) => self.on_list(list)?,
            Block::Paragraph(inlines) => self.on_paragraph(inlines),
            _ => {}
        }
        Ok(())
    }

    fn on_heading(&mut self, inlines: &'a [Inline]) {
        let Some(toc) = &self.toc else {
            return;
        };

        if self.position == Position::Metadata {
            self.position = if extract::first_text(inlines) == Some(extract::OVERVIEW_HEADING) {
                Position::Overview
            } else {
                Position::Unknown
            };
            return;
        }

        match extract::heading_link_text(inlines) {
            Some(key) if toc.contains(key) => {
                debug!(pr = key, "matched PR heading");
                self.pending_heading = Some(inlines);
            }
            _ => {}
        }
    }

    fn on_list(&mut self, list: &'a List) -> Result<(), AnalysisError> {
        if self.toc.is_none() {
            self.read_toc(list);
            return Ok(());
        }
        let Some(heading) = self.pending_heading.take() else {
            return Ok(());
        };

        let items = list.descendant_items();
        if items.len() < METADATA_ITEMS {
            return Err(AnalysisError::Structure {
                heading: extract::heading_link_text(heading)
                    .unwrap_or_default()
                    .to_string(),
                expected: METADATA_ITEMS,
                found: items.len(),
            });
        }

        let labels_item = items[LABELS_ITEM];
        for (label, color) in extract::label_colors(labels_item) {
            self.label_colors.entry(label).or_insert(color);
        }
        let metadata = extract::heading_metadata(heading, extract::labels(labels_item));

        for label in &metadata.labels {
            self.label_index
                .entry(label.clone())
                .or_default()
                .push(metadata.clone());
        }

        let author = extract::author(items[AUTHOR_ITEM]);
        let authorship = extract::classify(author.as_deref());
        debug!(
            pr = %metadata.anchor_id,
            author = author.as_deref().unwrap_or("-"),
            %authorship,
            labels = metadata.labels.len(),
            "read PR metadata"
        );
        match authorship {
            Authorship::Bot => {
                self.bot_count += 1;
                self.bots.push(metadata.clone());
            }
            Authorship::Community => self.community.push(metadata.clone()),
        }

        self.current = Some(metadata);
        self.position = Position::Metadata;
        Ok(())
    }

    fn read_toc(&mut self, list: &List) {
        let mut toc = HashSet::new();
        for item in list.descendant_items() {
            self.total_count += 1;
            if let Some(url) = item.first_link_url() {
                toc.insert(url.trim().to_string());
            }
        }
        debug!(entries = self.total_count, links = toc.len(), "read table of contents");
        self.toc = Some(toc);
    }

    fn on_paragraph(&mut self, inlines: &[Inline]) {
        if self.position == Position::Overview {
            if let Some(current) = &self.current {
                if !self.summaries.contains_key(&current.anchor_id) {
                    self.summaries.insert(
                        current.anchor_id.clone(),
                        Summary {
                            overview: extract::flatten(inlines),
                        },
                    );
                } else {
                    debug!(pr = %current.anchor_id, "duplicate overview ignored");
                }
            }
        }
        self.position = Position::None;
    }

    fn finish(self) -> AnalysisResult {
        AnalysisResult {
            total_count: self.total_count,
            bot_count: self.bot_count,
            label_index: self.label_index,
            label_colors: self.label_colors,
            community: self.community,
            bots: self.bots,
            summaries: self.summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{self, ListItem};
    use pretty_assertions::assert_eq;

    const SAMPLE_DIGEST: &str = include_str!("../../tests/fixtures/sample_digest.md");

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn link(url: &str, label: &str) -> Inline {
        Inline::Link {
            url: url.to_string(),
            children: vec![text(label)],
        }
    }

    fn heading(inlines: Vec<Inline>) -> Block {
        Block::Heading { level: 2, inlines }
    }

    fn list(items: Vec<Vec<Inline>>) -> Block {
        Block::List(List {
            ordered: false,
            items: items
                .into_iter()
                .map(|inlines| ListItem {
                    blocks: vec![Block::Paragraph(inlines)],
                })
                .collect(),
        })
    }

    fn toc(numbers: &[&str]) -> Block {
        list(
            numbers
                .iter()
                .map(|n| vec![link(&format!("#{}", n), &format!("#{}", n))])
                .collect(),
        )
    }

    fn pr_heading(number: &str, title: &str) -> Block {
        heading(vec![
            link(&format!("https://github.com/dotnet/runtime/pull/{}", number), &format!("#{}", number)),
            text(&format!(" {}", title)),
        ])
    }

    fn metadata_list(author: &str, labels: &[&str]) -> Block {
        let mut label_inlines = vec![text("ラベル: ")];
        for label in labels {
            label_inlines.push(Inline::Html(
                "<span style=\"background-color: #ededed; color: #000000;\">".to_string(),
            ));
            label_inlines.push(text(label));
            label_inlines.push(Inline::Html("</span>".to_string()));
        }
        list(vec![
            vec![text("作成者: "), link("https://github.com/x", author)],
            vec![text("作成日時: 2025/01/14")],
            vec![text("マージ日時: 2025/01/15")],
            label_inlines,
        ])
    }

    fn paragraph(s: &str) -> Block {
        Block::Paragraph(vec![text(s)])
    }

    fn doc(blocks: Vec<Block>) -> Document {
        Document { blocks }
    }

    #[test]
    fn test_single_entry_with_overview() {
        let document = doc(vec![
            toc(&["1"]),
            pr_heading("1", "Fix null ref"),
            metadata_list("octocat", &["bug"]),
            heading(vec![text("概要")]),
            paragraph("Fixes a crash."),
        ]);
        let result = analyze(&document).unwrap();
        assert_eq!(result.total_count(), 1);
        assert_eq!(result.bot_count(), 0);
        assert_eq!(result.community().len(), 1);
        assert_eq!(result.community()[0].anchor_id, "1");
        assert_eq!(result.community()[0].title_text, "#1 Fix null ref");
        assert_eq!(result.summary("1").unwrap().overview, "Fixes a crash.");
        assert_eq!(result.label_color("bug"), Some("#ededed"));
        assert_eq!(result.label_index()["bug"].len(), 1);
    }

    #[test]
    fn test_bot_and_community_partition() {
        let document = doc(vec![
            toc(&["1", "2", "3"]),
            pr_heading("1", "Bump deps"),
            metadata_list("dependabot[bot]", &[]),
            heading(vec![text("概要")]),
            paragraph("Bumps deps."),
            pr_heading("2", "Add API"),
            metadata_list("octocat", &["api"]),
            paragraph("Adds an API."),
            pr_heading("3", "Refactor"),
            metadata_list("Copilot (cc @Copilot)", &["api"]),
        ]);
        let result = analyze(&document).unwrap();
        assert_eq!(result.total_count(), 3);
        assert_eq!(result.bot_count(), 2);
        let bots: Vec<_> = result.bots().iter().map(|m| m.anchor_id.as_str()).collect();
        assert_eq!(bots, vec!["1", "3"]);
        assert_eq!(result.community().len(), 1);
        assert_eq!(result.community().len() + result.bots().len(), result.total_count());
        let api: Vec<_> = result.label_index()["api"].iter().map(|m| m.anchor_id.as_str()).collect();
        assert_eq!(api, vec!["2", "3"]);
    }

    #[test]
    fn test_three_item_metadata_list_is_structure_error() {
        let document = doc(vec![
            toc(&["1"]),
            pr_heading("1", "Short"),
            list(vec![vec![text("a")], vec![text("b")], vec![text("c")]]),
        ]);
        let err = analyze(&document).unwrap_err();
        let AnalysisError::Structure { heading, expected, found } = err;
        assert_eq!(heading, "#1");
        assert_eq!(expected, 4);
        assert_eq!(found, 3);
    }

    #[test]
    fn test_four_item_metadata_list_without_author_defaults_to_community() {
        let document = doc(vec![
            toc(&["1"]),
            pr_heading("1", "Minimal"),
            list(vec![vec![text("a")], vec![text("b")], vec![text("c")], vec![text("d")]]),
        ]);
        let result = analyze(&document).unwrap();
        assert_eq!(result.community().len(), 1);
        assert_eq!(result.community()[0].labels, vec!["d"]);
        assert!(result.label_colors().is_empty());
    }

    #[test]
    fn test_unmatched_heading_is_skipped() {
        let document = doc(vec![
            toc(&["1", "2"]),
            pr_heading("9", "Not listed"),
            metadata_list("octocat", &[]),
            pr_heading("2", "Listed"),
            metadata_list("octocat", &[]),
        ]);
        let result = analyze(&document).unwrap();
        assert_eq!(result.total_count(), 2);
        assert_eq!(result.community().len(), 1);
        assert_eq!(result.community()[0].anchor_id, "2");
    }

    #[test]
    fn test_non_overview_section_has_no_summary() {
        let document = doc(vec![
            toc(&["1"]),
            pr_heading("1", "Title"),
            metadata_list("octocat", &[]),
            heading(vec![text("変更内容")]),
            paragraph("files"),
            heading(vec![text("概要")]),
            paragraph("too late"),
        ]);
        let result = analyze(&document).unwrap();
        assert!(result.summary("1").is_none());
    }

    #[test]
    fn test_first_summary_wins_for_repeated_pr() {
        let document = doc(vec![
            toc(&["1"]),
            pr_heading("1", "First"),
            metadata_list("octocat", &[]),
            heading(vec![text("概要")]),
            paragraph("first"),
            pr_heading("1", "Again"),
            metadata_list("octocat", &[]),
            heading(vec![text("概要")]),
            paragraph("second"),
        ]);
        let result = analyze(&document).unwrap();
        assert_eq!(result.community().len(), 2);
        assert_eq!(result.summary("1").unwrap().overview, "first");
    }

    #[test]
    fn test_label_color_first_definition_wins() {
        let mut second = metadata_list("octocat", &[]);
        if let Block::List(list) = &mut second {
            list.items[3].blocks = vec![Block::Paragraph(vec![
                Inline::Html("<span style=\"background-color: #ff0000;\">".to_string()),
                text("bug"),
            ])];
        }
        let document = doc(vec![
            toc(&["1", "2"]),
            pr_heading("1", "One"),
            metadata_list("octocat", &["bug"]),
            heading(vec![text("概要")]),
            paragraph("one"),
            pr_heading("2", "Two"),
            second,
        ]);
        let result = analyze(&document).unwrap();
        assert_eq!(result.label_color("bug"), Some("#ededed"));
        assert_eq!(result.label_index()["bug"].len(), 2);
    }

    #[test]
    fn test_pr_heading_right_after_metadata_is_a_section_heading() {
        let document = doc(vec![
            toc(&["1", "2"]),
            pr_heading("1", "First"),
            metadata_list("octocat", &["bug"]),
            pr_heading("2", "Swallowed"),
            metadata_list("dependabot[bot]", &["bug"]),
        ]);
        let result = analyze(&document).unwrap();
        assert_eq!(result.total_count(), 2);
        assert_eq!(result.bot_count(), 0);
        assert_eq!(result.community().len(), 1);
        assert_eq!(result.community()[0].anchor_id, "1");
        assert!(result.bots().is_empty());
        assert_eq!(result.label_index()["bug"].len(), 1);
        assert!(result.summary("1").is_none());
    }

    #[test]
    fn test_walker_consumes_toc_heading_in_metadata_position() {
        let toc_block = toc(&["1", "2"]);
        let first = pr_heading("1", "First");
        let meta = metadata_list("octocat", &[]);
        let second = pr_heading("2", "Second");

        let mut walker = DigestWalker::new();
        walker.visit(&toc_block).unwrap();
        walker.visit(&first).unwrap();
        walker.visit(&meta).unwrap();
        assert_eq!(walker.position, Position::Metadata);
        walker.visit(&second).unwrap();
        assert_eq!(walker.position, Position::Unknown);
        assert!(walker.pending_heading.is_none());
        assert_eq!(walker.total_count, 2);
    }

    #[test]
    fn test_walker_transitions() {
        let overview = heading(vec![text("概要")]);
        let other = heading(vec![text("その他")]);
        let toc_block = toc(&["1"]);
        let pr = pr_heading("1", "T");
        let meta = metadata_list("a", &[]);
        let para = paragraph("p");

        let mut walker = DigestWalker::new();
        walker.visit(&overview).unwrap();
        assert_eq!(walker.position, Position::None);
        walker.visit(&toc_block).unwrap();
        assert!(walker.toc.is_some());
        walker.visit(&pr).unwrap();
        assert!(walker.pending_heading.is_some());
        walker.visit(&meta).unwrap();
        assert!(walker.pending_heading.is_none());
        assert_eq!(walker.position, Position::Metadata);
        walker.visit(&other).unwrap();
        assert_eq!(walker.position, Position::Unknown);
        walker.visit(&para).unwrap();
        assert_eq!(walker.position, Position::None);
    }

    #[test]
    fn test_lists_after_toc_without_heading_are_ignored() {
        let document = doc(vec![toc(&["1"]), list(vec![vec![text("x")]])]);
        let result = analyze(&document).unwrap();
        assert_eq!(result.total_count(), 1);
        assert!(result.community().is_empty());
    }

    #[test]
    fn test_empty_document() {
        let result = analyze(&Document::default()).unwrap();
        assert_eq!(result.total_count(), 0);
        assert_eq!(result.all().count(), 0);
    }

    #[test]
    fn test_sample_digest() {
        let document = markdown::parse(SAMPLE_DIGEST);
        let result = analyze(&document).unwrap();

        assert_eq!(result.total_count(), 3);
        assert_eq!(result.bot_count(), 1);
        let community: Vec<_> = result.community().iter().map(|m| m.title_text.as_str()).collect();
        assert_eq!(
            community,
            vec!["#1234 Fix null ref in Dictionary", "#1250 Vectorize IndexOfAny"]
        );
        assert_eq!(result.bots()[0].title_text, "#1240 Bump actions/checkout from 3 to 4");

        assert_eq!(result.community()[0].labels, vec!["area-System.Collections", "bug"]);
        assert_eq!(result.label_color("area-System.Collections"), Some("#d4c5f9"));
        assert_eq!(result.label_color("bug"), Some("#d73a4a"));
        assert_eq!(result.label_color("area-Infrastructure"), Some("#5319e7"));
        assert_eq!(result.label_count(), 4);

        assert_eq!(
            result.summary("1234").unwrap().overview,
            "Dictionary の null 参照を修正しました。\n詳細は ドキュメント を参照してください。"
        );
        assert!(result.summary("1240").is_none());
        assert_eq!(
            result.summary("1250").unwrap().overview,
            "IndexOfAny をベクトル化しました。"
        );
    }

    #[test]
    fn test_sample_digest_invariants() {
        let document = markdown::parse(SAMPLE_DIGEST);
        let result = analyze(&document).unwrap();

        for metadata in result.all() {
            for label in &metadata.labels {
                assert!(result.label_index()[label].contains(metadata));
            }
        }
        for label in result.label_colors().keys() {
            assert!(result.all().any(|m| m.labels.contains(label)));
        }
        for id in result.summaries().keys() {
            assert!(result.all().any(|m| &m.anchor_id == id));
        }
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let document = markdown::parse(SAMPLE_DIGEST);
        let first = analyze(&document).unwrap();
        let second = analyze(&document).unwrap();
        assert_eq!(first, second);
    }
}
