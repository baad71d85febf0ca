use std::collections::{BTreeMap, HashMap};

/// Identity of one PR entry in a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// PR number without the leading `#` (e.g. "1234"), used as the page anchor
    pub anchor_id: String,
    /// Heading text prefixed with the raw PR number (e.g. "#1234 Fix null ref")
    pub title_text: String,
    /// Label names in source order; repeats are kept
    pub labels: Vec<String>,
}

/// Flattened overview paragraph of one PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub overview: String,
}

/// Who opened a PR, as far as the digest can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorship {
    Community,
    Bot,
}

impl std::fmt::Display for Authorship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authorship::Community => write!(f, "community"),
            Authorship::Bot => write!(f, "bot"),
        }
    }
}

/// Everything recovered from one digest document.
///
/// Built in a single pass by [`super::analyze`] and handed out as a
/// read-only snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub(super) total_count: usize,
    pub(super) bot_count: usize,
    pub(super) label_index: BTreeMap<String, Vec<Metadata>>,
    pub(super) label_colors: HashMap<String, String>,
    pub(super) community: Vec<Metadata>,
    pub(super) bots: Vec<Metadata>,
    pub(super) summaries: HashMap<String, Summary>,
}

impl AnalysisResult {
    /// Number of list items in the table of contents.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn bot_count(&self) -> usize {
        self.bot_count
    }

    pub fn community_count(&self) -> usize {
        self.community.len()
    }

    /// Number of distinct labels.
    pub fn label_count(&self) -> usize {
        self.label_index.len()
    }

    /// Label name to the PRs carrying it, labels in sorted order.
    pub fn label_index(&self) -> &BTreeMap<String, Vec<Metadata>> {
        &self.label_index
    }

    pub fn label_color(&self, label: &str) -> Option<&str> {
        self.label_colors.get(label).map(String::as_str)
    }

    pub fn label_colors(&self) -> &HashMap<String, String> {
        &self.label_colors
    }

    pub fn community(&self) -> &[Metadata] {
        &self.community
    }

    pub fn bots(&self) -> &[Metadata] {
        &self.bots
    }

    /// Community PRs followed by bot PRs, each in document order.
    pub fn all(&self) -> impl Iterator<Item = &Metadata> {
        self.community.iter().chain(self.bots.iter())
    }

    pub fn summary(&self, anchor_id: &str) -> Option<&Summary> {
        self.summaries.get(anchor_id)
    }

    pub fn summaries(&self) -> &HashMap<String, Summary> {
        &self.summaries
    }
}
