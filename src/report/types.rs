/// Label index of one digest, ready for output.
#[derive(Debug)]
pub struct LabelReport {
    /// Digest date key (e.g. "2025/01/15")
    pub date_key: String,
    /// Entries in the table of contents
    pub total: usize,
    /// Community-authored PRs found
    pub community: usize,
    /// Bot-authored PRs found
    pub bots: usize,
    /// One entry per label, sorted by label name
    pub labels: Vec<LabelEntry>,
}

/// A label and the PRs carrying it.
#[derive(Debug, Clone)]
pub struct LabelEntry {
    pub name: String,
    /// Color token from the digest (e.g. "#d4c5f9"), if one was declared
    pub color: Option<String>,
    pub pull_requests: Vec<PullRequestRef>,
}

#[derive(Debug, Clone)]
pub struct PullRequestRef {
    /// "#1234 Fix null ref"
    pub title: String,
    /// Digest page URL with the PR anchor
    pub url: String,
}

/// An `#rrggbb` color split into channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` or `rrggbb`. Named colors and other notations are not
    /// understood.
    pub fn parse(token: &str) -> Option<Rgb> {
        let hex = token.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Whether dark text reads better than light text on this background.
    pub fn is_light(&self) -> bool {
        let Rgb(r, g, b) = *self;
        let luma = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
        luma >= 128_000
    }
}
