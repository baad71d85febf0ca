use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Everything the summarization prompt needs about one pull request.
///
/// Field names follow the GitHub REST API so that responses saved from
/// `pulls/{n}`, `pulls/{n}/files`, `pulls/{n}/reviews` and
/// `issues/{n}/comments` can be combined into one JSON document as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestInfo {
    pub pull_request: PullRequest,
    #[serde(default)]
    pub files: Vec<FileChange>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub issue_comments: Vec<IssueComment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Description; GitHub sends `null` for an empty body
    #[serde(default)]
    pub body: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

/// One changed file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileChange {
    pub filename: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub user: User,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// e.g. `MEMBER`, `CONTRIBUTOR`, `NONE`
    pub author_association: String,
}

impl IssueComment {
    /// Comments from people who work on the repository.
    pub fn is_from_maintainer(&self) -> bool {
        matches!(self.author_association.as_str(), "CONTRIBUTOR" | "MEMBER")
    }
}
