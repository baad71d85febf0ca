pub mod types;

pub use types::PullRequestInfo;

use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::PromptConfig;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read pull request JSON: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse pull request JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Instructions for the summarizing model.
///
/// The requested `#### 概要` section is the one the digest analyzer later
/// picks up as the PR summary, so the headings here must stay in sync with
/// [`crate::digest::extract::OVERVIEW_HEADING`].
pub const SYSTEM_PROMPT: &str = "\
あなたは.NET開発者向けのPull Request要約アシスタントです。
以下の形式で要約を出力してください：

=================================
出力形式:

#### 概要
1行から5行ぐらいで簡潔に記述してください。
またサンプルコードなどもあれば記載してください。

#### 変更内容
変更されたファイルと主な変更内容をリストアップしてください。

#### パフォーマンスへの影響
パフォーマンスに関連する変更があれば具体的に記載してください。（なければ\"影響なし\"）
改善点や懸念点を明記してください。

#### 関連Issue
関連するIssueあれば記載してください。（なければ\"なし\"）

#### その他
それ以外に記載した方が良い特記事項があれば記載してください。（なければ\"なし\"）

#### サンプルコードを記載時の注意点
C#のコードブロックを使用してください：
```csharp
// ソースコードを記載
```
=================================

.NET開発者にとって有益な情報を含める形で、最大1000文字までで要約してください。
タイトルは不要です。markdown形式で出力してください。

【追加の詳細ガイドライン】
要約を作成する際は、以下の点に特に注意を払ってください：

1. **コード変更の技術的影響**
   - 変更がランタイム、コンパイラ、ライブラリのどの部分に影響するか明記
   - API の変更がある場合は、公開APIか内部実装かを区別
   - 互換性への影響（破壊的変更、非推奨化など）を明確に記載

2. **パフォーマンスに関する分析**
   - メモリ使用量、実行速度、スループットへの影響を具体的に記載
   - ベンチマーク結果や計測値がある場合は必ず含める
   - パフォーマンス改善の場合は、改善率や具体的な数値を記載
   - パフォーマンス低下のリスクがある場合は、その理由と影響範囲を説明

3. **セキュリティとバグ修正**
   - セキュリティ上の脆弱性修正の場合は、その重要度を明記
   - バグ修正の場合、修正前の問題の再現条件と修正後の動作を対比
   - CVE番号などのセキュリティ識別子がある場合は記載
";

/// Parse the combined pull request JSON document.
pub fn parse_info(json: &str) -> Result<PullRequestInfo, PromptError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a pull request JSON document from disk.
pub async fn load_info(path: &Path) -> Result<PullRequestInfo, PromptError> {
    debug!(path = %path.display(), "reading pull request JSON");
    let json = tokio::fs::read_to_string(path).await?;
    parse_info(&json)
}

/// Build the user prompt for one pull request.
#[instrument(skip(info, config), fields(pr = info.pull_request.number))]
pub fn build_prompt(info: &PullRequestInfo, config: &PromptConfig, repository: &str) -> String {
    let pr = &info.pull_request;
    let files = file_list(info, config.max_files);
    let comments = latest_comments(info, config.max_comments);
    debug!(files = info.files.len(), comments = info.issue_comments.len(), "building prompt");

    format!(
        "以下の{repository}のPull Requestを要約してください。\n\
         \n\
         Pull Request:\n\
         - {title} #{number}\n\
         - 作成者: {author}\n\
         - レビュワー: {reviewers}\n\
         \n\
         説明文:\n\
         {body}\n\
         \n\
         変更ファイル:\n\
         {files}\n\
         \n\
         Pull Requestに対する最新コメント（最大{max_comments}件）:\n\
         {comments}\n",
        repository = repository,
        title = pr.title,
        number = pr.number,
        author = pr.user.login,
        reviewers = reviewers(info).join(", "),
        body = pr.body.as_deref().unwrap_or_default(),
        files = files,
        max_comments = config.max_comments,
        comments = comments,
    )
}

/// One login per review, in review order.
fn reviewers(info: &PullRequestInfo) -> Vec<&str> {
    info.reviews
        .iter()
        .map(|review| review.user.login.as_str())
        .collect()
}

fn file_list(info: &PullRequestInfo, max_files: usize) -> String {
    let mut lines: Vec<String> = info
        .files
        .iter()
        .take(max_files)
        .map(|f| {
            format!(
                "- {} (+{}/-{}, total: {})",
                f.filename, f.additions, f.deletions, f.changes
            )
        })
        .collect();
    if info.files.len() > max_files {
        lines.push(format!("- and {} more files", info.files.len() - max_files));
    }
    lines.join("\n")
}

/// Newest maintainer comments first.
fn latest_comments(info: &PullRequestInfo, max_comments: usize) -> String {
    let mut comments: Vec<_> = info
        .issue_comments
        .iter()
        .filter(|c| c.is_from_maintainer())
        .collect();
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    comments
        .into_iter()
        .take(max_comments)
        .map(|c| {
            format!(
                "[{}] by {}\n{}\n",
                c.created_at.format("%Y-%m-%d %H:%M"),
                c.user.login,
                c.body
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
