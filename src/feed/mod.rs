use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::digest::{self, AnalysisError, AnalysisResult, Metadata};
use crate::markdown;

/// Date key layout of a digest page, e.g. `2025/01/15`.
const DATE_KEY_FORMAT: &str = "%Y/%m/%d";

/// RFC 1123 date as used by RSS, e.g. `Wed, 15 Jan 2025 00:00:00 GMT`.
const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to analyze digest: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Parse and analyze a digest, then render it as an RSS 2.0 feed.
#[instrument(skip(markdown_text, config, now), fields(bytes = markdown_text.len()))]
pub fn render(
    date_key: &str,
    markdown_text: &str,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<String, FeedError> {
    let document = markdown::parse(markdown_text);
    let analysis = digest::analyze(&document)?;
    Ok(render_analysis(date_key, &analysis, config, now))
}

/// Render an analyzed digest as an RSS 2.0 feed.
///
/// Community PRs come first, then bot PRs. `now` becomes the channel's
/// `lastBuildDate`.
pub fn render_analysis(
    date_key: &str,
    analysis: &AnalysisResult,
    config: &Config,
    now: DateTime<Utc>,
) -> String {
    let site = &config.site;
    let root = site.root();

    let mut rss = String::new();
    rss.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
    rss.push_str("<rss xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:content=\"http://purl.org/rss/1.0/modules/content/\" xmlns:atom=\"http://www.w3.org/2005/Atom\" version=\"2.0\">\n");
    rss.push_str("    <channel>\n");
    rss.push_str(&format!("        <title>{}</title>\n", xml_text(&site.title)));
    rss.push_str(&format!("        <link>{}</link>\n", xml_text(&root)));
    rss.push_str(&format!("        <description>{}</description>\n", xml_text(&site.description)));
    rss.push_str(&format!("        <lastBuildDate>{}</lastBuildDate>\n", rfc1123(now)));
    rss.push_str(&format!(
        "        <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        xml_text(&site.feed_url())
    ));
    rss.push_str(&format!("        <language>{}</language>\n", xml_text(&site.language)));
    rss.push_str("        <image>\n");
    rss.push_str(&format!("            <url>{}</url>\n", xml_text(&site.image_url())));
    rss.push_str(&format!("            <title>{}</title>\n", xml_text(&site.title)));
    rss.push_str(&format!("            <link>{}</link>\n", xml_text(&root)));
    rss.push_str("        </image>\n");
    rss.push_str(&format!("        <copyright>{}</copyright>\n", xml_text(&site.copyright)));

    let pub_date = publication_date(date_key).map(rfc1123);
    if pub_date.is_none() {
        debug!(date_key, "not a yyyy/MM/dd date key; items get no pubDate");
    }
    for metadata in analysis.all() {
        append_item(&mut rss, date_key, analysis, metadata, pub_date.as_deref(), config);
    }

    rss.push_str("    </channel>\n");
    rss.push_str("</rss>\n");
    debug!(items = analysis.community_count() + analysis.bot_count(), "rendered feed");
    rss
}

fn append_item(
    rss: &mut String,
    date_key: &str,
    analysis: &AnalysisResult,
    metadata: &Metadata,
    pub_date: Option<&str>,
    config: &Config,
) {
    let link = format!("{}#{}", config.site.page_url(date_key), metadata.anchor_id);
    let guid = config.repository.pull_request_url(&metadata.anchor_id);

    rss.push_str("        <item>\n");
    rss.push_str(&format!(
        "            <title>{}</title>\n",
        cdata(&html_escape::encode_safe(&metadata.title_text))
    ));
    rss.push_str(&format!("            <link>{}</link>\n", xml_text(&link)));
    rss.push_str(&format!(
        "            <guid isPermaLink=\"true\">{}</guid>\n",
        xml_text(&guid)
    ));
    if let Some(pub_date) = pub_date {
        rss.push_str(&format!("            <pubDate>{}</pubDate>\n", pub_date));
    }
    if let Some(summary) = analysis.summary(&metadata.anchor_id) {
        rss.push_str(&format!(
            "            <description>{}</description>\n",
            cdata(&summary.overview)
        ));
    }
    rss.push_str("        </item>\n");
}

/// Midnight UTC of a `yyyy/MM/dd` date key; `None` for anything else.
pub fn publication_date(date_key: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date_key, DATE_KEY_FORMAT).ok()?;
    // chrono accepts unpadded fields; the key must match the layout exactly.
    if date.format(DATE_KEY_FORMAT).to_string() != date_key {
        return None;
    }
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

pub fn rfc1123(date: DateTime<Utc>) -> String {
    date.format(RFC1123_FORMAT).to_string()
}

/// Wrap text in a CDATA section, splitting any `]]>` it contains.
fn cdata(text: &str) -> String {
    format!("<![CDATA[ {} ]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn xml_text(text: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_text(text)
}
