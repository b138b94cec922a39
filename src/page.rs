use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::errors::{AgonError, Result};

/// Page `<title>` the site renders when an episode cannot be served.
pub const ERROR_PAGE_TITLE: &str = "エラー";

static PROGRAM_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+program_id\s+:\s+([1-9]\d*)").expect("program_id regex must compile")
});

static MEDIA_MODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+media_mode\s+:\s+"(.*?)""#).expect("media_mode regex must compile")
});

// `<title>` is RCDATA, so a break tag inside it survives as literal text.
static TITLE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>").expect("break tag regex must compile"));

/// Metadata recovered from a single episode view page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEpisodePage {
    pub title: String,
    pub program_id: String,
    /// Raw `media_mode` token as embedded in the page script.
    pub media_format: String,
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_title(raw: &str) -> String {
    collapse_whitespace(&TITLE_BREAK_RE.replace_all(raw, " "))
}

/// Parses an episode view page without touching the network.
///
/// The page title doubles as the site's error channel: the literal error
/// marker means the episode is unavailable and the human-readable reason
/// sits in the error panel. The numeric identifiers only exist inside an
/// embedded player script, so they are recovered by pattern search over the
/// raw body rather than the DOM.
pub fn parse_episode_page(body: &str) -> Result<ParsedEpisodePage> {
    let document = Html::parse_document(body);

    let title_selector = Selector::parse("title").expect("invalid selector");
    let title = document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default();
    let title = normalize_title(&title);

    if title == ERROR_PAGE_TITLE {
        let panel_selector = Selector::parse(".panel-body p").expect("invalid selector");
        let message = document
            .select(&panel_selector)
            .map(|element| element.text().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ");
        return Err(AgonError::SitePage {
            message: collapse_whitespace(&message),
        });
    }

    let program_id = PROGRAM_ID_RE
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(AgonError::RegexNotMatch {
            field: "program_id",
        })?;

    let media_format = MEDIA_MODE_RE
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(AgonError::RegexNotMatch {
            field: "media_mode",
        })?;

    Ok(ParsedEpisodePage {
        title,
        program_id,
        media_format,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const EPISODE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>
    テスト番組
    第22回</title></head>
<body>
<div class="episode"><h1>テスト番組</h1></div>
<script>
    var player = new MediaPlayer({
        program_id : 21,
        episode_id : 22,
        media_mode : "mp4",
        autoplay : false
    });
</script>
</body>
</html>"#;

    const ERROR_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>エラー</title></head>
<body>
<div class="panel panel-default">
  <div class="panel-body">
    <p>この番組は配信期間が終了しました。</p>
  </div>
</div>
</body>
</html>"#;

    #[test]
    fn extracts_embedded_metadata_and_normalizes_the_title() {
        let page = parse_episode_page(EPISODE_PAGE).expect("page should parse");
        assert_eq!(page.title, "テスト番組 第22回");
        assert_eq!(page.program_id, "21");
        assert_eq!(page.media_format, "mp4");
    }

    #[test]
    fn error_marker_title_yields_the_panel_message() {
        let err = parse_episode_page(ERROR_PAGE).expect_err("error page should fail");
        match err {
            AgonError::SitePage { message } => {
                assert_eq!(message, "この番組は配信期間が終了しました。");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn break_tags_inside_the_title_become_spaces() {
        let page = EPISODE_PAGE.replace("テスト番組\n    第22回", "テスト番組<br>第22回");
        let parsed = parse_episode_page(&page).expect("page should parse");
        assert_eq!(parsed.title, "テスト番組 第22回");
    }

    #[test]
    fn padded_error_title_still_matches_the_marker() {
        let page = ERROR_PAGE.replace("<title>エラー</title>", "<title>\n  エラー \n</title>");
        assert!(matches!(
            parse_episode_page(&page),
            Err(AgonError::SitePage { .. })
        ));
    }

    #[test]
    fn missing_program_id_assignment_is_reported() {
        let page = EPISODE_PAGE.replace("program_id", "program_ref");
        let err = parse_episode_page(&page).expect_err("missing assignment should fail");
        assert!(matches!(
            err,
            AgonError::RegexNotMatch { field: "program_id" }
        ));
    }

    #[test]
    fn missing_media_mode_literal_is_reported() {
        let page = EPISODE_PAGE.replace("media_mode", "media_kind");
        let err = parse_episode_page(&page).expect_err("missing literal should fail");
        assert!(matches!(
            err,
            AgonError::RegexNotMatch { field: "media_mode" }
        ));
    }

    #[test]
    fn mp3_media_mode_is_preserved_verbatim() {
        let page = EPISODE_PAGE.replace(r#"media_mode : "mp4""#, r#"media_mode : "mp3""#);
        let parsed = parse_episode_page(&page).expect("page should parse");
        assert_eq!(parsed.media_format, "mp3");
    }
}
