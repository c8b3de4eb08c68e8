use crate::chunk::Chunk;
use once_cell::sync::Lazy;
use regex::Regex;

/// Embedded-HTML rewrite rules, applied in order.
///
/// Each rule converts one markup construct into its plain-text equivalent;
/// the final rules strip whatever tags remain and collapse blank-line runs.
/// The collapse pattern matches a whole run of 3+ newlines at once so the
/// full normalization is idempotent.
static MARKUP_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r#"<img[^>]*src="([^"]*)"[^>]*alt="([^"]*)"[^>]*>"#).unwrap(),
            "[Image: ${2} (${1})]",
        ),
        (
            Regex::new(r#"<img[^>]*src="([^"]*)"[^>]*>"#).unwrap(),
            "[Image: ${1}]",
        ),
        (
            Regex::new(r#"<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap(),
            "[${2}](${1})",
        ),
        (Regex::new(r"<strong>(.*?)</strong>").unwrap(), "**${1}**"),
        (Regex::new(r"<b>(.*?)</b>").unwrap(), "**${1}**"),
        (Regex::new(r"<em>(.*?)</em>").unwrap(), "*${1}*"),
        (Regex::new(r"<i>(.*?)</i>").unwrap(), "*${1}*"),
        (Regex::new(r"<h1[^>]*>(.*?)</h1>").unwrap(), "# ${1}"),
        (Regex::new(r"<h2[^>]*>(.*?)</h2>").unwrap(), "## ${1}"),
        (Regex::new(r"<h3[^>]*>(.*?)</h3>").unwrap(), "### ${1}"),
        (Regex::new(r"<h4[^>]*>(.*?)</h4>").unwrap(), "#### ${1}"),
        (Regex::new(r"<h5[^>]*>(.*?)</h5>").unwrap(), "##### ${1}"),
        (Regex::new(r"<h6[^>]*>(.*?)</h6>").unwrap(), "###### ${1}"),
        (Regex::new(r"(?s)<p[^>]*>(.*?)</p>").unwrap(), "${1}\n\n"),
        (Regex::new(r"(?s)<div[^>]*>(.*?)</div>").unwrap(), "${1}\n"),
        (Regex::new(r"<br[^>]*>").unwrap(), "\n"),
        (Regex::new(r"<hr[^>]*>").unwrap(), "---\n"),
        (Regex::new(r"<[^>]+>").unwrap(), ""),
        (Regex::new(r"\n(?:[ \t\r]*\n){2,}").unwrap(), "\n\n"),
    ]
});

/// Splits a section-oriented document into header-delimited chunks.
///
/// A line starting with `#` opens a new section; everything else accumulates
/// into the current section's body. Bodies are normalized on emission.
pub(crate) fn chunk(content: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut header: Option<String> = None;
    let mut body = String::new();

    for line in content.lines() {
        if line.starts_with('#') {
            if header.is_some() || !body.is_empty() {
                chunks.push(Chunk::Section {
                    header: header.take(),
                    body: normalize(&body),
                });
            }
            header = Some(line.trim().to_string());
            body.clear();
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    if header.is_some() || !body.is_empty() {
        chunks.push(Chunk::Section {
            header,
            body: normalize(&body),
        });
    }

    chunks
}

/// Converts embedded markup into plain, readable text.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub(crate) fn normalize(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let mut cleaned = content.to_string();
    for (pattern, replacement) in MARKUP_RULES.iter() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }

    cleaned.trim().to_string()
}
