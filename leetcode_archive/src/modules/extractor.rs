use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Matches the code literal the submission page embeds in its inline page data.
static SUBMISSION_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)submissionCode: '(?P<code>.*?)',\n  editCodeUrl").unwrap());

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());

/// Pulls submitted source code out of a rendered submission page.
pub trait CodeExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Option<String>;
}

/// Applies the code pattern to the whole page markup.
#[derive(Debug, Default)]
pub struct PatternExtractor;

impl CodeExtractor for PatternExtractor {
    fn extract(&self, html: &str) -> Option<String> {
        match_code(html)
    }
}

/// Parses the page and applies the code pattern to each inline script only.
#[derive(Debug, Default)]
pub struct ScriptExtractor;

impl CodeExtractor for ScriptExtractor {
    fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&SCRIPT)
            .map(|script| script.text().collect::<String>())
            .find_map(|body| match_code(&body))
    }
}

fn match_code(text: &str) -> Option<String> {
    SUBMISSION_CODE
        .captures(text)
        .and_then(|captures| captures.name("code"))
        .map(|code| unescape(code.as_str()))
}

/// Decodes the escapes of a single-quoted JavaScript string literal.
pub fn unescape(literal: &str) -> String {
    let mut decoded = String::with_capacity(literal.len());
    let mut chars = literal.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('t') => decoded.push('\t'),
            Some('r') => decoded.push('\r'),
            Some('b') => decoded.push('\u{8}'),
            Some('f') => decoded.push('\u{c}'),
            Some('v') => decoded.push('\u{b}'),
            Some('0') => decoded.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(c) => decoded.push(c),
                    None => {
                        decoded.push_str("\\x");
                        decoded.push_str(&hex);
                    }
                }
            }
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let unit = match u16::from_str_radix(&hex, 16) {
                    Ok(unit) => unit,
                    Err(_) => {
                        decoded.push_str("\\u");
                        decoded.push_str(&hex);
                        continue;
                    }
                };
                // Characters outside the BMP arrive as a surrogate pair of two \u escapes.
                let mut units = vec![unit];
                if (0xD800..0xDC00).contains(&unit) && chars.peek() == Some(&'\\') {
                    let rest: String = chars.clone().take(6).collect();
                    if let Some(low) = rest
                        .strip_prefix("\\u")
                        .and_then(|hex| u16::from_str_radix(hex, 16).ok())
                    {
                        units.push(low);
                        for _ in 0..6 {
                            chars.next();
                        }
                    }
                }
                decoded.extend(char::decode_utf16(units).map(|c| c.unwrap_or('\u{FFFD}')));
            }
            Some(other) => decoded.push(other),
            None => decoded.push('\\'),
        }
    }

    decoded
}

#[cfg(test)]
mod test {
    use super::*;

    const PAGE: &str = "<html><head><script>\n  var pageData = {\n    questionId: '1',\n    submissionCode: 'class Solution {\\u000A    fn two_sum() -> Vec<i32> { vec![] }\\u000A}',\n  editCodeUrl: '/problems/two-sum/',\n  };\n</script></head><body><div id=\"result_date\">2023-09-07</div></body></html>";

    #[test]
    fn test_pattern_extractor() {
        let code = PatternExtractor.extract(PAGE).unwrap();
        assert_eq!(
            code,
            "class Solution {\n    fn two_sum() -> Vec<i32> { vec![] }\n}"
        );
    }

    #[test]
    fn test_script_extractor() {
        let code = ScriptExtractor.extract(PAGE).unwrap();
        assert_eq!(
            code,
            "class Solution {\n    fn two_sum() -> Vec<i32> { vec![] }\n}"
        );
    }

    #[test]
    fn test_missing_code() {
        let page = "<html><body><div id=\"result_date\"></div></body></html>";
        assert!(PatternExtractor.extract(page).is_none());
        assert!(ScriptExtractor.extract(page).is_none());
    }

    #[test]
    fn test_script_extractor_ignores_markup_outside_scripts() {
        let page = "<html><body><pre>submissionCode: 'x',\n  editCodeUrl</pre></body></html>";
        assert_eq!(PatternExtractor.extract(page).as_deref(), Some("x"));
        assert!(ScriptExtractor.extract(page).is_none());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(unescape(r#"it\'s \"quoted\" \\ done"#), "it's \"quoted\" \\ done");
        assert_eq!(unescape(r"\u003Cvector\u003E"), "<vector>");
        assert_eq!(unescape(r"\x41\x42"), "AB");
        assert_eq!(unescape(r"\uD83D\uDE00"), "\u{1F600}");
        assert_eq!(unescape(r"trailing\"), "trailing\\");
    }
}
