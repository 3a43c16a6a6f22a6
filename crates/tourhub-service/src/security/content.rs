//! Content safety checks applied to titles and bodies.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use tourhub_core::config::security::SecurityConfig;

static INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<\s*script|javascript\s*:|<[^>]*\son[a-z]+\s*=|<\s*iframe|<\s*object|<\s*embed|eval\s*\(|document\.cookie",
    )
    .expect("injection pattern is valid")
});

static URL_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhttps?://([a-z0-9](?:[a-z0-9.-]*[a-z0-9])?)").expect("url pattern is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(/)?\s*([A-Za-z][A-Za-z0-9]*)\b[^>]*?(/)?\s*>").expect("tag pattern is valid")
});

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Paired elements whose nesting is checked. Anything else in angle
/// brackets, such as `<Enter>`, is treated as text.
const PAIRED_TAGS: &[&str] = &[
    "a", "abbr", "article", "aside", "b", "blockquote", "body", "button", "caption", "center",
    "code", "dd", "del", "details", "div", "dl", "dt", "em", "figcaption", "figure", "font",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "html", "i", "ins",
    "label", "li", "main", "mark", "nav", "ol", "option", "p", "pre", "q", "s", "section",
    "select", "small", "span", "strong", "style", "sub", "summary", "sup", "table", "tbody", "td",
    "textarea", "tfoot", "th", "thead", "time", "title", "tr", "u", "ul",
];

/// Outcome of [`ContentChecker::validate`].
///
/// `errors` block the notification; `warnings` are only logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ContentValidation {
    fn finish(mut self) -> Self {
        self.is_valid = self.errors.is_empty();
        self
    }
}

/// Stateless checker built from [`SecurityConfig`].
#[derive(Debug, Clone)]
pub struct ContentChecker {
    max_title_length: usize,
    max_content_length: usize,
    sensitive_words: Vec<String>,
    allowed_domains: Vec<String>,
}

impl ContentChecker {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            max_title_length: config.max_title_length,
            max_content_length: config.max_content_length,
            sensitive_words: config
                .sensitive_words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            allowed_domains: config
                .allowed_domains
                .iter()
                .map(|d| d.trim().trim_start_matches('.').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn validate(&self, title: Option<&str>, content: &str) -> ContentValidation {
        let mut result = ContentValidation::default();

        if let Some(title) = title {
            let len = title.chars().count();
            if len > self.max_title_length {
                result.errors.push(format!(
                    "Title is {len} characters; the limit is {}",
                    self.max_title_length
                ));
            }
        }

        if content.trim().is_empty() {
            result.errors.push("Content must not be empty".to_string());
        }
        let len = content.chars().count();
        if len > self.max_content_length {
            result.errors.push(format!(
                "Content is {len} characters; the limit is {}",
                self.max_content_length
            ));
        }

        for text in title.into_iter().chain(std::iter::once(content)) {
            self.scan(text, &mut result);
        }

        if let Some(problem) = unbalanced_tag(content) {
            result.errors.push(problem);
        }

        result.finish()
    }

    fn scan(&self, text: &str, result: &mut ContentValidation) {
        let lowered = text.to_lowercase();
        for word in &self.sensitive_words {
            if lowered.contains(word.as_str()) {
                push_unique(&mut result.warnings, format!("Contains sensitive word: {word}"));
            }
        }

        if let Some(found) = INJECTION.find(text) {
            push_unique(
                &mut result.errors,
                format!("Contains disallowed markup or script: {}", found.as_str()),
            );
        }

        for caps in URL_HOST.captures_iter(text) {
            let host = caps[1].to_lowercase();
            if !self.is_allowed_host(&host) {
                push_unique(
                    &mut result.warnings,
                    format!("Links to a domain outside the allow-list: {host}"),
                );
            }
        }
    }

    fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

/// Whether `url` is an absolute `http` or `https` link.
pub fn is_safe_link(url: &str) -> bool {
    let url = url.trim();
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
        && !rest.is_empty()
        && !url.chars().any(char::is_control)
}

fn push_unique(list: &mut Vec<String>, message: String) {
    if !list.contains(&message) {
        list.push(message);
    }
}

/// Return a message describing the first tag nesting problem, if any.
fn unbalanced_tag(content: &str) -> Option<String> {
    let mut open: Vec<String> = Vec::new();
    for caps in TAG.captures_iter(content) {
        let name = caps[2].to_lowercase();
        let closing = caps.get(1).is_some();
        let self_closing = caps.get(3).is_some();
        if VOID_TAGS.contains(&name.as_str())
            || self_closing
            || !PAIRED_TAGS.contains(&name.as_str())
        {
            continue;
        }
        if !closing {
            open.push(name);
            continue;
        }
        match open.pop() {
            Some(expected) if expected == name => {}
            Some(expected) => {
                return Some(format!("Mismatched tag: expected </{expected}>, found </{name}>"));
            }
            None => return Some(format!("Closing tag </{name}> has no opening tag")),
        }
    }
    open.pop().map(|name| format!("Unclosed tag <{name}>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> ContentChecker {
        ContentChecker::new(&SecurityConfig::default())
    }

    #[test]
    fn test_length_boundary_is_inclusive() {
        let c = checker();
        let at_limit = "字".repeat(1000);
        assert!(c.validate(Some("Title"), &at_limit).is_valid);

        let over = "a".repeat(1001);
        let result = c.validate(Some("Title"), &over);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);

        let long_title = "t".repeat(101);
        assert!(!c.validate(Some(&long_title), "ok").is_valid);
    }

    #[test]
    fn test_empty_content_blocks() {
        assert!(!checker().validate(None, "   ").is_valid);
    }

    #[test]
    fn test_injection_patterns_block() {
        let c = checker();
        for bad in [
            "<script>alert(1)</script>",
            "click javascript:void(0)",
            r#"<a href="x" onclick="steal()">x</a>"#,
            "<iframe src=x></iframe>",
            "eval(payload)",
            "read document.cookie now",
        ] {
            let result = c.validate(None, bad);
            assert!(!result.is_valid, "{bad} should be rejected");
        }
        assert!(c.validate(None, "Conditions on arrival = sunny").is_valid);
    }

    #[test]
    fn test_sensitive_words_and_links_only_warn() {
        let c = checker();
        let result = c.validate(
            Some("Casino night"),
            "Details at https://m.tourhub.com/e/1 and https://evil.example.org/x",
        );
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[1].contains("evil.example.org"));

        let result = c.validate(None, "See https://nottourhub.com");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_tag_balance() {
        assert_eq!(unbalanced_tag("<p>Hello<br><b>there</b></p><img src=x/>"), None);
        assert!(unbalanced_tag("<p><b>Hello</p>").is_some());
        assert!(unbalanced_tag("<div>open").is_some());
        assert!(unbalanced_tag("stray</span>").is_some());
        assert!(!checker().validate(None, "<b>bold").is_valid);
    }

    #[test]
    fn test_angle_bracketed_text_is_not_markup() {
        let result = checker().validate(None, "Press <Enter> to confirm your booking");
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(unbalanced_tag("Seats <A1> and <A2> are held for <b>you</b>"), None);
        assert!(unbalanced_tag("<Enter> then <div>open").is_some());
    }

    #[test]
    fn test_safe_link_schemes() {
        assert!(is_safe_link("https://www.tourhub.com/orders/9"));
        assert!(is_safe_link(" HTTP://m.tourhub.com "));
        assert!(!is_safe_link("javascript:alert(document.cookie)"));
        assert!(!is_safe_link("JavaScript://%0aalert(1)"));
        assert!(!is_safe_link("data:text/html;base64,PHNjcmlwdD4="));
        assert!(!is_safe_link("/orders/9"));
        assert!(!is_safe_link("https://"));
    }
}
