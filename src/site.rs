//! SiteMatcher: is a URL covered by the content-script match patterns?
//!
//! Patterns use the extension match syntax (`https://twitter.com/*`,
//! `*://*.example.jp/*`). They are compiled into one anchored alternation.

use regex::Regex;

pub struct SiteMatcher {
    regex: Option<Regex>,
}

fn pattern_to_regex(pattern: &str) -> String {
    pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}

impl SiteMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        if patterns.is_empty() {
            return Ok(Self { regex: None });
        }
        let alternation = patterns
            .iter()
            .map(|p| format!("(?:{})", pattern_to_regex(p.as_ref())))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!("^(?:{})$", alternation))?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn is_supported(&self, url: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(url))
    }
}
