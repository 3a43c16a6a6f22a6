//! `{{variable}}` template rendering.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Variables available to a template.
pub type TemplateVars = HashMap<String, String>;

/// Substitutes `{{name}}` placeholders. Pure; never fails.
///
/// Whitespace inside the braces is ignored. Placeholders with no matching
/// variable are left in the output unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEngine;

impl TemplateEngine {
    pub fn new() -> Self {
        Self
    }

    /// Render `template` against `vars`.
    pub fn render(&self, template: &str, vars: &TemplateVars) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Names of every placeholder in `template`, in order of appearance.
    pub fn placeholders(&self, template: &str) -> Vec<String> {
        PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_known_variables() {
        let engine = TemplateEngine::new();
        let out = engine.render(
            "Hi {{userName}}, order {{ orderNumber }} is confirmed.",
            &vars(&[("userName", "Li Wei"), ("orderNumber", "TH-1001")]),
        );
        assert_eq!(out, "Hi Li Wei, order TH-1001 is confirmed.");
    }

    #[test]
    fn test_unknown_placeholder_is_kept() {
        let engine = TemplateEngine::new();
        let out = engine.render("Total: {{amount}}", &TemplateVars::new());
        assert_eq!(out, "Total: {{amount}}");
    }

    #[test]
    fn test_repeated_placeholder_and_plain_text() {
        let engine = TemplateEngine::new();
        let out = engine.render("{{a}}-{{a}} {not} {{", &vars(&[("a", "x")]));
        assert_eq!(out, "x-x {not} {{");
        assert_eq!(engine.placeholders("{{a}} {{ b.c }}"), vec!["a", "b.c"]);
    }
}
