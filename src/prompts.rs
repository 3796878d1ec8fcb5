pub const DAMAGE_ANALYSIS: &str = include_str!("../data/prompts/damage_analysis.txt");
pub const PREVENTION: &str = include_str!("../data/prompts/prevention.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Hello {{name}}!", &[("name", "world")]),
            "Hello world!"
        );
    }

    #[test]
    fn test_render_multiple_vars() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "cats"), ("b", "dogs")]),
            "cats and dogs"
        );
    }

    #[test]
    fn test_prompts_are_non_empty() {
        assert!(!DAMAGE_ANALYSIS.is_empty());
        assert!(!PREVENTION.is_empty());
    }

    #[test]
    fn test_analysis_prompt_enumerates_structure() {
        assert!(DAMAGE_ANALYSIS.contains("**Damage Type**"));
        assert!(DAMAGE_ANALYSIS.contains("**Severity**"));
        assert!(DAMAGE_ANALYSIS.contains("**Immediate Concerns**"));
    }

    #[test]
    fn test_prevention_has_analysis_placeholder() {
        assert!(PREVENTION.contains("{{analysis}}"));
    }

    #[test]
    fn test_prevention_interpolates_analysis_verbatim() {
        let rendered = render(PREVENTION, &[("analysis", "Cracks near the window frame")]);
        assert!(rendered.contains("Cracks near the window frame"));
        assert!(!rendered.contains("{{analysis}}"));
    }
}
