//! Deferred-reference expressions.
//!
//! Action inputs point at trigger or upstream outputs with expressions such
//! as `!ref($.trigger.outputs.text)`. The platform resolves them at run time;
//! here they are only built, never evaluated.

/// Path root for trigger outputs.
pub const TRIGGER_ROOT: &str = "trigger";

/// Build a bare reference: `["trigger", "outputs", "text"]` becomes
/// `!ref($.trigger.outputs.text)`.
pub fn reference(path: &[&str]) -> String {
    format!("!ref($.{})", var_path(path))
}

/// Build a reference wrapped for embedding in free text:
/// `{{ !ref($.trigger.outputs.text) }}`.
pub fn interpolate(path: &[&str]) -> String {
    format!("{{{{ {} }}}}", reference(path))
}

/// Join path segments with dots, as used by JSON-logic `var` operands.
pub fn var_path(path: &[&str]) -> String {
    path.join(".")
}

/// Interpolated reference to a trigger output field.
pub fn trigger_output(field: &str) -> String {
    interpolate(&[TRIGGER_ROOT, "outputs", field])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference() {
        assert_eq!(
            reference(&["loop_1234abcd", "output", "result", "likes"]),
            "!ref($.loop_1234abcd.output.result.likes)"
        );
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(
            interpolate(&["enrich_x", "output", "result", "email"]),
            "{{ !ref($.enrich_x.output.result.email) }}"
        );
        assert_eq!(trigger_output("postUrl"), "{{ !ref($.trigger.outputs.postUrl) }}");
    }

    #[test]
    fn test_var_path() {
        assert_eq!(
            var_path(&["sentiment_x", "output", "result", "sentiment"]),
            "sentiment_x.output.result.sentiment"
        );
        assert_eq!(var_path(&[]), "");
    }
}
