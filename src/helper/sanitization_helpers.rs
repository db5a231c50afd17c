use regex::Regex;
use serde::Serializer;
use std::collections::HashSet;
use std::sync::OnceLock;

// Stored text is plain text. Escaping happens once, when a model is
// serialized for a response.

fn code_fence_regex() -> &'static Regex {
    static CODE_FENCE: OnceLock<Regex> = OnceLock::new();
    CODE_FENCE.get_or_init(|| Regex::new(r"(?s)```.*?```").expect("code fence pattern is valid"))
}

/// Escapes every HTML special character outside fenced code blocks. Fenced
/// blocks are kept byte for byte.
pub fn escape_outside_code_fences(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut last_end = 0;

    for block in code_fence_regex().find_iter(input) {
        output.push_str(&html_escape::encode_text(&input[last_end..block.start()]));
        output.push_str(block.as_str());
        last_end = block.end();
    }
    output.push_str(&html_escape::encode_text(&input[last_end..]));
    output
}

/// Removes every tag and returns plain text, entities decoded. For short
/// single-line fields such as titles and commenter names.
pub fn strip_all_html(input: &str) -> String {
    let cleaned = ammonia::Builder::new().tags(HashSet::new()).clean(input).to_string();
    html_escape::decode_html_entities(&cleaned).into_owned()
}

/// `serialize_with` target for plain-text fields (titles, names).
pub fn serialize_escaped<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&html_escape::encode_text(value))
}

/// `serialize_with` target for post bodies and comment text.
pub fn serialize_escaped_body<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&escape_outside_code_fences(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_outside_fences() {
        let out = escape_outside_code_fences("<script>alert(1)</script> hi");
        assert_eq!(out, "&lt;script&gt;alert(1)&lt;/script&gt; hi");
    }

    #[test]
    fn keeps_fenced_code_untouched() {
        let input = "before <b>\n```\nlet x = a < b;\n```\nafter";
        let out = escape_outside_code_fences(input);
        assert!(out.starts_with("before &lt;b&gt;"));
        assert!(out.contains("```\nlet x = a < b;\n```"));
        assert!(out.ends_with("after"));
    }

    #[test]
    fn literal_entities_are_escaped_as_text() {
        assert_eq!(escape_outside_code_fences("&lt; & b"), "&amp;lt; &amp; b");
    }

    #[test]
    fn strips_tags_from_names() {
        assert_eq!(strip_all_html("<b>Alice</b>"), "Alice");
        assert_eq!(strip_all_html("<script>x</script>Bob"), "Bob");
    }

    #[test]
    fn stripped_text_is_not_entity_encoded() {
        assert_eq!(strip_all_html("Tom & <i>Jerry</i>"), "Tom & Jerry");
        assert_eq!(strip_all_html("a < b"), "a < b");
    }
}
