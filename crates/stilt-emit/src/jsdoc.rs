//! Structured comment tags: the in-memory model, parsing and serialization.
//!
//! A structured comment is an ordered list of `Tag`s. A tag with an empty
//! `tag_name` contributes only free text. Serialization keeps insertion
//! order and collapses to a one-line comment when a single short tag is all
//! there is (`/** @type {string} */`).

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// One `@tag` line of a structured comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    /// Tag identifier, e.g. `type`, `param`, `return`. Empty for free text.
    pub tag_name: String,
    /// Annotation-dialect type string, rendered in braces.
    pub type_str: Option<String>,
    /// For `param` tags.
    pub parameter_name: Option<String>,
    /// Free-form trailing text.
    pub text: Option<String>,
    pub optional: bool,
    pub rest_param: bool,
    pub destructuring: bool,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Tag {
            tag_name: name.into(),
            ..Tag::default()
        }
    }

    pub fn with_type(name: impl Into<String>, type_str: impl Into<String>) -> Self {
        Tag {
            tag_name: name.into(),
            type_str: Some(type_str.into()),
            ..Tag::default()
        }
    }

    pub fn param(name: impl Into<String>, type_str: impl Into<String>) -> Self {
        Tag {
            tag_name: "param".to_string(),
            type_str: Some(type_str.into()),
            parameter_name: Some(name.into()),
            ..Tag::default()
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Tag {
            text: Some(text.into()),
            ..Tag::default()
        }
    }
}

/// Tags that must not coexist with a `@type` tag on the same comment.
/// Serialization drops them when the caller asks for conflict resolution.
pub static TAGS_CONFLICTING_WITH_TYPE: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "param", "return", "this", "typedef", "template", "private", "protected", "public",
        "export",
    ]
    .into_iter()
    .collect()
});

/// Tags the translator generates itself; user-written occurrences are
/// removed so they cannot fight the generated ones.
static GENERATED_ONLY_TAGS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "type",
        "typedef",
        "template",
        "record",
        "struct",
        "constructor",
        "extends",
        "implements",
        "enum",
    ]
    .into_iter()
    .collect()
});

/// Tags that survive the escape pass untouched.
static KNOWN_TAGS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "abstract",
        "author",
        "const",
        "define",
        "deprecated",
        "desc",
        "dict",
        "export",
        "fileoverview",
        "final",
        "license",
        "nocollapse",
        "nosideeffects",
        "override",
        "param",
        "private",
        "protected",
        "public",
        "return",
        "see",
        "suppress",
        "this",
        "throws",
        "unrestricted",
    ]
    .into_iter()
    .collect()
});

/// At most one tag of these names survives per comment. `extends` is not
/// here: interfaces extend multiple bases.
static SINGLETON_TAGS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "type",
        "typedef",
        "template",
        "abstract",
        "record",
        "struct",
        "constructor",
        "this",
        "return",
    ]
    .into_iter()
    .collect()
});

pub fn is_singleton_tag(name: &str) -> bool {
    SINGLETON_TAGS.contains(name)
}

/// Make free text safe to embed in a block comment.
pub fn escape_comment_text(text: &str) -> String {
    text.replace("/*", "/ *").replace("*/", "* /")
}

fn render_tag(tag: &Tag, out: &mut String) {
    if tag.tag_name.is_empty() {
        if let Some(text) = &tag.text {
            out.push_str(&escape_comment_text(text));
        }
        return;
    }
    out.push('@');
    out.push_str(&tag.tag_name);
    if let Some(type_str) = &tag.type_str {
        out.push_str(" {");
        out.push_str(type_str);
        out.push('}');
    }
    if let Some(name) = &tag.parameter_name {
        out.push(' ');
        out.push_str(name);
    }
    if let Some(text) = &tag.text {
        if !text.is_empty() {
            out.push(' ');
            out.push_str(&escape_comment_text(text));
        }
    }
}

fn drop_conflicting(tags: &[Tag]) -> Vec<&Tag> {
    let has_type = tags.iter().any(|t| t.tag_name == "type");
    let mut seen_type = false;
    tags.iter()
        .filter(|t| {
            if has_type && TAGS_CONFLICTING_WITH_TYPE.contains(t.tag_name.as_str()) {
                return false;
            }
            if t.tag_name == "type" {
                if seen_type {
                    return false;
                }
                seen_type = true;
            }
            true
        })
        .collect()
}

/// Serialize tags into block comment text (`/** ... */`, no trailing
/// newline). When `drop_conflicting_with_type` is set and a `type` tag is
/// present, the conflicting tag set is removed first.
pub fn serialize_tags(tags: &[Tag], drop_conflicting_with_type: bool) -> String {
    let kept: Vec<&Tag> = if drop_conflicting_with_type {
        drop_conflicting(tags)
    } else {
        let mut seen_type = false;
        tags.iter()
            .filter(|t| {
                if t.tag_name == "type" {
                    if seen_type {
                        return false;
                    }
                    seen_type = true;
                }
                true
            })
            .collect()
    };

    if kept.len() == 1 {
        let tag = kept[0];
        let single_line = !tag.tag_name.is_empty()
            && !tag.text.as_deref().unwrap_or("").contains('\n')
            && !tag.type_str.as_deref().unwrap_or("").contains('\n');
        if single_line {
            let mut out = String::from("/** ");
            render_tag(tag, &mut out);
            out.push_str(" */");
            return out;
        }
    }

    let mut out = String::from("/**\n");
    for tag in kept {
        let mut line = String::new();
        render_tag(tag, &mut line);
        for part in line.split('\n') {
            out.push_str(" * ");
            out.push_str(part);
            out.push('\n');
        }
    }
    out.push_str(" */");
    out
}

/// Filter a user-written tag list down to what may be re-emitted:
/// recognized tags pass, generated-only tags are removed, anything unknown
/// is downgraded to escaped free text.
pub fn escape_illegal_tags(tags: Vec<Tag>) -> Vec<Tag> {
    tags.into_iter()
        .filter_map(|tag| {
            if tag.tag_name.is_empty() || KNOWN_TAGS.contains(tag.tag_name.as_str()) {
                return Some(tag);
            }
            if GENERATED_ONLY_TAGS.contains(tag.tag_name.as_str()) {
                return None;
            }
            let mut text = format!("\\@{}", tag.tag_name);
            if let Some(t) = &tag.text {
                text.push(' ');
                text.push_str(t);
            }
            Some(Tag::text_only(text))
        })
        .collect()
}

/// Parse structured comment text into tags. Returns `None` for anything
/// that is not a `/** ... */` block.
pub fn parse_comment(text: &str) -> Option<Vec<Tag>> {
    let body = text
        .strip_prefix("/**")
        .and_then(|rest| rest.strip_suffix("*/"))?;

    let mut tags: Vec<Tag> = Vec::new();
    let mut current: Option<Tag> = None;
    let mut free_text = String::new();

    let flush_free_text = |tags: &mut Vec<Tag>, free_text: &mut String| {
        let trimmed = free_text.trim();
        if !trimmed.is_empty() {
            tags.push(Tag::text_only(trimmed.to_string()));
        }
        free_text.clear();
    };

    for raw_line in body.lines() {
        let line = raw_line
            .trim_start()
            .trim_start_matches('*')
            .trim_start_matches(' ');
        if let Some(rest) = line.strip_prefix('@') {
            flush_free_text(&mut tags, &mut free_text);
            if let Some(tag) = current.take() {
                tags.push(tag);
            }
            current = Some(parse_tag_line(rest));
        } else if let Some(tag) = &mut current {
            // Continuation line of the previous tag's text.
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }
            let text = tag.text.get_or_insert_with(String::new);
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(trimmed);
        } else {
            if !free_text.is_empty() {
                free_text.push('\n');
            }
            free_text.push_str(line.trim_end());
        }
    }
    flush_free_text(&mut tags, &mut free_text);
    if let Some(tag) = current.take() {
        tags.push(tag);
    }
    Some(tags)
}

fn parse_tag_line(rest: &str) -> Tag {
    let name_end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let mut tag = Tag::new(&rest[..name_end]);
    let mut remainder = rest[name_end..].trim_start();

    if let Some(after_brace) = remainder.strip_prefix('{') {
        // Balanced-brace scan; Closure function types nest braces.
        let mut depth = 1usize;
        let mut end = None;
        for (i, c) in after_brace.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        if let Some(end) = end {
            tag.type_str = Some(after_brace[..end].to_string());
            remainder = after_brace[end + 1..].trim_start();
        }
    }

    if tag.tag_name == "param" {
        let name_end = remainder
            .find(char::is_whitespace)
            .unwrap_or(remainder.len());
        if name_end > 0 {
            tag.parameter_name = Some(remainder[..name_end].to_string());
            remainder = remainder[name_end..].trim_start();
        }
    }

    let trailing = remainder.trim_end();
    if !trailing.is_empty() {
        tag.text = Some(trailing.to_string());
    }
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tag_one_line() {
        let tags = vec![Tag::with_type("type", "string")];
        assert_eq!(serialize_tags(&tags, false), "/** @type {string} */");
    }

    #[test]
    fn test_multi_tag_block() {
        let tags = vec![
            Tag::param("x", "number"),
            Tag::with_type("return", "string"),
        ];
        let out = serialize_tags(&tags, false);
        assert_eq!(out, "/**\n * @param {number} x\n * @return {string}\n */");
    }

    #[test]
    fn test_conflicting_tags_dropped() {
        let tags = vec![
            Tag::with_type("type", "number"),
            Tag::param("x", "string"),
            Tag::new("export"),
            Tag::new("abstract"),
        ];
        let out = serialize_tags(&tags, true);
        assert!(out.contains("@type {number}"), "{}", out);
        assert!(!out.contains("@param"), "{}", out);
        assert!(!out.contains("@export"), "{}", out);
        assert!(out.contains("@abstract"), "{}", out);
    }

    #[test]
    fn test_at_most_one_type_tag() {
        let tags = vec![
            Tag::with_type("type", "number"),
            Tag::with_type("type", "string"),
        ];
        let out = serialize_tags(&tags, false);
        assert_eq!(out.matches("@type").count(), 1, "{}", out);
    }

    #[test]
    fn test_parse_round_trip() {
        let tags = vec![
            Tag::text_only("Some description."),
            Tag::param("x", "(string|number)"),
            Tag::with_type("return", "void"),
        ];
        let serialized = serialize_tags(&tags, false);
        let parsed = parse_comment(&serialized).unwrap();
        assert_eq!(parsed, tags);
    }

    #[test]
    fn test_parse_rejects_plain_comments() {
        assert!(parse_comment("// line").is_none());
        assert!(parse_comment("/* plain block */").is_none());
    }

    #[test]
    fn test_parse_balanced_braces() {
        let parsed = parse_comment("/** @type {function(number): {a: string}} */").unwrap();
        assert_eq!(
            parsed[0].type_str.as_deref(),
            Some("function(number): {a: string}")
        );
    }

    #[test]
    fn test_escape_illegal_tags() {
        let tags = vec![
            Tag::new("export"),
            Tag::with_type("type", "string"),
            Tag {
                tag_name: "customtag".to_string(),
                text: Some("hello".to_string()),
                ..Tag::default()
            },
        ];
        let escaped = escape_illegal_tags(tags);
        assert_eq!(escaped.len(), 2);
        assert_eq!(escaped[0].tag_name, "export");
        assert_eq!(escaped[1].tag_name, "");
        assert_eq!(escaped[1].text.as_deref(), Some("\\@customtag hello"));
    }

    #[test]
    fn test_comment_text_escaped() {
        let tags = vec![Tag::text_only("evil */ comment")];
        let out = serialize_tags(&tags, false);
        assert!(!out[3..out.len() - 2].contains("*/"), "{}", out);
    }
}
