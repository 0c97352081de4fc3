//! Line classification for PlanetLang.
//!
//! Every trimmed line is matched against an ordered rule table; the first
//! rule whose predicate accepts the line decides which [`Directive`] it is.
//! Lines no rule accepts are [`Directive::Content`] and are interpreted by
//! whichever block is currently open.

use std::sync::OnceLock;

use regex::Regex;

use crate::scene_model::EntityKind;

/// Exact text of the signature line.
pub const SIGNATURE: &str = "planets.push(new Planet);";

/// A classified script line. Ids borrow from the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `planets.push(new Planet);`
    Signature,
    /// `planets.thumbnail()`
    Thumbnail,
    /// `planets.spawn`
    Spawn,
    /// `new Background:<id>;`
    NewBackground(Option<&'a str>),
    /// `new Object:<id>`
    NewObject(Option<&'a str>),
    /// `switchBackgroundImgTo ... with id "<id>"`
    SwitchBackground(Option<&'a str>),
    /// `setPositionOf ... with id "<id>"`
    SetPosition(Option<&'a str>),
    /// `setTextureOf ... with id "<id>"`, optionally naming the target kind
    /// with `(Background` or `(Object`.
    SetTexture {
        id: Option<&'a str>,
        kind: Option<EntityKind>,
    },
    /// `setSizeOf ... with id "<id>"`
    SetSize(Option<&'a str>),
    /// `propertiesOf ... with id "<id>"`
    Properties(Option<&'a str>),
    /// `Object:<id>.onclick()`
    OnClick(Option<&'a str>),
    /// `remove(...)`
    Remove,
    /// Anything else: a field line for the open block, or noise.
    Content,
}

impl Directive<'_> {
    /// Whether this line is a directive rather than block content.
    pub fn is_directive(&self) -> bool {
        !matches!(self, Directive::Content)
    }
}

/// One row of the classifier table.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub build: for<'a> fn(&'a str) -> Directive<'a>,
}

/// Ordered rule table. Order matters: earlier rules shadow later ones.
pub static RULES: &[Rule] = &[
    Rule {
        name: "signature",
        matches: |line| line == SIGNATURE,
        build: |_| Directive::Signature,
    },
    Rule {
        name: "thumbnail",
        matches: |line| line.starts_with("planets.thumbnail()"),
        build: |_| Directive::Thumbnail,
    },
    Rule {
        name: "spawn",
        matches: |line| line.starts_with("planets.spawn"),
        build: |_| Directive::Spawn,
    },
    Rule {
        name: "new_background",
        matches: |line| line.starts_with("new Background:"),
        build: |line| Directive::NewBackground(declared_id(line, "new Background:")),
    },
    Rule {
        name: "new_object",
        matches: |line| line.starts_with("new Object:"),
        build: |line| Directive::NewObject(declared_id(line, "new Object:")),
    },
    Rule {
        name: "switch_background",
        matches: |line| line.starts_with("switchBackgroundImgTo"),
        build: |line| Directive::SwitchBackground(extract_id(line)),
    },
    Rule {
        name: "set_position",
        matches: |line| line.starts_with("setPositionOf"),
        build: |line| Directive::SetPosition(extract_id(line)),
    },
    Rule {
        name: "set_texture",
        matches: |line| line.starts_with("setTextureOf"),
        build: |line| Directive::SetTexture {
            id: extract_id(line),
            kind: texture_target(line),
        },
    },
    Rule {
        name: "set_size",
        matches: |line| line.starts_with("setSizeOf"),
        build: |line| Directive::SetSize(extract_id(line)),
    },
    Rule {
        name: "properties",
        matches: |line| line.starts_with("propertiesOf"),
        build: |line| Directive::Properties(extract_id(line)),
    },
    Rule {
        name: "onclick",
        matches: |line| line.starts_with("Object:") && line.contains(".onclick()"),
        build: |line| Directive::OnClick(onclick_id(line)),
    },
    Rule {
        name: "remove",
        matches: |line| line.starts_with("remove("),
        build: |_| Directive::Remove,
    },
];

/// Classify one trimmed line.
pub fn classify(line: &str) -> Directive<'_> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(line))
        .map(|rule| (rule.build)(line))
        .unwrap_or(Directive::Content)
}

/// Name of the rule that accepts `line`, if any.
pub fn rule_name(line: &str) -> Option<&'static str> {
    RULES.iter().find(|rule| (rule.matches)(line)).map(|rule| rule.name)
}

static WITH_ID: OnceLock<Regex> = OnceLock::new();

/// The quoted id following `with id`, if present.
pub fn extract_id(line: &str) -> Option<&str> {
    let pattern = WITH_ID
        .get_or_init(|| Regex::new(r#"with id\s+"([^"]+)""#).expect("valid id pattern"));
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Id of a `new Kind:<id>;` declaration: the text up to the next `:`, with
/// the `;` terminator removed.
fn declared_id<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(prefix)?;
    let segment = rest.split(':').next().unwrap_or("");
    non_empty(segment.trim().trim_end_matches(';').trim_end())
}

fn onclick_id(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("Object:")?;
    non_empty(rest.split('.').next().unwrap_or("").trim())
}

fn texture_target(line: &str) -> Option<EntityKind> {
    if line.contains("(Background") {
        Some(EntityKind::Background)
    } else if line.contains("(Object") {
        Some(EntityKind::Object)
    } else {
        None
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_requires_exact_line() {
        assert_eq!(classify("planets.push(new Planet);"), Directive::Signature);
        assert_eq!(classify("planets.push(new Planet)"), Directive::Content);
        assert_eq!(classify("planets.push(new Planet); // hi"), Directive::Content);
    }

    #[test]
    fn test_block_openers() {
        assert_eq!(classify("planets.thumbnail() {"), Directive::Thumbnail);
        assert_eq!(classify("planets.spawn {"), Directive::Spawn);
        assert_eq!(classify("planets.spawnPoint()"), Directive::Spawn);
    }

    #[test]
    fn test_declarations() {
        assert_eq!(classify("new Background:bg1;"), Directive::NewBackground(Some("bg1")));
        assert_eq!(classify("new Object:rock"), Directive::NewObject(Some("rock")));
        assert_eq!(classify("new Object:rock;"), Directive::NewObject(Some("rock")));
        assert_eq!(classify("new Object:rock:extra"), Directive::NewObject(Some("rock")));
        assert_eq!(classify("new Object:;"), Directive::NewObject(None));
    }

    #[test]
    fn test_id_directives() {
        assert_eq!(
            classify(r#"switchBackgroundImgTo with id "bg2";"#),
            Directive::SwitchBackground(Some("bg2"))
        );
        assert_eq!(
            classify(r#"setPositionOf(Object) with id "objecttest""#),
            Directive::SetPosition(Some("objecttest"))
        );
        assert_eq!(
            classify(r#"setSizeOf with id "a b""#),
            Directive::SetSize(Some("a b"))
        );
        assert_eq!(classify("propertiesOf something"), Directive::Properties(None));
    }

    #[test]
    fn test_texture_target_kind() {
        assert_eq!(
            classify(r#"setTextureOf(Background) with id "bg1""#),
            Directive::SetTexture { id: Some("bg1"), kind: Some(EntityKind::Background) }
        );
        assert_eq!(
            classify(r#"setTextureOf(Object) with id "o""#),
            Directive::SetTexture { id: Some("o"), kind: Some(EntityKind::Object) }
        );
        assert_eq!(
            classify(r#"setTextureOf with id "o""#),
            Directive::SetTexture { id: Some("o"), kind: None }
        );
    }

    #[test]
    fn test_onclick_and_remove() {
        assert_eq!(classify("Object:coin.onclick() {"), Directive::OnClick(Some("coin")));
        assert_eq!(classify("Object:coin"), Directive::Content);
        assert_eq!(classify("remove(this);"), Directive::Remove);
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id(r#"with id   "spaced""#), Some("spaced"));
        assert_eq!(extract_id(r#"with id """#), None);
        assert_eq!(extract_id("with id bare"), None);
    }

    #[test]
    fn test_rule_order_is_first_match() {
        assert_eq!(rule_name("planets.push(new Planet);"), Some("signature"));
        assert_eq!(rule_name("x: 5"), None);
        assert_eq!(rule_name("url: a.png"), None);
    }
}
