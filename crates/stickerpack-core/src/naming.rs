//! Display-name validation and filename templates.
//!
//! Sticker platforms limit how long a sticker's name may be, measured in
//! display units where a wide character counts as 2 and everything else as 1.
//! A character is wide when it lies outside the Basic Multilingual Plane
//! (emoji, rare ideographs), i.e. when it takes two UTF-16 code units. CJK
//! ideographs in the BMP count as 1.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A character class a name may be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CharClass {
    /// CJK Unified Ideographs U+4E00 to U+9FA5.
    CjkIdeograph,
    AsciiLetter,
    AsciiDigit,
    Underscore,
    Hyphen,
    Space,
}

impl CharClass {
    pub fn matches(self, c: char) -> bool {
        match self {
            CharClass::CjkIdeograph => ('\u{4E00}'..='\u{9FA5}').contains(&c),
            CharClass::AsciiLetter => c.is_ascii_alphabetic(),
            CharClass::AsciiDigit => c.is_ascii_digit(),
            CharClass::Underscore => c == '_',
            CharClass::Hyphen => c == '-',
            CharClass::Space => c == ' ',
        }
    }
}

/// Caller-supplied name check that replaces the built-in rules.
#[derive(Clone)]
pub struct NamePredicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl NamePredicate {
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    pub fn accepts(&self, name: &str) -> bool {
        (self.0)(name)
    }
}

impl fmt::Debug for NamePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NamePredicate(..)")
    }
}

/// Why a name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameViolation {
    #[error("name must not be empty")]
    Empty,

    #[error("name is {length} display units long, at most {max} allowed")]
    TooLong { length: usize, max: usize },

    #[error("character {0:?} is not allowed")]
    DisallowedChar(char),

    #[error("name rejected by custom rule")]
    Rejected,
}

/// Name rule attached to an export format.
///
/// When `custom_validator` is set it decides alone; otherwise the length and
/// character-class limits apply, and an empty name is never valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameValidationRule {
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub allowed_chars: Option<Vec<CharClass>>,
    #[serde(skip)]
    pub custom_validator: Option<NamePredicate>,
}

impl NameValidationRule {
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn with_allowed_chars(mut self, classes: impl Into<Vec<CharClass>>) -> Self {
        self.allowed_chars = Some(classes.into());
        self
    }

    pub fn with_custom(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.custom_validator = Some(NamePredicate::new(predicate));
        self
    }

    /// Check `name` against this rule.
    pub fn check(&self, name: &str) -> Result<(), NameViolation> {
        if let Some(custom) = &self.custom_validator {
            return if custom.accepts(name) {
                Ok(())
            } else {
                Err(NameViolation::Rejected)
            };
        }

        if let Some(max) = self.max_length {
            let length = display_length(name);
            if length > max {
                return Err(NameViolation::TooLong { length, max });
            }
        }

        if let Some(classes) = &self.allowed_chars {
            if let Some(bad) = name.chars().find(|&c| !classes.iter().any(|cls| cls.matches(c))) {
                return Err(NameViolation::DisallowedChar(bad));
            }
        }

        if name.is_empty() {
            return Err(NameViolation::Empty);
        }

        Ok(())
    }

    /// Human-readable summary used in validation messages.
    pub fn describe(&self) -> String {
        if self.custom_validator.is_some() {
            return "custom rule".to_string();
        }
        let mut parts = Vec::new();
        if let Some(max) = self.max_length {
            parts.push(format!("at most {max} display units (wide characters count 2)"));
        }
        if let Some(classes) = &self.allowed_chars {
            let names: Vec<_> = classes.iter().map(|c| format!("{c:?}")).collect();
            parts.push(format!("only {}", names.join("/")));
        }
        if parts.is_empty() {
            "non-empty".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Check a name against an optional rule; no rule accepts everything.
pub fn validate_image_name(name: &str, rule: Option<&NameValidationRule>) -> bool {
    rule.map_or(true, |rule| rule.check(name).is_ok())
}

/// Whether `c` occupies two display units (a UTF-16 surrogate pair).
pub fn is_wide_char(c: char) -> bool {
    c.len_utf16() > 1
}

/// Length of `name` in display units.
pub fn display_length(name: &str) -> usize {
    name.chars().map(|c| if is_wide_char(c) { 2 } else { 1 }).sum()
}

/// Expand a filename template.
///
/// Recognised tokens: `{name}`, `{index}`, and zero-padded `{index:0Nd}` (for
/// example `{index:02d}`). `index` is the 1-based position. Unknown tokens are
/// kept verbatim.
pub fn generate_file_name(template: &str, name: &str, index: usize) -> String {
    let mut out = String::with_capacity(template.len() + name.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        match expand_token(&tail[1..close], name, index) {
            Some(expanded) => out.push_str(&expanded),
            None => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    out
}

fn expand_token(token: &str, name: &str, index: usize) -> Option<String> {
    match token {
        "name" => Some(name.to_string()),
        "index" => Some(index.to_string()),
        _ => {
            let width: usize = token
                .strip_prefix("index:0")?
                .strip_suffix('d')?
                .parse()
                .ok()?;
            Some(format!("{index:0width$}"))
        }
    }
}

/// Strip the last extension from a file name: `smile.gif` becomes `smile`.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 && !file_name[dot + 1..].contains('/') => &file_name[..dot],
        _ => file_name,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
