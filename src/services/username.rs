//! Username template engine.
//!
//! Usernames for provisioned principals are rendered from a small template
//! language: literal text plus `{{field}}` or `{{field:N}}` placeholders,
//! where `N` truncates that field's rendered value. Recognized fields:
//!
//! - `display_name` — caller-supplied display name
//! - `role_name`    — caller-supplied role name
//! - `random`       — random alphanumeric component (`N` sets its length)
//! - `unix_time`    — seconds since the epoch at render time
//!
//! Every rendered username then gets the same post-processing: truncated to
//! 100 characters, hyphens replaced with underscores, lowercased.

use rand::{Rng, distributions::Alphanumeric};
use serde::Deserialize;
use thiserror::Error;

/// Fallback template used when the operator does not configure one.
pub const DEFAULT_USERNAME_TEMPLATE: &str =
    "v_{{display_name:15}}_{{role_name:15}}_{{random:20}}_{{unix_time}}";

/// Overall length cap applied after rendering.
const MAX_USERNAME_LEN: usize = 100;

/// Default length of the `random` component when no truncation is given.
const DEFAULT_RANDOM_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown template field `{0}`")]
    UnknownField(String),
    #[error("invalid truncation length `{0}`")]
    InvalidTruncation(String),
    #[error("unterminated placeholder in template")]
    Unterminated,
    #[error("template rendered an empty username")]
    EmptyRender,
}

/// Caller-supplied metadata substituted into the template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsernameMetadata {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub role_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    DisplayName,
    RoleName,
    Random,
    UnixTime,
}

#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Placeholder { field: Field, truncate: Option<usize> },
}

/// A parsed username template, validated once at initialization and reused
/// for every provisioning call.
#[derive(Debug, Clone)]
pub struct UsernameTemplate {
    parts: Vec<Part>,
}

impl UsernameTemplate {
    /// Parse and validate a template string. Unknown fields, malformed
    /// truncation lengths, and unterminated `{{` are all hard errors.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find("{{") {
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after.find("}}").ok_or(TemplateError::Unterminated)?;
            parts.push(parse_placeholder(after[..close].trim())?);
            rest = &after[close + 2..];
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }
        Ok(Self { parts })
    }

    /// Render a username for the given metadata.
    ///
    /// Fails only when the post-processed result is empty, which a trial
    /// render at initialization time is expected to have caught for
    /// degenerate templates.
    pub fn generate(&self, metadata: &UsernameMetadata) -> Result<String, TemplateError> {
        let mut rendered = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => rendered.push_str(text),
                Part::Placeholder { field, truncate } => {
                    let value = match field {
                        Field::DisplayName => {
                            truncate_chars(&metadata.display_name, *truncate).to_string()
                        }
                        Field::RoleName => {
                            truncate_chars(&metadata.role_name, *truncate).to_string()
                        }
                        Field::Random => random_component(truncate.unwrap_or(DEFAULT_RANDOM_LEN)),
                        Field::UnixTime => {
                            let ts = chrono::Utc::now().timestamp().to_string();
                            truncate_chars(&ts, *truncate).to_string()
                        }
                    };
                    rendered.push_str(&value);
                }
            }
        }

        let username = truncate_chars(&rendered, Some(MAX_USERNAME_LEN))
            .replace('-', "_")
            .to_lowercase();
        if username.is_empty() {
            return Err(TemplateError::EmptyRender);
        }
        Ok(username)
    }
}

fn parse_placeholder(inner: &str) -> Result<Part, TemplateError> {
    let (name, truncate) = match inner.split_once(':') {
        Some((name, len)) => {
            let len = len
                .trim()
                .parse::<usize>()
                .map_err(|_| TemplateError::InvalidTruncation(len.trim().to_string()))?;
            if len == 0 {
                return Err(TemplateError::InvalidTruncation(len.to_string()));
            }
            (name.trim(), Some(len))
        }
        None => (inner, None),
    };

    let field = match name {
        "display_name" => Field::DisplayName,
        "role_name" => Field::RoleName,
        "random" => Field::Random,
        "unix_time" => Field::UnixTime,
        other => return Err(TemplateError::UnknownField(other.to_string())),
    };
    Ok(Part::Placeholder { field, truncate })
}

/// Truncate to at most `limit` characters, respecting char boundaries.
fn truncate_chars(value: &str, limit: Option<usize>) -> &str {
    match limit {
        Some(limit) => match value.char_indices().nth(limit) {
            Some((idx, _)) => &value[..idx],
            None => value,
        },
        None => value,
    }
}

fn random_component(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(display: &str, role: &str) -> UsernameMetadata {
        UsernameMetadata {
            display_name: display.into(),
            role_name: role.into(),
        }
    }

    #[test]
    fn default_template_renders_expected_shape() {
        let template = UsernameTemplate::parse(DEFAULT_USERNAME_TEMPLATE).unwrap();
        let username = template.generate(&metadata("token", "readonly")).unwrap();
        assert!(username.starts_with("v_token_readonly_"));
        assert!(username.len() <= 100);
        assert_eq!(username, username.to_lowercase());
    }

    #[test]
    fn default_template_accepts_empty_metadata() {
        let template = UsernameTemplate::parse(DEFAULT_USERNAME_TEMPLATE).unwrap();
        assert!(template.generate(&UsernameMetadata::default()).is_ok());
    }

    #[test]
    fn placeholder_truncation_applies_per_field() {
        let template = UsernameTemplate::parse("{{display_name:4}}_{{role_name:2}}").unwrap();
        let username = template.generate(&metadata("abcdefgh", "writer")).unwrap();
        assert_eq!(username, "abcd_wr");
    }

    #[test]
    fn random_length_follows_truncation() {
        let template = UsernameTemplate::parse("{{random:8}}").unwrap();
        let username = template.generate(&UsernameMetadata::default()).unwrap();
        assert_eq!(username.len(), 8);
    }

    #[test]
    fn hyphens_become_underscores_and_output_is_lowercased() {
        let template = UsernameTemplate::parse("{{display_name}}").unwrap();
        let username = template.generate(&metadata("Some-User", "")).unwrap();
        assert_eq!(username, "some_user");
    }

    #[test]
    fn overall_length_is_capped() {
        let template = UsernameTemplate::parse("{{display_name}}").unwrap();
        let username = template.generate(&metadata(&"x".repeat(300), "")).unwrap();
        assert_eq!(username.len(), 100);
    }

    #[test]
    fn unknown_field_is_rejected_at_parse() {
        let err = UsernameTemplate::parse("{{tenant}}").unwrap_err();
        match err {
            TemplateError::UnknownField(name) => assert_eq!(name, "tenant"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unterminated_placeholder_is_rejected() {
        let err = UsernameTemplate::parse("v_{{display_name").unwrap_err();
        assert!(matches!(err, TemplateError::Unterminated));
    }

    #[test]
    fn bad_truncation_length_is_rejected() {
        let err = UsernameTemplate::parse("{{display_name:abc}}").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidTruncation(_)));
    }

    #[test]
    fn degenerate_template_fails_trial_render() {
        let template = UsernameTemplate::parse("{{display_name}}").unwrap();
        let err = template.generate(&UsernameMetadata::default()).unwrap_err();
        assert!(matches!(err, TemplateError::EmptyRender));
    }
}
