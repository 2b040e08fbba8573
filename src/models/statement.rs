//! The creation statement: a small JSON document naming the organization,
//! bucket, and permission flags a new set of credentials should be scoped to.
//!
//! Decoded fresh for every create-user call and discarded after use. The
//! parser is pure — no side effects, no retained state.

use crate::models::remote::{Permission, PermissionAction};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("empty creation statement")]
    Empty,
    #[error("only 1 creation statement is supported per request")]
    MultipleStatements,
    #[error("unable to decode creation statement `{raw}`: {source}")]
    Malformed {
        raw: String,
        source: serde_json::Error,
    },
}

/// A validated creation request descriptor.
///
/// Missing boolean fields default to false; missing string fields decode as
/// empty (semantically invalid — downstream find-by-name calls will fail
/// with a not-found error). Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreationStatement {
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub read_permission: bool,
    #[serde(default)]
    pub write_permission: bool,
}

impl CreationStatement {
    /// Build the permission set the statement asks for: zero, one, or two
    /// entries scoped to the bucket resource type. Both flags false yields
    /// an empty set — no implicit default grant.
    pub fn permissions(&self) -> Vec<Permission> {
        let mut permissions = Vec::new();
        if self.read_permission {
            permissions.push(Permission::buckets(PermissionAction::Read));
        }
        if self.write_permission {
            permissions.push(Permission::buckets(PermissionAction::Write));
        }
        permissions
    }
}

/// Decode the ordered sequence of raw statement strings supplied by the host
/// into exactly one `CreationStatement`.
///
/// Exactly one statement document is accepted per creation request; zero or
/// multiple documents is a hard validation error, not something to relax
/// silently.
pub fn parse_creation_statements(
    statements: &[String],
) -> Result<CreationStatement, StatementError> {
    match statements {
        [] => Err(StatementError::Empty),
        [single] => {
            serde_json::from_str(single).map_err(|source| StatementError::Malformed {
                raw: single.clone(),
                source,
            })
        }
        _ => Err(StatementError::MultipleStatements),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::remote::RESOURCE_TYPE_BUCKETS;

    #[test]
    fn rejects_empty_statement_list() {
        let err = parse_creation_statements(&[]).unwrap_err();
        assert!(matches!(err, StatementError::Empty));
    }

    #[test]
    fn rejects_multiple_statements() {
        let stmts = vec!["{}".to_string(), "{}".to_string()];
        let err = parse_creation_statements(&stmts).unwrap_err();
        assert!(matches!(err, StatementError::MultipleStatements));
    }

    #[test]
    fn malformed_statement_carries_raw_content() {
        let stmts = vec!["not json".to_string()];
        let err = parse_creation_statements(&stmts).unwrap_err();
        match err {
            StatementError::Malformed { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        let stmts = vec![r#"{"organization": 42}"#.to_string()];
        let err = parse_creation_statements(&stmts).unwrap_err();
        assert!(matches!(err, StatementError::Malformed { .. }));
    }

    #[test]
    fn parses_full_statement() {
        let stmts = vec![
            r#"{"organization":"org1","bucket":"bkt1","read_permission":true,"write_permission":false}"#
                .to_string(),
        ];
        let stmt = parse_creation_statements(&stmts).unwrap();
        assert_eq!(stmt.organization, "org1");
        assert_eq!(stmt.bucket, "bkt1");
        assert!(stmt.read_permission);
        assert!(!stmt.write_permission);
    }

    #[test]
    fn missing_booleans_default_to_false() {
        let stmts = vec![r#"{"organization":"org1","bucket":"bkt1"}"#.to_string()];
        let stmt = parse_creation_statements(&stmts).unwrap();
        assert!(!stmt.read_permission);
        assert!(!stmt.write_permission);
    }

    #[test]
    fn missing_strings_decode_as_empty() {
        let stmts = vec![r#"{"read_permission":true}"#.to_string()];
        let stmt = parse_creation_statements(&stmts).unwrap();
        assert_eq!(stmt.organization, "");
        assert_eq!(stmt.bucket, "");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let stmts = vec![r#"{"organization":"o","bucket":"b","retention":"30d"}"#.to_string()];
        assert!(parse_creation_statements(&stmts).is_ok());
    }

    #[test]
    fn permission_set_reflects_flags_exactly() {
        let stmt = CreationStatement {
            organization: "o".into(),
            bucket: "b".into(),
            read_permission: true,
            write_permission: false,
        };
        let perms = stmt.permissions();
        assert_eq!(perms.len(), 1);
        assert_eq!(perms[0].action, PermissionAction::Read);
        assert_eq!(perms[0].resource.resource_type, RESOURCE_TYPE_BUCKETS);

        let none = CreationStatement {
            read_permission: false,
            write_permission: false,
            ..stmt
        };
        assert!(none.permissions().is_empty());
    }
}
