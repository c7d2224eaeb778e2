//! Parameter validation shared by all preparers
//!
//! Every helper takes the resource kind and field name so the resulting
//! error can be shown to the operator verbatim.

use crate::error::{Error, Result};
use std::num::IntErrorKind;

/// Platform maximum for user and group identifiers.
///
/// The value itself is reserved, so the largest legal identifier is
/// `MAX_ID - 1`.
pub const MAX_ID: u32 = u32::MAX;

/// An enumerated parameter with a fixed set of tokens.
pub trait Token: Copy + Sized + 'static {
    /// Every legal value, in the order shown to operators.
    const ALL: &'static [Self];

    /// The token accepted in configuration.
    fn token(&self) -> &'static str;
}

/// Require a non-empty value.
pub fn required<'a>(kind: &str, field: &'static str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(Error::MissingParameter {
            kind: kind.to_string(),
            field,
        });
    }
    Ok(value)
}

/// Reject two alternatives supplied together.
pub fn exclusive(
    kind: &str,
    (first, first_value): (&'static str, &str),
    (second, second_value): (&'static str, &str),
) -> Result<()> {
    if !first_value.is_empty() && !second_value.is_empty() {
        return Err(Error::ConflictingParameter {
            kind: kind.to_string(),
            first,
            second,
        });
    }
    Ok(())
}

/// Parse an optional identifier in `0..MAX_ID`.
///
/// An empty value means "not set".
pub fn parse_id(kind: &str, field: &'static str, value: &str) -> Result<Option<u32>> {
    if value.is_empty() {
        return Ok(None);
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Format {
            kind: kind.to_string(),
            field,
            value: value.to_string(),
        });
    }

    let parsed = match value.parse::<u64>() {
        Ok(n) => n,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
            return Err(Error::Range {
                kind: kind.to_string(),
                field,
            });
        }
        Err(_) => {
            return Err(Error::Format {
                kind: kind.to_string(),
                field,
                value: value.to_string(),
            });
        }
    };

    match u32::try_from(parsed) {
        Ok(id) if id < MAX_ID => Ok(Some(id)),
        _ => Err(Error::Range {
            kind: kind.to_string(),
            field,
        }),
    }
}

/// Parse an optional enumerated value. An empty value means "not set".
pub fn parse_enum<T: Token>(kind: &str, field: &'static str, value: &str) -> Result<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }

    T::ALL
        .iter()
        .copied()
        .find(|t| t.token() == value)
        .map(Some)
        .ok_or_else(|| Error::InvalidEnum {
            kind: kind.to_string(),
            field,
            allowed: T::ALL.iter().map(Token::token).collect(),
        })
}

/// Optional string: empty means "not set".
pub fn optional(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Color {
        Red,
        Blue,
    }

    impl Token for Color {
        const ALL: &'static [Self] = &[Color::Red, Color::Blue];

        fn token(&self) -> &'static str {
            match self {
                Color::Red => "red",
                Color::Blue => "blue",
            }
        }
    }

    #[test]
    fn test_required() {
        assert_eq!(required("user", "username", "svc").unwrap(), "svc");
        let err = required("user", "username", "").unwrap_err();
        assert!(matches!(err, Error::MissingParameter { field: "username", .. }));
    }

    #[test]
    fn test_exclusive() {
        assert!(exclusive("user", ("groupname", "ops"), ("gid", "")).is_ok());
        assert!(exclusive("user", ("groupname", ""), ("gid", "50")).is_ok());
        let err = exclusive("user", ("groupname", "ops"), ("gid", "50")).unwrap_err();
        assert!(matches!(
            err,
            Error::ConflictingParameter {
                first: "groupname",
                second: "gid",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_id_boundaries() {
        assert_eq!(parse_id("user", "uid", "").unwrap(), None);
        assert_eq!(parse_id("user", "uid", "0").unwrap(), Some(0));
        assert_eq!(
            parse_id("user", "uid", &(u32::MAX - 1).to_string()).unwrap(),
            Some(u32::MAX - 1)
        );

        let err = parse_id("user", "uid", &u32::MAX.to_string()).unwrap_err();
        assert!(matches!(err, Error::Range { field: "uid", .. }));

        let err = parse_id("user", "uid", &(u64::from(u32::MAX) + 10).to_string()).unwrap_err();
        assert!(matches!(err, Error::Range { .. }));

        let err = parse_id("user", "uid", "99999999999999999999999").unwrap_err();
        assert!(matches!(err, Error::Range { .. }));
    }

    #[test]
    fn test_parse_id_format() {
        for bad in ["abc", "-5", "+5", "12a", " 12", "1.5"] {
            let err = parse_id("user", "gid", bad).unwrap_err();
            assert!(
                matches!(err, Error::Format { field: "gid", .. }),
                "{bad} should be a format error"
            );
        }
    }

    #[test]
    fn test_parse_enum() {
        assert_eq!(parse_enum::<Color>("paint", "color", "").unwrap(), None);
        assert_eq!(
            parse_enum::<Color>("paint", "color", "blue").unwrap(),
            Some(Color::Blue)
        );

        let err = parse_enum::<Color>("paint", "color", "green").unwrap_err();
        assert_eq!(
            err.to_string(),
            "paint \"color\" parameter invalid, use red or blue"
        );
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional(String::new()), None);
        assert_eq!(optional("x".into()), Some("x".to_string()));
    }
}
