use serde::Deserialize;

/// Loosely typed record identifier as it arrives off the wire: a JSON
/// integer, a float, or a string. Anything else fails deserialization and
/// is treated the same as a malformed id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Int(i64),
    Float(f64),
    Text(String),
}

impl IdInput {
    /// Coerce to a surrogate key. Integers pass through, finite floats are
    /// truncated, strings must be plain ASCII digits. Everything else is
    /// `None`, which repositories surface as not-found rather than an error.
    pub fn coerce(&self) -> Option<i32> {
        match self {
            IdInput::Int(n) => i32::try_from(*n).ok(),
            IdInput::Float(f) if f.is_finite() && *f >= i32::MIN as f64 && *f <= i32::MAX as f64 => {
                Some(*f as i32)
            }
            IdInput::Float(_) => None,
            IdInput::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse::<i32>().ok()
            }
            IdInput::Text(_) => None,
        }
    }
}

impl From<i32> for IdInput {
    fn from(id: i32) -> Self {
        IdInput::Int(id as i64)
    }
}

impl From<String> for IdInput {
    fn from(raw: String) -> Self {
        IdInput::Text(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_ids_pass_through() {
        assert_eq!(IdInput::Int(42).coerce(), Some(42));
    }

    #[test]
    fn float_valued_integers_truncate() {
        assert_eq!(IdInput::Float(42.0).coerce(), Some(42));
        assert_eq!(IdInput::Float(42.9).coerce(), Some(42));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        assert_eq!(IdInput::Float(f64::NAN).coerce(), None);
        assert_eq!(IdInput::Float(f64::INFINITY).coerce(), None);
    }

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(IdInput::Text("42".into()).coerce(), Some(42));
    }

    #[test]
    fn non_numeric_strings_are_rejected() {
        assert_eq!(IdInput::Text("abc".into()).coerce(), None);
        assert_eq!(IdInput::Text("4.2".into()).coerce(), None);
        assert_eq!(IdInput::Text("-4".into()).coerce(), None);
        assert_eq!(IdInput::Text("".into()).coerce(), None);
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        assert_eq!(IdInput::Int(i64::MAX).coerce(), None);
        assert_eq!(IdInput::Text("99999999999999999999".into()).coerce(), None);
    }
}
