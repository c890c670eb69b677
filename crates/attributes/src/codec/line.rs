//! Data line grammar: `sigil name ":" payload`.

use crate::container::HolderKind;
use crate::error::LoadError;
use crate::numeric::{Numeric, NumericTag};

pub(crate) const BOUNDED: char = HolderKind::BoundedInt.sigil();
pub(crate) const TEXT: char = HolderKind::Text.sigil();
pub(crate) const REACTIVE: char = HolderKind::ReactiveInt.sigil();
pub(crate) const NUMBER: char = HolderKind::NumberInt.sigil();

/// Why `name` cannot appear as a field, child or kind name on the wire, if
/// it cannot.
pub(crate) fn name_defect(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("empty")
    } else if name.trim() != name {
        Some("surrounding whitespace")
    } else if name.contains(['\n', '\r']) {
        Some("contains a line break")
    } else if name.contains([':', '.', '[', ']']) {
        Some("contains one of `:` `.` `[` `]`")
    } else {
        None
    }
}

/// A data line split into its parts, payload not yet parsed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DataLine<'a> {
    pub sigil: char,
    pub name: &'a str,
    pub payload: &'a str,
}

fn structural(line: &str, reason: &'static str) -> LoadError {
    LoadError::StructuralParse {
        line: line.to_owned(),
        reason,
    }
}

impl<'a> DataLine<'a> {
    /// Splits at the first `:`. The payload keeps any further colons.
    pub fn split(line: &'a str) -> Result<Self, LoadError> {
        let mut chars = line.chars();
        let sigil = chars.next().ok_or_else(|| structural(line, "empty line"))?;
        if !matches!(sigil, BOUNDED | TEXT | REACTIVE | NUMBER) {
            return Err(structural(line, "unknown sigil"));
        }
        let (name, payload) = chars
            .as_str()
            .split_once(':')
            .ok_or_else(|| structural(line, "missing `:` after name"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(structural(line, "missing name"));
        }
        Ok(Self {
            sigil,
            name,
            payload,
        })
    }
}

/// A typed call payload `T(args)` plus whatever follows the `)`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Call<'a> {
    pub tag: NumericTag,
    pub args: &'a str,
    pub trailer: &'a str,
}

impl<'a> Call<'a> {
    pub fn parse(line: &str, payload: &'a str) -> Result<Self, LoadError> {
        let payload = payload.trim();
        let mut chars = payload.chars();
        let tag = chars
            .next()
            .and_then(NumericTag::from_char)
            .ok_or_else(|| structural(line, "unknown type tag"))?;
        let rest = chars
            .as_str()
            .strip_prefix('(')
            .ok_or_else(|| structural(line, "missing `(`"))?;
        let (args, trailer) = rest
            .split_once(')')
            .ok_or_else(|| structural(line, "missing `)`"))?;
        Ok(Self { tag, args, trailer })
    }

    /// Parses exactly `N` comma-separated values of `T`.
    pub fn values<T: Numeric, const N: usize>(&self, line: &str) -> Result<[T; N], LoadError> {
        let parts: Vec<&str> = self.args.split(',').collect();
        if parts.len() != N {
            return Err(structural(line, "wrong number of values"));
        }
        let mut out = [T::default(); N];
        for (slot, part) in out.iter_mut().zip(parts) {
            *slot = T::parse_invariant(part).ok_or_else(|| LoadError::ValueFormat {
                payload: part.trim().to_owned(),
                tag: self.tag,
            })?;
        }
        Ok(out)
    }
}

/// `T(current,min,max)`
pub(crate) fn bounded<T: Numeric>(current: T, min: T, max: T) -> String {
    format!(
        "{}({},{},{})",
        T::TAG,
        current.to_invariant(),
        min.to_invariant(),
        max.to_invariant()
    )
}

/// `T(value)`
pub(crate) fn scalar<T: Numeric>(value: T) -> String {
    format!("{}({})", T::TAG, value.to_invariant())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_first_colon() {
        let line = DataLine::split("#motto:carpe: diem").unwrap();
        assert_eq!(
            line,
            DataLine {
                sigil: '#',
                name: "motto",
                payload: "carpe: diem"
            }
        );
    }

    #[test]
    fn structural_failures() {
        for (bad, reason) in [
            ("?hp:I(1)", "unknown sigil"),
            ("*hp", "missing `:` after name"),
            ("*:I(1,0,1)", "missing name"),
        ] {
            match DataLine::split(bad) {
                Err(LoadError::StructuralParse { reason: r, .. }) => assert_eq!(r, reason),
                other => panic!("{bad}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn call_payloads() {
        let call = Call::parse("", "F(12.5):").unwrap();
        assert_eq!(call.tag, NumericTag::Float);
        assert_eq!(call.trailer, ":");
        assert_eq!(call.values::<f32, 1>("").unwrap(), [12.5]);

        let call = Call::parse("", "I(80,0,100)").unwrap();
        assert_eq!(call.values::<i32, 3>("").unwrap(), [80, 0, 100]);
        assert!(matches!(
            call.values::<i32, 2>(""),
            Err(LoadError::StructuralParse { .. })
        ));

        assert!(matches!(
            Call::parse("", "X(1)"),
            Err(LoadError::StructuralParse { reason: "unknown type tag", .. })
        ));
        assert!(matches!(
            Call::parse("", "I(1"),
            Err(LoadError::StructuralParse { reason: "missing `)`", .. })
        ));
    }

    #[test]
    fn overflow_is_a_value_format_error() {
        let call = Call::parse("", "I(99999999999)").unwrap();
        assert_eq!(
            call.values::<i32, 1>(""),
            Err(LoadError::ValueFormat {
                payload: "99999999999".into(),
                tag: NumericTag::Int
            })
        );
    }

    #[test]
    fn non_finite_floats_are_value_format_errors() {
        let call = Call::parse("", "F(1e40)").unwrap();
        assert_eq!(
            call.values::<f32, 1>(""),
            Err(LoadError::ValueFormat {
                payload: "1e40".into(),
                tag: NumericTag::Float
            })
        );

        let call = Call::parse("", "D(NaN,0,10)").unwrap();
        assert!(matches!(
            call.values::<f64, 3>(""),
            Err(LoadError::ValueFormat { .. })
        ));

        let call = Call::parse("", "F(-inf)").unwrap();
        assert_eq!(call.values::<f32, 1>("").unwrap(), [f32::NEG_INFINITY]);
    }

    #[test]
    fn names_must_survive_the_wire() {
        assert_eq!(name_defect("max_hp"), None);
        assert_eq!(name_defect("Heal (x2)"), None);
        assert_eq!(name_defect(""), Some("empty"));
        assert_eq!(name_defect(" hp"), Some("surrounding whitespace"));
        assert_eq!(name_defect("a\nb"), Some("contains a line break"));
        for bad in ["a:b", "x.y", "bag[0]", "odd]"] {
            assert!(name_defect(bad).is_some(), "{bad}");
        }
    }

    #[test]
    fn formatting() {
        assert_eq!(bounded(80_i32, 0, 100), "I(80,0,100)");
        assert_eq!(scalar(0.1_f64), "D(0.1)");
        assert_eq!(scalar(2.0_f32), "F(2)");
    }
}
