//! Value codec: stored attribute value ⇄ display text
//!
//! One branch per [`ValueKind`]. Decoding never fails; encoding validates the
//! text against the slot's kind and only then touches the host.

use crate::error::{CodecError, HostError};
use crate::host::HostDocument;
use crate::types::{AttrValue, EntityId, ResolvedSlot, ValueKind};
use super::units::DisplayUnit;
use regex::Regex;
use std::sync::OnceLock;

/// How entity-link text that is not a numeric id gets resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkLookup {
    /// Only numeric ids are accepted
    #[default]
    IdOnly,
    /// Fall back to the host's named sub-collection for the slot (worksets, types)
    ByName,
}

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    // Round to 6 decimal places; enough for display units down to micrometres
    let rounded = (n * 1e6).round() / 1e6;
    let text = format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string();
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

/// Stored value → display text. Empty when the slot holds nothing readable.
pub fn decode<H: HostDocument + ?Sized>(host: &H, slot: &ResolvedSlot) -> String {
    let Some(value) = host.read(&slot.slot) else {
        return String::new();
    };
    match (slot.kind, value) {
        (_, AttrValue::Text(text)) => text.unwrap_or_default(),
        (ValueKind::BooleanLike, AttrValue::Integer(1)) => "Yes".to_string(),
        (ValueKind::BooleanLike, AttrValue::Integer(0)) => "No".to_string(),
        (_, AttrValue::Integer(n)) => n.to_string(),
        (_, AttrValue::Real(internal)) => {
            // Unit metadata is best-effort: a failed conversion shows the raw value
            let display = slot
                .unit
                .and_then(|unit| unit.to_display(internal))
                .unwrap_or(internal);
            format_number(display)
        }
        (_, AttrValue::Link(id)) => {
            if !id.is_valid() {
                return id.to_string();
            }
            host.display_name(id).unwrap_or_else(|| id.to_string())
        }
    }
}

/// Display text → value to store, without touching the host
pub fn parse<H: HostDocument + ?Sized>(
    host: &H,
    slot: &ResolvedSlot,
    text: &str,
    links: LinkLookup,
) -> Result<AttrValue, CodecError> {
    if slot.read_only {
        return Err(CodecError::ReadOnly {
            name: slot.name.clone(),
        });
    }
    let trimmed = text.trim();
    match slot.kind {
        ValueKind::Text => Ok(AttrValue::Text(Some(text.to_string()))),
        ValueKind::Integer => trimmed
            .parse::<i64>()
            .map(AttrValue::Integer)
            .map_err(|_| mismatch(slot, "an integer", text)),
        ValueKind::BooleanLike => match trimmed.to_lowercase().as_str() {
            "yes" | "true" | "1" => Ok(AttrValue::Integer(1)),
            "no" | "false" | "0" => Ok(AttrValue::Integer(0)),
            _ => Err(mismatch(slot, "Yes/No", text)),
        },
        ValueKind::Real => parse_real(slot, trimmed)
            .map(AttrValue::Real)
            .ok_or_else(|| mismatch(slot, "a number", text)),
        ValueKind::EntityLink => {
            if let Ok(id) = trimmed.parse::<i64>() {
                return Ok(AttrValue::Link(EntityId(id)));
            }
            let found = match links {
                LinkLookup::ByName => host.named_link(&slot.slot, trimmed),
                LinkLookup::IdOnly => None,
            };
            found.map(AttrValue::Link).ok_or_else(|| CodecError::LinkNotFound {
                name: slot.name.clone(),
                value: text.to_string(),
            })
        }
    }
}

/// Validate `text` and store it in the slot
pub fn encode<H: HostDocument + ?Sized>(
    host: &mut H,
    slot: &ResolvedSlot,
    text: &str,
    links: LinkLookup,
) -> Result<(), CodecError> {
    let value = parse(&*host, slot, text, links)?;
    host.write(&slot.slot, value).map_err(|err| match err {
        HostError::ReadOnly(_) => CodecError::ReadOnly {
            name: slot.name.clone(),
        },
        HostError::WrongStorage { expected, .. } => CodecError::TypeMismatch {
            name: slot.name.clone(),
            expected,
            value: text.to_string(),
        },
        HostError::MissingEntity(id) => CodecError::LinkNotFound {
            name: slot.name.clone(),
            value: id.to_string(),
        },
        HostError::UnknownType(value) => CodecError::LinkNotFound {
            name: slot.name.clone(),
            value,
        },
        other => CodecError::HostRejected {
            name: slot.name.clone(),
            reason: other.to_string(),
        },
    })
}

fn mismatch(slot: &ResolvedSlot, expected: &'static str, text: &str) -> CodecError {
    CodecError::TypeMismatch {
        name: slot.name.clone(),
        expected,
        value: text.to_string(),
    }
}

fn number_with_unit() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*(\S.*)?$")
            .expect("number pattern is valid")
    })
}

/// "3000", "3000 mm", "3 m" → internal units
fn parse_real(slot: &ResolvedSlot, text: &str) -> Option<f64> {
    let caps = number_with_unit().captures(text)?;
    let number: f64 = caps.get(1)?.as_str().parse().ok()?;
    if !number.is_finite() {
        return None;
    }

    let value = match (caps.get(2).map(|m| m.as_str()), slot.unit) {
        (None, Some(unit)) => unit.from_display(number).unwrap_or(number),
        (None, None) => number,
        (Some(suffix), Some(unit)) => {
            let typed = DisplayUnit::parse(suffix)?;
            if typed.dimension() != unit.dimension() {
                return None;
            }
            typed.from_display(number)?
        }
        // A unit typed against a unitless attribute has nothing to convert into
        (Some(_), None) => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::names::WellKnown;
    use crate::core::resolver::resolve;
    use crate::host::{Attribute, Element, MemoryDocument};

    fn doc() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_workset(1, "Shell");
        doc.add_workset(2, "Interior");
        doc.add_element(Element::type_of(10, "Generic - 200mm", "Basic Wall", "Walls"));
        doc.add_element(
            Element::instance(100, "Wall 1", "Walls")
                .with_type(10)
                .with(Attribute::new("Comments", AttrValue::Text(None)))
                .with(Attribute::new("Count", AttrValue::Integer(4)))
                .with(Attribute::new("Is Structural", AttrValue::Integer(1)))
                .with(
                    Attribute::new("Unconnected Height", AttrValue::Real(10.0))
                        .unit(DisplayUnit::Millimeters),
                )
                .with(Attribute::new("Ratio", AttrValue::Real(0.25)))
                .with(Attribute::new("Area", AttrValue::Real(12.5)).read_only())
                .with(
                    Attribute::new("Workset", AttrValue::Link(EntityId(1)))
                        .builtin(WellKnown::ElemPartitionParam),
                )
                .with(Attribute::new("Host", AttrValue::Link(EntityId::INVALID))),
        );
        doc
    }

    fn slot(doc: &MemoryDocument, name: &str) -> ResolvedSlot {
        resolve(doc, EntityId(100), name).unwrap()
    }

    fn in_transaction<F: FnOnce(&mut MemoryDocument)>(doc: &mut MemoryDocument, f: F) {
        doc.begin_transaction("test").unwrap();
        f(doc);
        doc.commit_transaction().unwrap();
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3048.0), "3048");
        assert_eq!(format_number(2.50), "2.5");
        assert_eq!(format_number(0.123456789), "0.123457");
        assert_eq!(format_number(-0.0000001), "0");
    }

    #[test]
    fn test_decode_text_unset_is_empty() {
        let doc = doc();
        assert_eq!(decode(&doc, &slot(&doc, "Comments")), "");
    }

    #[test]
    fn test_decode_real_converts_to_display_unit() {
        let doc = doc();
        assert_eq!(decode(&doc, &slot(&doc, "Unconnected Height")), "3048");
        assert_eq!(decode(&doc, &slot(&doc, "Ratio")), "0.25");
    }

    #[test]
    fn test_boolean_like_decode_and_reject() {
        let mut doc = doc();
        let flag = slot(&doc, "Is Structural");
        assert_eq!(decode(&doc, &flag), "Yes");
        in_transaction(&mut doc, |doc| {
            encode(doc, &flag, "no", LinkLookup::IdOnly).unwrap();
        });
        assert_eq!(decode(&doc, &flag), "No");
        let err = parse(&doc, &flag, "maybe", LinkLookup::IdOnly).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { expected: "Yes/No", .. }));
    }

    #[test]
    fn test_boolean_like_accepts_true_false_and_digits() {
        let doc = doc();
        let flag = slot(&doc, "Is Structural");
        assert_eq!(parse(&doc, &flag, "TRUE", LinkLookup::IdOnly), Ok(AttrValue::Integer(1)));
        assert_eq!(parse(&doc, &flag, " 0 ", LinkLookup::IdOnly), Ok(AttrValue::Integer(0)));
    }

    #[test]
    fn test_integer_round_trip() {
        let mut doc = doc();
        let count = slot(&doc, "Count");
        in_transaction(&mut doc, |doc| {
            encode(doc, &count, "12", LinkLookup::IdOnly).unwrap();
        });
        assert_eq!(decode(&doc, &count), "12");
        assert!(parse(&doc, &count, "twelve", LinkLookup::IdOnly).is_err());
    }

    #[test]
    fn test_real_encode_from_display_unit() {
        let mut doc = doc();
        let height = slot(&doc, "Unconnected Height");
        in_transaction(&mut doc, |doc| {
            encode(doc, &height, "3000", LinkLookup::IdOnly).unwrap();
        });
        assert_eq!(decode(&doc, &height), "3000");
    }

    #[test]
    fn test_real_encode_with_typed_unit() {
        let doc = doc();
        let height = slot(&doc, "Unconnected Height");
        let value = parse(&doc, &height, "3 m", LinkLookup::IdOnly).unwrap();
        match value {
            AttrValue::Real(feet) => assert!((feet - 3.0 / 0.3048).abs() < 1e-9),
            other => panic!("expected real, got {:?}", other),
        }
        assert!(parse(&doc, &height, "3 m²", LinkLookup::IdOnly).is_err());
        assert!(parse(&doc, &slot(&doc, "Ratio"), "3 mm", LinkLookup::IdOnly).is_err());
    }

    #[test]
    fn test_real_encode_rejects_overflow() {
        let mut doc = doc();
        let height = slot(&doc, "Unconnected Height");
        let ratio = slot(&doc, "Ratio");
        for text in ["1e400", "-1e400", "1e400 m"] {
            assert!(
                matches!(
                    parse(&doc, &height, text, LinkLookup::IdOnly),
                    Err(CodecError::TypeMismatch { .. })
                ),
                "{} accepted",
                text
            );
        }
        assert!(matches!(
            parse(&doc, &ratio, "1e400", LinkLookup::IdOnly),
            Err(CodecError::TypeMismatch { .. })
        ));
        in_transaction(&mut doc, |doc| {
            assert!(encode(doc, &height, "1e400", LinkLookup::IdOnly).is_err());
        });
        assert_eq!(decode(&doc, &height), "3048");
    }

    #[test]
    fn test_read_only_rejected_before_mutation() {
        let mut doc = doc();
        let area = slot(&doc, "Area");
        in_transaction(&mut doc, |doc| {
            let err = encode(doc, &area, "99", LinkLookup::IdOnly).unwrap_err();
            assert_eq!(err, CodecError::ReadOnly { name: "Area".into() });
        });
        assert_eq!(decode(&doc, &area), "12.5");
    }

    #[test]
    fn test_link_decode_name_or_raw_id() {
        let doc = doc();
        assert_eq!(decode(&doc, &slot(&doc, "Workset")), "Shell");
        assert_eq!(decode(&doc, &slot(&doc, "Host")), "-1");
    }

    #[test]
    fn test_link_encode_by_id_or_name() {
        let doc = doc();
        let workset = slot(&doc, "Workset");
        assert_eq!(
            parse(&doc, &workset, "2", LinkLookup::IdOnly),
            Ok(AttrValue::Link(EntityId(2)))
        );
        assert_eq!(
            parse(&doc, &workset, "Interior", LinkLookup::ByName),
            Ok(AttrValue::Link(EntityId(2)))
        );
        assert!(matches!(
            parse(&doc, &workset, "Interior", LinkLookup::IdOnly),
            Err(CodecError::LinkNotFound { .. })
        ));
    }

    #[test]
    fn test_text_encode_always_succeeds() {
        let mut doc = doc();
        let comments = slot(&doc, "Comments");
        in_transaction(&mut doc, |doc| {
            encode(doc, &comments, "  spaced  ", LinkLookup::IdOnly).unwrap();
        });
        assert_eq!(decode(&doc, &comments), "  spaced  ");
    }
}
