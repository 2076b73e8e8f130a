//! Extraction of canonical external identifiers from raw hits.

use serde_json::Value;

use crate::registry::SourceRegistry;
use crate::types::RawHit;

/// Canonical identifier per registry for one hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifiers {
    values: [Option<String>; SourceRegistry::COUNT],
}

impl Identifiers {
    /// Identifier for `registry`, if the hit carries a usable one.
    pub fn get(&self, registry: SourceRegistry) -> Option<&str> {
        self.values[registry.slot()].as_deref()
    }

    /// Present identifiers in canonical registry order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceRegistry, &str)> {
        SourceRegistry::ALL
            .into_iter()
            .filter_map(|registry| self.get(registry).map(|id| (registry, id)))
    }

    /// True when the hit carries no usable identifier at all.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Pulls every usable identifier out of `hit`.
pub fn extract_identifiers(hit: &RawHit) -> Identifiers {
    let mut identifiers = Identifiers::default();
    for registry in SourceRegistry::ALL {
        identifiers.values[registry.slot()] = hit.identifier(registry).and_then(canonical_id);
    }
    identifiers
}

/// Canonical string form of a raw identifier value.
///
/// Numbers and strings compare by their string form. Zero, blank strings,
/// `null` and non-scalar values are absent.
pub fn canonical_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty() && trimmed != "0").then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                (int != 0).then(|| int.to_string())
            } else if let Some(uint) = n.as_u64() {
                Some(uint.to_string())
            } else {
                // Integral floats read as their integer form so 500.0 matches 500
                n.as_f64()
                    .filter(|f| f.is_finite() && *f != 0.0)
                    .map(|f| {
                        if f.fract() == 0.0 && f.abs() < 1e15 {
                            format!("{}", f as i64)
                        } else {
                            f.to_string()
                        }
                    })
            }
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}
