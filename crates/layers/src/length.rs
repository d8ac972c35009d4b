//! Trail length as found in feature properties.
//!
//! Features carry their length in one of three encodings. Locally a single
//! normalization picks the most specific one; the engine-side expression
//! folds all three with `max` because the expression language cannot test
//! for property existence without coercing missing values to zero.

use serde_json::{Map, Value};

use crate::expression::Expr;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LengthEncoding {
    Kilometers,
    Meters,
    /// A bare `length` field of unknown unit, read as kilometers.
    Ambiguous,
}

impl LengthEncoding {
    /// Normalization priority, most specific first.
    pub const PRIORITY: [LengthEncoding; 3] = [
        LengthEncoding::Kilometers,
        LengthEncoding::Meters,
        LengthEncoding::Ambiguous,
    ];

    /// Property keys read for this encoding, in lookup order.
    pub fn property_keys(self) -> &'static [&'static str] {
        match self {
            LengthEncoding::Kilometers => &["length_km", "lengthKm"],
            LengthEncoding::Meters => &["length_m", "lengthMeters"],
            LengthEncoding::Ambiguous => &["length"],
        }
    }

    /// Engine key used inside filter and color expressions.
    pub fn tile_key(self) -> &'static str {
        self.property_keys()[0]
    }

    fn km_expression(self) -> Expr {
        let raw = Expr::to_number(Expr::get(self.tile_key()));
        match self {
            LengthEncoding::Meters => Expr::div(raw, Expr::lit(1000)),
            _ => raw,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LengthMeasurement {
    Kilometers(f64),
    Meters(f64),
    Ambiguous(f64),
}

impl LengthMeasurement {
    pub fn new(encoding: LengthEncoding, value: f64) -> Self {
        match encoding {
            LengthEncoding::Kilometers => LengthMeasurement::Kilometers(value),
            LengthEncoding::Meters => LengthMeasurement::Meters(value),
            LengthEncoding::Ambiguous => LengthMeasurement::Ambiguous(value),
        }
    }

    pub fn encoding(&self) -> LengthEncoding {
        match self {
            LengthMeasurement::Kilometers(_) => LengthEncoding::Kilometers,
            LengthMeasurement::Meters(_) => LengthEncoding::Meters,
            LengthMeasurement::Ambiguous(_) => LengthEncoding::Ambiguous,
        }
    }

    pub fn km(&self) -> f64 {
        match *self {
            LengthMeasurement::Kilometers(v) | LengthMeasurement::Ambiguous(v) => v,
            LengthMeasurement::Meters(v) => v / 1000.0,
        }
    }

    /// Picks the highest-priority encoding present with a finite value.
    pub fn from_properties(props: &Map<String, Value>) -> Option<Self> {
        LengthEncoding::PRIORITY.into_iter().find_map(|enc| {
            enc.property_keys()
                .iter()
                .find_map(|k| props.get(*k).and_then(finite_number))
                .map(|v| LengthMeasurement::new(enc, v))
        })
    }
}

/// Length in kilometers derived from feature properties, if any encoding is
/// present.
pub fn length_km(props: &Map<String, Value>) -> Option<f64> {
    LengthMeasurement::from_properties(props).map(|m| m.km())
}

/// Engine-side derived length:
/// `max(max(km, m / 1000), length)` with missing values read as zero.
pub fn length_km_expression() -> Expr {
    let [km, m, ambiguous] = LengthEncoding::PRIORITY.map(LengthEncoding::km_expression);
    Expr::max(Expr::max(km, m), ambiguous)
}

/// Finite number from a JSON number or a numeric string.
pub fn finite_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
