use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single parameter value.
///
/// Serialized untagged, so a state file holds plain JSON scalars and arrays. Integers and
/// floats are kept apart so that `60` and `60.0` survive a save/load cycle unchanged.
/// Integers outside the `i64` range are rejected on input rather than read as floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Ordered atom indices.
    Sequence(Vec<usize>),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Integer(_) => ValueKind::Integer,
            FieldValue::Float(_) => ValueKind::Float,
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Sequence(_) => ValueKind::Sequence,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sites(&self) -> Option<&[usize]> {
        match self {
            FieldValue::Sequence(sites) => Some(sites),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{:?}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Sequence(sites) => {
                write!(f, "[")?;
                for (i, site) in sites.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", site)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldValueVisitor;

        impl<'de> Visitor<'de> for FieldValueVisitor {
            type Value = FieldValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer, a finite float, a string or a list of atom indices")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
                Ok(FieldValue::Integer(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
                i64::try_from(v)
                    .map(FieldValue::Integer)
                    .map_err(|_| E::custom(format!("integer {} is out of range", v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
                if v.is_finite() {
                    Ok(FieldValue::Float(v))
                } else {
                    Err(E::custom(format!("float {} is not finite", v)))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
                Ok(FieldValue::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<FieldValue, E> {
                Ok(FieldValue::Text(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<FieldValue, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut sites = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(site) = seq.next_element::<usize>()? {
                    sites.push(site);
                }
                Ok(FieldValue::Sequence(sites))
            }
        }

        deserializer.deserialize_any(FieldValueVisitor)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<usize>> for FieldValue {
    fn from(value: Vec<usize>) -> Self {
        FieldValue::Sequence(value)
    }
}

/// The kind of value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Float,
    /// Either an integer or a float.
    Number,
    Text,
    Sequence,
}

impl ValueKind {
    /// Whether `value` may be stored in a field of this kind. Non-finite floats are never
    /// accepted, since JSON cannot represent them.
    pub fn accepts(self, value: &FieldValue) -> bool {
        if let FieldValue::Float(v) = value {
            if !v.is_finite() {
                return false;
            }
        }
        match self {
            ValueKind::Number => {
                matches!(value, FieldValue::Integer(_) | FieldValue::Float(_))
            }
            kind => kind == value.kind(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Number => "number",
            ValueKind::Text => "string",
            ValueKind::Sequence => "sequence of atom indices",
        };
        f.write_str(name)
    }
}
