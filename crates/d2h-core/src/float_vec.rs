//! Serde adapter for `Vec<f64>` that survives non-finite values.
//!
//! JSON has no NaN or infinity, and `serde_json` writes both as `null`, which
//! then fails to read back as `f64`. Efficiency and ratio histograms routinely
//! carry NaN bins, so bundle vectors go through this module instead:
//!
//! ```text
//! NaN  -> "nan"     +inf -> "inf"     -inf -> "-inf"
//! ```
//!
//! On input the tags are accepted case-insensitively and `null` reads as NaN.
//!
//! Use with `#[serde(with = "d2h_core::float_vec")]`.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::Deserialize;

/// One element as it appears in JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Num(f64),
    Tag(String),
}

fn tag(v: f64) -> Option<&'static str> {
    if v.is_nan() {
        Some("nan")
    } else if v == f64::INFINITY {
        Some("inf")
    } else if v == f64::NEG_INFINITY {
        Some("-inf")
    } else {
        None
    }
}

fn parse_tag(s: &str) -> Option<f64> {
    match s.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Write `values`, tagging non-finite entries.
pub fn serialize<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for &v in values {
        match tag(v) {
            Some(t) => seq.serialize_element(t)?,
            None => seq.serialize_element(&v)?,
        }
    }
    seq.end()
}

/// Read a vector written by [`serialize`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<Repr>> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|item| match item {
            None => Ok(f64::NAN),
            Some(Repr::Num(v)) => Ok(v),
            Some(Repr::Tag(s)) => parse_tag(&s).ok_or_else(|| {
                de::Error::custom(format!("expected a number, \"nan\", \"inf\" or \"-inf\", found \"{}\"", s))
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Row {
        #[serde(with = "super")]
        v: Vec<f64>,
    }

    #[test]
    fn non_finite_values_are_tagged() {
        let row = Row { v: vec![0.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"v":[0.5,"nan","inf","-inf"]}"#);

        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back.v[0], 0.5);
        assert!(back.v[1].is_nan());
        assert_eq!(back.v[2], f64::INFINITY);
        assert_eq!(back.v[3], f64::NEG_INFINITY);
    }

    #[test]
    fn null_reads_as_nan_and_unknown_tags_fail() {
        let back: Row = serde_json::from_str(r#"{"v": [1, null, "NaN"]}"#).unwrap();
        assert_eq!(back.v[0], 1.0);
        assert!(back.v[1].is_nan());
        assert!(back.v[2].is_nan());

        let err = serde_json::from_str::<Row>(r#"{"v": ["big"]}"#).unwrap_err();
        assert!(err.to_string().contains("big"));
    }
}
