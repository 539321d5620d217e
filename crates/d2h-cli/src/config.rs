//! Job configuration files and plot style.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use anyhow::{Context, Result};
use d2h_viz_render::config::{VizConfig, resolve_config};
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Read a job config: YAML for `.yaml`/`.yml`, JSON otherwise.
pub(crate) fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let cfg = if ext == "yaml" || ext == "yml" {
        serde_yaml_ng::from_slice(&bytes)
            .with_context(|| format!("parse YAML config {}", path.display()))?
    } else {
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse JSON config {}", path.display()))?
    };
    Ok(cfg)
}

/// Deserialize a map as `(key, value)` pairs in document order.
///
/// Labelled series are drawn and coloured in the order they are written.
pub(crate) fn ordered_map<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of labelled entries")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, T>()? {
                if out.iter().any(|(k, _): &(String, T)| *k == key) {
                    return Err(serde::de::Error::custom(format!("duplicate label '{}'", key)));
                }
                out.push((key, value));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(OrderedVisitor(PhantomData))
}

/// Plot style from `--style` (layered over its theme) and `--formats`.
pub(crate) fn load_style(style: Option<&Path>, formats: &[String]) -> Result<VizConfig> {
    let text = match style {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("read style {}", path.display()))?,
        ),
        None => None,
    };
    let mut config = resolve_config(text.as_deref()).context("resolve plot style")?;
    if !formats.is_empty() {
        config.output.formats = formats.iter().map(|f| f.to_ascii_lowercase()).collect();
    }
    Ok(config)
}
