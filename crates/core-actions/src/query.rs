//! Query-string parameters shared through links.
//!
//! `layout` carries the active layout name and is authoritative when present.
//! `target` selects the instrument (`ALL` by default) and the three `*_v`
//! keys pin snapshot versions (`latest` by default). Unknown pairs are kept
//! and written back in their original order.

use core_tasks::{ALL_TARGETS, DataKind, LATEST_VERSION};
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub layout: Option<String>,
    pub target: String,
    pub pricing_version: String,
    pub event_version: String,
    pub guideline_version: String,
    extra: Vec<(String, String)>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            layout: None,
            target: ALL_TARGETS.to_string(),
            pricing_version: LATEST_VERSION.to_string(),
            event_version: LATEST_VERSION.to_string(),
            guideline_version: LATEST_VERSION.to_string(),
            extra: Vec::new(),
        }
    }
}

impl QueryParams {
    /// Parse `?layout=grid-4&target=AAPL` (leading `?` optional). Empty values
    /// count as absent.
    pub fn parse(input: &str) -> Self {
        let input = input.strip_prefix('?').unwrap_or(input);
        let mut out = Self::default();
        for (key, value) in form_urlencoded::parse(input.as_bytes()) {
            let value = value.into_owned();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "layout" => out.layout = Some(value),
                "target" => out.target = value,
                "pricing_v" => out.pricing_version = value,
                "event_v" => out.event_version = value,
                "guideline_v" => out.guideline_version = value,
                other => out.extra.push((other.to_string(), value)),
            }
        }
        out
    }

    /// Serialize without defaults, so an untouched dashboard yields an empty
    /// string.
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        if let Some(layout) = &self.layout {
            ser.append_pair("layout", layout);
        }
        if self.target != ALL_TARGETS {
            ser.append_pair("target", &self.target);
        }
        for (key, value) in [
            ("pricing_v", &self.pricing_version),
            ("event_v", &self.event_version),
            ("guideline_v", &self.guideline_version),
        ] {
            if value != LATEST_VERSION {
                ser.append_pair(key, value);
            }
        }
        for (key, value) in &self.extra {
            ser.append_pair(key, value);
        }
        ser.finish()
    }

    /// Versions pinned away from `latest`, as `family@version` pairs joined by
    /// spaces. `None` when every family follows `latest`.
    pub fn pinned_versions(&self) -> Option<String> {
        let pins: Vec<String> = [DataKind::Prices, DataKind::CalendarEvents, DataKind::Guidelines]
            .into_iter()
            .filter_map(|data| {
                let version = self.version_for(data);
                (version != LATEST_VERSION).then(|| format!("{}@{version}", data.as_str()))
            })
            .collect();
        (!pins.is_empty()).then(|| pins.join(" "))
    }

    /// Snapshot version pinned for a data family.
    pub fn version_for(&self, data: DataKind) -> &str {
        match data {
            DataKind::Prices => &self.pricing_version,
            DataKind::CalendarEvents => &self.event_version,
            DataKind::Guidelines => &self.guideline_version,
        }
    }
}
