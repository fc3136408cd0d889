//! # Model — Lights, Buildings, and Window Identifiers
//!
//! Two data models are served side by side:
//!
//! - [`Light`]: a claimed window keyed by [`WindowId`]. Re-claiming the same
//!   window overwrites the previous record (last write wins).
//! - [`Building`]: a fixed catalog entry that flips from unlit to lit exactly
//!   once, until a global reset.
//!
//! All timestamps are server-assigned and carry millisecond precision so that
//! the ISO-8601 wire form (`2024-05-01T12:00:00.000Z`) round-trips exactly.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a single skyline window.
///
/// Clients either send a numeric window index (`42`) or a stable string key
/// in the form `building-row-col` (`"b4-3-2"`). The identifier is serialized
/// back in the same shape it was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowId {
    Number(u32),
    Key(String),
}

impl WindowId {
    /// Parse a window id from a URL path segment. Purely numeric segments are
    /// window indexes, anything else is a string key.
    pub fn from_path(segment: &str) -> Self {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = segment.parse::<u32>() {
                return WindowId::Number(n);
            }
        }
        WindowId::Key(segment.to_string())
    }

    /// Text form used as the storage primary key.
    pub fn storage_key(&self) -> String {
        self.to_string()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, WindowId::Number(_))
    }

    /// Rebuild an id from its storage key and shape flag.
    pub fn from_storage(key: String, numeric: bool) -> Self {
        if numeric {
            if let Ok(n) = key.parse::<u32>() {
                return WindowId::Number(n);
            }
        }
        WindowId::Key(key)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowId::Number(n) => write!(f, "{}", n),
            WindowId::Key(k) => f.write_str(k),
        }
    }
}

/// A validated light request that has not been timestamped yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightDraft {
    pub window_id: WindowId,
    pub name: String,
    pub goal: String,
    pub color: String,
}

impl LightDraft {
    pub fn into_light(self, timestamp: DateTime<Utc>) -> Light {
        Light {
            window_id: self.window_id,
            name: self.name,
            goal: self.goal,
            color: self.color,
            timestamp,
        }
    }
}

/// One claimed window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Light {
    pub window_id: WindowId,
    pub name: String,
    pub goal: String,
    pub color: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Visual style of a catalog building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Modern,
    Classic,
    Tower,
    Spire,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Modern => write!(f, "modern"),
            Style::Classic => write!(f, "classic"),
            Style::Tower => write!(f, "tower"),
            Style::Spire => write!(f, "spire"),
        }
    }
}

impl FromStr for Style {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modern" => Ok(Style::Modern),
            "classic" => Ok(Style::Classic),
            "tower" => Ok(Style::Tower),
            "spire" => Ok(Style::Spire),
            other => Err(anyhow::anyhow!("unknown building style '{}'", other)),
        }
    }
}

/// Presentation attributes of a catalog building. Immutable after seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub id: String,
    pub name: String,
    pub height: i32,
    pub width: i32,
    pub style: Style,
    pub z_index: i32,
}

/// A catalog building together with its current illumination state.
///
/// `owner_name`, `goal` and `lit_at` are populated exactly when `is_lit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    pub name: String,
    pub height: i32,
    pub width: i32,
    pub style: Style,
    pub z_index: i32,
    pub is_lit: bool,
    pub owner_name: Option<String>,
    pub goal: Option<String>,
    #[serde(with = "iso_millis::option", default)]
    pub lit_at: Option<DateTime<Utc>>,
}

impl Building {
    pub fn unlit(spec: &BuildingSpec) -> Self {
        Building {
            id: spec.id.clone(),
            name: spec.name.clone(),
            height: spec.height,
            width: spec.width,
            style: spec.style,
            z_index: spec.z_index,
            is_lit: false,
            owner_name: None,
            goal: None,
            lit_at: None,
        }
    }

    /// Transition to lit. Owner, goal and timestamp are set together.
    pub(crate) fn light_up(&mut self, owner_name: &str, goal: &str, at: DateTime<Utc>) {
        self.is_lit = true;
        self.owner_name = Some(owner_name.to_string());
        self.goal = Some(goal.to_string());
        self.lit_at = Some(at);
    }

    pub(crate) fn clear(&mut self) {
        self.is_lit = false;
        self.owner_name = None;
        self.goal = None;
        self.lit_at = None;
    }
}

/// Current UTC time truncated to milliseconds.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Timestamp for the next record: the current time, but never earlier than
/// the most recent record already stored.
pub fn next_timestamp(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = now_millis();
    match last {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}

/// Serde adapter for `DateTime<Utc>` in JavaScript `toISOString()` form.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => s.serialize_str(&super::format(ts)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            raw.map(|r| {
                DateTime::parse_from_rfc3339(&r)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_id_from_path_distinguishes_numbers_and_keys() {
        assert_eq!(WindowId::from_path("42"), WindowId::Number(42));
        assert_eq!(
            WindowId::from_path("b4-3-2"),
            WindowId::Key("b4-3-2".to_string())
        );
        // Overflowing digit strings stay keys rather than wrapping
        assert_eq!(
            WindowId::from_path("99999999999"),
            WindowId::Key("99999999999".to_string())
        );
    }

    #[test]
    fn window_id_serializes_in_submitted_shape() {
        assert_eq!(serde_json::to_string(&WindowId::Number(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&WindowId::Key("b1-0-0".into())).unwrap(),
            "\"b1-0-0\""
        );
    }

    #[test]
    fn window_id_storage_round_trip() {
        for id in [WindowId::Number(5000), WindowId::Key("b6-10-1".into())] {
            let back = WindowId::from_storage(id.storage_key(), id.is_numeric());
            assert_eq!(back, id);
        }
    }

    #[test]
    fn light_serializes_camel_case_with_iso_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let light = LightDraft {
            window_id: WindowId::Number(42),
            name: "Al".into(),
            goal: "Become a doctor one day".into(),
            color: "yellow".into(),
        }
        .into_light(ts);
        let json = serde_json::to_value(&light).unwrap();
        assert_eq!(json["windowId"], 42);
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00.000Z");
        let back: Light = serde_json::from_value(json).unwrap();
        assert_eq!(back, light);
    }

    #[test]
    fn next_timestamp_never_goes_backwards() {
        let future = now_millis() + chrono::Duration::seconds(60);
        assert_eq!(next_timestamp(Some(future)), future);
        let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(next_timestamp(Some(past)) > past);
    }

    #[test]
    fn building_light_up_and_clear_move_fields_together() {
        let spec = BuildingSpec {
            id: "b6".into(),
            name: "Key Tower".into(),
            height: 320,
            width: 58,
            style: Style::Spire,
            z_index: 10,
        };
        let mut b = Building::unlit(&spec);
        b.light_up("Ada", "Ship the analytical engine", now_millis());
        assert!(b.is_lit && b.owner_name.is_some() && b.goal.is_some() && b.lit_at.is_some());
        b.clear();
        assert_eq!(b, Building::unlit(&spec));
    }

    #[test]
    fn style_parses_its_display_form() {
        for style in [Style::Modern, Style::Classic, Style::Tower, Style::Spire] {
            assert_eq!(style.to_string().parse::<Style>().unwrap(), style);
        }
        assert!("gothic".parse::<Style>().is_err());
    }
}
