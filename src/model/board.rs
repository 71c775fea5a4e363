//! Board document model.
//!
//! `BoardState` is the single persisted JSON object shared by every editor
//! of a mission. Keys are stable and camelCase; keys this version does not
//! know about are carried through untouched so that older or newer clients
//! never lose each other's data.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::correlation::CorrelationGroup;
use super::history::HistoryEntry;
use super::tacrep::{Record, RecordStatus, TacrepType};

/// Active records, one column per TACREP type.
///
/// The six standard columns are always present in the document, even when
/// empty. Records inside a column that lack a `type` tag take the column's
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Columns(BTreeMap<TacrepType, Vec<Record>>);

impl Default for Columns {
    fn default() -> Self {
        Self(
            TacrepType::STANDARD
                .into_iter()
                .map(|t| (t, Vec::new()))
                .collect(),
        )
    }
}

impl Columns {
    /// Records in a column.
    #[must_use]
    pub fn get(&self, kind: TacrepType) -> &[Record] {
        self.0.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Mutable column, created on first use.
    pub fn get_mut(&mut self, kind: TacrepType) -> &mut Vec<Record> {
        self.0.entry(kind).or_default()
    }

    /// Iterate all active records in column order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.0.values().flatten()
    }

    /// Iterate columns in order.
    pub fn columns(&self) -> impl Iterator<Item = (TacrepType, &[Record])> {
        self.0.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'de> Deserialize<'de> for Columns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Vec<serde_json::Value>>::deserialize(deserializer)?;
        let mut columns = Self::default();

        for (name, items) in raw {
            let Ok(kind) = name.parse::<TacrepType>() else {
                warn!(column = %name, "Skipping unknown board column");
                continue;
            };
            let target = columns.get_mut(kind);
            for item in items {
                let record = record_from_value(item, kind).map_err(serde::de::Error::custom)?;
                target.push(record);
            }
        }

        Ok(columns)
    }
}

/// Parse a record, supplying `type` from context when the object lacks it.
fn record_from_value(
    mut value: serde_json::Value,
    fallback: TacrepType,
) -> serde_json::Result<Record> {
    if let Some(obj) = value.as_object_mut() {
        if !obj.contains_key("type") {
            obj.insert("type".into(), fallback.as_str().into());
        }
    }
    serde_json::from_value(value)
}

/// Deleted records carry no column; their type comes from `originColumn`,
/// else from the original code.
fn deserialize_deleted<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Record>, D::Error> {
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|item| {
            let origin = item
                .get("originColumn")
                .and_then(serde_json::Value::as_str)
                .and_then(|s| s.parse::<TacrepType>().ok());
            let code = item
                .get("originalCode")
                .or_else(|| item.get("code"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            let kind = origin.unwrap_or_else(|| TacrepType::from_code(code));
            let mut record = record_from_value(item, kind).map_err(serde::de::Error::custom)?;
            record.status = RecordStatus::Deleted;
            Ok(record)
        })
        .collect()
}

/// One crew shift of the mission details tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shift {
    pub turnover: String,
    pub mc: String,
    pub tc: String,
    pub uac: String,
    pub sc: String,
    pub mpo1: String,
    pub mpo2: String,
}

/// Crew shift details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewDetails {
    #[serde(default)]
    pub shifts: Vec<Shift>,
}

impl Default for CrewDetails {
    fn default() -> Self {
        Self {
            shifts: vec![Shift::default(); 4],
        }
    }
}

/// An equipment fault logged during the mission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fault {
    #[serde(rename = "timeHHMM")]
    pub time_hhmm: String,
    pub fault_code: String,
    pub comments: String,
    pub created_by: String,
    pub created_at: i64,
}

/// Mission timeline event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimelineEvent {
    Offdeck,
    Onsta,
    Offsta,
    Ondeck,
}

impl TimelineEvent {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Offdeck => "OFFDECK",
            Self::Onsta => "ONSTA",
            Self::Offsta => "OFFSTA",
            Self::Ondeck => "ONDECK",
        }
    }
}

impl std::str::FromStr for TimelineEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace(['-', '_', ' '], "").as_str() {
            "OFFDECK" => Ok(Self::Offdeck),
            "ONSTA" => Ok(Self::Onsta),
            "OFFSTA" => Ok(Self::Offsta),
            "ONDECK" => Ok(Self::Ondeck),
            _ => Err(format!("Unknown timeline event: {s}")),
        }
    }
}

/// A mission timeline entry. Position/airfield details written by other
/// clients are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    #[serde(rename = "timeHHMM", default)]
    pub time_hhmm: String,
    #[serde(rename = "type")]
    pub event: TimelineEvent,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub last_modified: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The board document root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    #[serde(default)]
    pub crew_roster: Vec<String>,

    /// Mission-wide floor for code numbers; record creation is disabled
    /// until it is set.
    #[serde(default)]
    pub block_start_num: Option<u64>,

    /// Per-type numbering floors overriding the block start.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_start: BTreeMap<TacrepType, u64>,

    #[serde(default)]
    pub mission_number: String,

    #[serde(default)]
    pub callsign: String,

    #[serde(default)]
    pub columns: Columns,

    #[serde(default)]
    pub correlations: Vec<CorrelationGroup>,

    #[serde(default, deserialize_with = "deserialize_deleted")]
    pub deleted: Vec<Record>,

    #[serde(default)]
    pub change_history: Vec<HistoryEntry>,

    #[serde(default)]
    pub faults: Vec<Fault>,

    #[serde(default)]
    pub mission_timeline: Vec<TimelineEntry>,

    #[serde(default)]
    pub crew_details: CrewDetails,

    /// Keys written by other clients that this version does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            crew_roster: Vec::new(),
            block_start_num: None,
            column_start: BTreeMap::new(),
            mission_number: String::new(),
            callsign: String::new(),
            columns: Columns::default(),
            correlations: Vec::new(),
            deleted: Vec::new(),
            change_history: Vec::new(),
            faults: Vec::new(),
            mission_timeline: Vec::new(),
            crew_details: CrewDetails::default(),
            extra: serde_json::Map::new(),
        }
    }
}

impl BoardState {
    /// Skeleton document for a new mission.
    #[must_use]
    pub fn initial(actor: &str, block_start: Option<u64>, mission_number: &str, callsign: &str) -> Self {
        Self {
            crew_roster: if actor.is_empty() {
                Vec::new()
            } else {
                vec![actor.to_string()]
            },
            block_start_num: block_start,
            mission_number: mission_number.to_string(),
            callsign: callsign.to_string(),
            ..Self::default()
        }
    }

    /// Parse a document. Empty or whitespace-only text yields an empty board.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid board document.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
