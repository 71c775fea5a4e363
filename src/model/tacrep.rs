//! TACREP record model.
//!
//! A record is a common envelope (code, status, timestamps, reported flag)
//! around a closed set of per-type field structs. The `type` tag of the
//! field enum is flattened into the envelope, so a record serializes as a
//! single flat JSON object:
//!
//! ```json
//! {"code":"I100","type":"India","timeHHMM":"0930","course":"270","status":"active",...}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel suffix given to the code of a deleted record.
pub const SENTINEL_SUFFIX: &str = "XXX";

/// TACREP types, one board column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TacrepType {
    India,
    Echo,
    #[serde(rename = "AIS")]
    Ais,
    Alpha,
    November,
    Golf,
    Other,
}

impl TacrepType {
    /// All types in board column order.
    pub const ALL: [Self; 7] = [
        Self::India,
        Self::Echo,
        Self::Ais,
        Self::Alpha,
        Self::November,
        Self::Golf,
        Self::Other,
    ];

    /// Types that always have a column in the persisted document.
    pub const STANDARD: [Self; 6] = [
        Self::India,
        Self::Echo,
        Self::Ais,
        Self::Alpha,
        Self::November,
        Self::Golf,
    ];

    /// Column name as stored in the document.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::India => "India",
            Self::Echo => "Echo",
            Self::Ais => "AIS",
            Self::Alpha => "Alpha",
            Self::November => "November",
            Self::Golf => "Golf",
            Self::Other => "Other",
        }
    }

    /// Code prefix for this type.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::India => "I",
            Self::Echo => "E",
            Self::Ais => "AIS",
            Self::Alpha => "A",
            Self::November => "N",
            Self::Golf => "G",
            Self::Other => "O",
        }
    }

    /// Infer the type from a code string.
    ///
    /// The `AIS` literal is matched first, then the first character.
    /// Unknown prefixes map to `Other`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        if code.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("AIS")) {
            return Self::Ais;
        }
        match code.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('I') => Self::India,
            Some('E') => Self::Echo,
            Some('A') => Self::Alpha,
            Some('N') => Self::November,
            Some('G') => Self::Golf,
            _ => Self::Other,
        }
    }

    /// Sentinel code used for deleted records of this type (e.g. `IXXX`).
    #[must_use]
    pub fn sentinel(&self) -> String {
        format!("{}{SENTINEL_SUFFIX}", self.prefix())
    }
}

impl fmt::Display for TacrepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TacrepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown TACREP type: {s}"))
    }
}

/// Lifecycle status of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Deleted,
}

/// Degrees/minutes/seconds position, stored as the digit strings the
/// operator entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    #[serde(rename = "latDeg", skip_serializing_if = "Option::is_none")]
    pub lat_deg: Option<String>,
    #[serde(rename = "latMin", skip_serializing_if = "Option::is_none")]
    pub lat_min: Option<String>,
    #[serde(rename = "latSec", skip_serializing_if = "Option::is_none")]
    pub lat_sec: Option<String>,
    #[serde(rename = "latDecSecStr", skip_serializing_if = "Option::is_none")]
    pub lat_dec_sec: Option<String>,
    #[serde(rename = "latHem", skip_serializing_if = "Option::is_none")]
    pub lat_hem: Option<String>,
    #[serde(rename = "lonDeg", skip_serializing_if = "Option::is_none")]
    pub lon_deg: Option<String>,
    #[serde(rename = "lonMin", skip_serializing_if = "Option::is_none")]
    pub lon_min: Option<String>,
    #[serde(rename = "lonSec", skip_serializing_if = "Option::is_none")]
    pub lon_sec: Option<String>,
    #[serde(rename = "lonDecSecStr", skip_serializing_if = "Option::is_none")]
    pub lon_dec_sec: Option<String>,
    #[serde(rename = "lonHem", skip_serializing_if = "Option::is_none")]
    pub lon_hem: Option<String>,
}

impl Position {
    /// True when a latitude degree and longitude degree are both present.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.lat_deg.is_some() && self.lon_deg.is_some()
    }
}

/// Fields for surface/subsurface contact reports (India, AIS, Alpha,
/// November, Golf, Other).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactFields {
    #[serde(rename = "timeHHMM", skip_serializing_if = "Option::is_none")]
    pub time_hhmm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vessel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<String>,
    #[serde(flatten)]
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_vessel_len: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// Fields for electronic emission reports (Echo).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EchoFields {
    #[serde(rename = "timeHHMM", skip_serializing_if = "Option::is_none")]
    pub time_hhmm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_or_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emitter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_or_function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(flatten)]
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_vessel_len: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// Type-specific record fields, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TacrepFields {
    India(ContactFields),
    Echo(EchoFields),
    #[serde(rename = "AIS")]
    Ais(ContactFields),
    Alpha(ContactFields),
    November(ContactFields),
    Golf(ContactFields),
    Other(ContactFields),
}

impl TacrepFields {
    /// Empty fields for the given type.
    #[must_use]
    pub fn empty(kind: TacrepType) -> Self {
        match kind {
            TacrepType::India => Self::India(ContactFields::default()),
            TacrepType::Echo => Self::Echo(EchoFields::default()),
            TacrepType::Ais => Self::Ais(ContactFields::default()),
            TacrepType::Alpha => Self::Alpha(ContactFields::default()),
            TacrepType::November => Self::November(ContactFields::default()),
            TacrepType::Golf => Self::Golf(ContactFields::default()),
            TacrepType::Other => Self::Other(ContactFields::default()),
        }
    }

    /// The TACREP type these fields belong to.
    #[must_use]
    pub const fn kind(&self) -> TacrepType {
        match self {
            Self::India(_) => TacrepType::India,
            Self::Echo(_) => TacrepType::Echo,
            Self::Ais(_) => TacrepType::Ais,
            Self::Alpha(_) => TacrepType::Alpha,
            Self::November(_) => TacrepType::November,
            Self::Golf(_) => TacrepType::Golf,
            Self::Other(_) => TacrepType::Other,
        }
    }

    /// Contact fields, if this is not an Echo report.
    #[must_use]
    pub const fn contact(&self) -> Option<&ContactFields> {
        match self {
            Self::India(c)
            | Self::Ais(c)
            | Self::Alpha(c)
            | Self::November(c)
            | Self::Golf(c)
            | Self::Other(c) => Some(c),
            Self::Echo(_) => None,
        }
    }

    /// Re-tag these fields as another type, carrying over everything
    /// both shapes share.
    #[must_use]
    pub fn retype(self, kind: TacrepType) -> Self {
        if self.kind() == kind {
            return self;
        }
        let contact = match self {
            Self::Echo(e) => ContactFields {
                time_hhmm: e.time_hhmm,
                position: e.position,
                course: e.course,
                speed: e.speed,
                track_number: e.track_number,
                min_vessel_len: e.min_vessel_len,
                info: e.info,
                ..ContactFields::default()
            },
            Self::India(c)
            | Self::Ais(c)
            | Self::Alpha(c)
            | Self::November(c)
            | Self::Golf(c)
            | Self::Other(c) => c,
        };
        match kind {
            TacrepType::Echo => Self::Echo(EchoFields {
                time_hhmm: contact.time_hhmm,
                position: contact.position,
                course: contact.course,
                speed: contact.speed,
                track_number: contact.track_number,
                min_vessel_len: contact.min_vessel_len,
                info: contact.info,
                ..EchoFields::default()
            }),
            TacrepType::India => Self::India(contact),
            TacrepType::Ais => Self::Ais(contact),
            TacrepType::Alpha => Self::Alpha(contact),
            TacrepType::November => Self::November(contact),
            TacrepType::Golf => Self::Golf(contact),
            TacrepType::Other => Self::Other(contact),
        }
    }
}

/// A TACREP record: the common envelope around type-specific fields.
///
/// Deleted records keep their envelope; `code` holds the sentinel, while
/// `original_code` and `origin_column` remember where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub code: String,

    #[serde(flatten)]
    pub fields: TacrepFields,

    #[serde(default)]
    pub status: RecordStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_column: Option<TacrepType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,

    #[serde(default)]
    pub created_by: String,

    /// Creation timestamp (Unix milliseconds)
    #[serde(default)]
    pub created_at: i64,

    /// Last modification timestamp (Unix milliseconds)
    #[serde(default)]
    pub last_modified: i64,

    #[serde(default)]
    pub reported: bool,
}

impl Record {
    /// Create a new active record.
    pub fn new(code: String, fields: TacrepFields, created_by: &str) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            code,
            fields,
            status: RecordStatus::Active,
            original_code: None,
            origin_column: None,
            deleted_at: None,
            created_by: created_by.to_string(),
            created_at: now,
            last_modified: now,
            reported: false,
        }
    }

    /// Set the reported flag.
    #[must_use]
    pub fn with_reported(mut self, reported: bool) -> Self {
        self.reported = reported;
        self
    }

    /// The record's TACREP type.
    #[must_use]
    pub const fn kind(&self) -> TacrepType {
        self.fields.kind()
    }

    /// Whether the record sits in the deleted bucket.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.status == RecordStatus::Deleted
    }

    /// The code the record was known by while active.
    #[must_use]
    pub fn effective_code(&self) -> &str {
        self.original_code.as_deref().unwrap_or(&self.code)
    }
}
