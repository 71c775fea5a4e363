//! Form-level input validation.
//!
//! Provides O(1) synonym maps so operators can type `i`, `ais`, `corr`
//! and the like, plus the field checks a TACREP form applies before a
//! record is created or edited. Two-tier resolution: exact match or
//! synonym lookup, then an error with a suggestion.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::model::{ChangeKind, ContactFields, EchoFields, Position, TacrepFields, TacrepType};

// ── Synonym maps ─────────────────────────────────────────────

pub static TYPE_SYNONYMS: LazyLock<HashMap<&str, TacrepType>> = LazyLock::new(|| {
    [
        ("i", TacrepType::India),
        ("india", TacrepType::India),
        ("e", TacrepType::Echo),
        ("echo", TacrepType::Echo),
        ("ais", TacrepType::Ais),
        ("a", TacrepType::Alpha),
        ("alpha", TacrepType::Alpha),
        ("n", TacrepType::November),
        ("november", TacrepType::November),
        ("g", TacrepType::Golf),
        ("golf", TacrepType::Golf),
        ("o", TacrepType::Other),
        ("other", TacrepType::Other),
    ]
    .into_iter()
    .collect()
});

pub static CHANGE_SYNONYMS: LazyLock<HashMap<&str, ChangeKind>> = LazyLock::new(|| {
    [
        ("edit", ChangeKind::Edit),
        ("e", ChangeKind::Edit),
        ("correct", ChangeKind::Correct),
        ("correction", ChangeKind::Correct),
        ("corr", ChangeKind::Correct),
        ("c", ChangeKind::Correct),
        ("update", ChangeKind::Update),
        ("upd", ChangeKind::Update),
        ("u", ChangeKind::Update),
    ]
    .into_iter()
    .collect()
});

// ── Normalization ────────────────────────────────────────────

/// Normalize a TACREP type name or synonym.
///
/// # Errors
///
/// Returns `InvalidType`, naming the closest known type when one is near.
pub fn normalize_type(input: &str) -> Result<TacrepType> {
    let lower = input.trim().to_lowercase();
    if let Some(&kind) = TYPE_SYNONYMS.get(lower.as_str()) {
        return Ok(kind);
    }

    let message = match find_closest_match(&lower, &TYPE_SYNONYMS) {
        Some(kind) => format!("Unknown TACREP type '{input}'. Did you mean {kind}?"),
        None => format!("Unknown TACREP type '{input}'"),
    };
    Err(Error::InvalidType(message))
}

/// Normalize a change kind (`edit`, `correct`, `update` and synonyms).
///
/// # Errors
///
/// Returns `InvalidArgument` for anything else.
pub fn normalize_change_kind(input: &str) -> Result<ChangeKind> {
    let lower = input.trim().to_lowercase();
    CHANGE_SYNONYMS.get(lower.as_str()).copied().ok_or_else(|| {
        Error::InvalidArgument(format!(
            "Unknown change kind '{input}'. Use: edit, correct, update"
        ))
    })
}

fn find_closest_match<T: Copy>(input: &str, synonyms: &HashMap<&str, T>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;

    for (&name, &value) in synonyms {
        // Single letters are too close to everything to be useful hints.
        if name.len() < 3 {
            continue;
        }
        let dist = levenshtein_distance(input, name);
        if dist <= 2 && best.as_ref().is_none_or(|&(_, d)| dist < d) {
            best = Some((value, dist));
        }
    }

    best.map(|(v, _)| v)
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Find existing codes similar to the searched code.
///
/// Comparison is case-insensitive. Returns up to `max` suggestions with
/// edit distance ≤ 2, sorted by distance then alphabetically.
#[must_use]
pub fn find_similar_codes<'a>(
    searched: &str,
    existing: impl IntoIterator<Item = &'a str>,
    max: usize,
) -> Vec<String> {
    let needle = searched.trim().to_uppercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<(usize, &str)> = existing
        .into_iter()
        .map(|code| (levenshtein_distance(&needle, &code.to_uppercase()), code))
        .filter(|(dist, _)| *dist <= 2)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    candidates
        .into_iter()
        .take(max)
        .map(|(_, code)| code.to_string())
        .collect()
}

// ── Field checks ─────────────────────────────────────────────

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a 4-digit HHMM Zulu time.
///
/// # Errors
///
/// Returns `InvalidField` for anything but `0000`..=`2359`.
pub fn validate_time(input: &str) -> Result<()> {
    let t = input.trim();
    if t.len() != 4 || !t.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("time", format!("'{input}' is not HHMM")));
    }
    let (hh, mm) = t.split_at(2);
    let (hh, mm) = (hh.parse::<u8>().unwrap_or(99), mm.parse::<u8>().unwrap_or(99));
    if hh > 23 || mm > 59 {
        return Err(invalid("time", format!("'{input}' is out of range")));
    }
    Ok(())
}

/// Validate a course in whole degrees, 0-359.
///
/// # Errors
///
/// Returns `InvalidField` otherwise.
pub fn validate_course(input: &str) -> Result<()> {
    match input.trim().parse::<u16>() {
        Ok(c) if c <= 359 => Ok(()),
        _ => Err(invalid("course", format!("'{input}' is not 0-359"))),
    }
}

/// Validate a speed in knots.
///
/// # Errors
///
/// Returns `InvalidField` for a non-numeric or negative value.
pub fn validate_speed(input: &str) -> Result<()> {
    match input.trim().parse::<f64>() {
        Ok(s) if s.is_finite() && s >= 0.0 => Ok(()),
        _ => Err(invalid("speed", format!("'{input}' is not a number"))),
    }
}

/// Parse one `DD:MM:SS(.ss)H` coordinate into (deg, min, sec, decimal, hem).
fn parse_coordinate(
    field: &str,
    input: &str,
    max_deg: u16,
    hemispheres: [char; 2],
) -> Result<(String, String, String, Option<String>, String)> {
    let s = input.trim().to_uppercase();
    let hem = s
        .chars()
        .last()
        .filter(|c| hemispheres.contains(c))
        .ok_or_else(|| {
            invalid(
                field,
                format!(
                    "'{input}' must end with {} or {}",
                    hemispheres[0], hemispheres[1]
                ),
            )
        })?;
    let body = &s[..s.len() - 1];

    let parts: Vec<&str> = body.split(':').collect();
    let [deg, min, sec] = parts.as_slice() else {
        return Err(invalid(field, format!("'{input}' is not DD:MM:SS.ssH")));
    };
    let (sec, dec) = match sec.split_once('.') {
        Some((s, d)) => (s, Some(d)),
        None => (*sec, None),
    };

    let number = |part: &str| -> Result<u16> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(field, format!("'{input}' is not DD:MM:SS.ssH")));
        }
        part.parse()
            .map_err(|_| invalid(field, format!("'{input}' is out of range")))
    };
    let (d, m, sc) = (number(deg)?, number(min)?, number(sec)?);
    if let Some(dec) = dec {
        number(dec)?;
    }

    if d > max_deg {
        return Err(invalid(field, format!("degrees must be 0-{max_deg}")));
    }
    if m >= 60 || sc >= 60 {
        return Err(invalid(field, "minutes and seconds must be under 60"));
    }
    if d == max_deg && (m > 0 || sc > 0 || dec.is_some_and(|x| x.bytes().any(|b| b != b'0'))) {
        return Err(invalid(field, format!("'{input}' is beyond {max_deg} degrees")));
    }

    Ok((
        deg.to_string(),
        min.to_string(),
        sec.to_string(),
        dec.map(ToString::to_string),
        hem.to_string(),
    ))
}

/// Parse a `lat lon` pair such as `19:32:25.15N 128:23:17.68E`.
///
/// # Errors
///
/// Returns `InvalidField` naming the offending coordinate.
pub fn parse_position(input: &str) -> Result<Position> {
    let mut parts = input.split_whitespace();
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid(
            "position",
            format!("'{input}' must be '<lat> <lon>'"),
        ));
    };

    let (lat_deg, lat_min, lat_sec, lat_dec_sec, lat_hem) =
        parse_coordinate("lat", lat, 90, ['N', 'S'])?;
    let (lon_deg, lon_min, lon_sec, lon_dec_sec, lon_hem) =
        parse_coordinate("lon", lon, 180, ['E', 'W'])?;

    Ok(Position {
        lat_deg: Some(lat_deg),
        lat_min: Some(lat_min),
        lat_sec: Some(lat_sec),
        lat_dec_sec,
        lat_hem: Some(lat_hem),
        lon_deg: Some(lon_deg),
        lon_min: Some(lon_min),
        lon_sec: Some(lon_sec),
        lon_dec_sec,
        lon_hem: Some(lon_hem),
    })
}

// ── Form input ───────────────────────────────────────────────

/// Raw form values. `None` leaves a field as it is; an empty string
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldInput {
    pub time: Option<String>,
    pub position: Option<String>,
    pub course: Option<String>,
    pub speed: Option<String>,
    pub track_number: Option<String>,
    pub min_vessel_len: Option<String>,
    pub info: Option<String>,
    pub vessel_type: Option<String>,
    pub sensor: Option<String>,
    pub system_or_platform: Option<String>,
    pub emitter_name: Option<String>,
    pub activity_or_function: Option<String>,
    pub frequency: Option<String>,
}

fn merge(slot: &mut Option<String>, value: Option<&String>) {
    if let Some(v) = value {
        let v = v.trim();
        *slot = (!v.is_empty()).then(|| v.to_string());
    }
}

impl FieldInput {
    /// Whether no field was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check each given value and merge it into `base`.
    ///
    /// Echo-only values on a contact type (and contact-only values on
    /// Echo) are rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidField` for the first bad value.
    pub fn apply(&self, mut base: TacrepFields) -> Result<TacrepFields> {
        if let Some(t) = self.time.as_deref().filter(|t| !t.trim().is_empty()) {
            validate_time(t)?;
        }
        if let Some(c) = self.course.as_deref().filter(|c| !c.trim().is_empty()) {
            validate_course(c)?;
        }
        if let Some(s) = self.speed.as_deref().filter(|s| !s.trim().is_empty()) {
            validate_speed(s)?;
        }
        let position = match self.position.as_deref().map(str::trim) {
            Some("") => Some(Position::default()),
            Some(p) => Some(parse_position(p)?),
            None => None,
        };

        match &mut base {
            TacrepFields::Echo(e) => {
                if self.vessel_type.is_some() || self.sensor.is_some() {
                    return Err(invalid(
                        "field",
                        "vessel type and sensor do not apply to Echo",
                    ));
                }
                self.merge_echo(e, position);
            }
            TacrepFields::India(c)
            | TacrepFields::Ais(c)
            | TacrepFields::Alpha(c)
            | TacrepFields::November(c)
            | TacrepFields::Golf(c)
            | TacrepFields::Other(c) => {
                if self.system_or_platform.is_some()
                    || self.emitter_name.is_some()
                    || self.activity_or_function.is_some()
                    || self.frequency.is_some()
                {
                    return Err(invalid("field", "emitter fields only apply to Echo"));
                }
                self.merge_contact(c, position);
            }
        }
        Ok(base)
    }

    fn merge_contact(&self, c: &mut ContactFields, position: Option<Position>) {
        merge(&mut c.time_hhmm, self.time.as_ref());
        merge(&mut c.vessel_type, self.vessel_type.as_ref());
        merge(&mut c.sensor, self.sensor.as_ref());
        merge(&mut c.course, self.course.as_ref());
        merge(&mut c.speed, self.speed.as_ref());
        merge(&mut c.track_number, self.track_number.as_ref());
        merge(&mut c.min_vessel_len, self.min_vessel_len.as_ref());
        merge(&mut c.info, self.info.as_ref());
        if let Some(p) = position {
            c.position = p;
        }
    }

    fn merge_echo(&self, e: &mut EchoFields, position: Option<Position>) {
        merge(&mut e.time_hhmm, self.time.as_ref());
        merge(&mut e.system_or_platform, self.system_or_platform.as_ref());
        merge(&mut e.emitter_name, self.emitter_name.as_ref());
        merge(&mut e.activity_or_function, self.activity_or_function.as_ref());
        merge(&mut e.frequency, self.frequency.as_ref());
        merge(&mut e.course, self.course.as_ref());
        merge(&mut e.speed, self.speed.as_ref());
        merge(&mut e.track_number, self.track_number.as_ref());
        merge(&mut e.min_vessel_len, self.min_vessel_len.as_ref());
        merge(&mut e.info, self.info.as_ref());
        if let Some(p) = position {
            e.position = p;
        }
    }
}

/// Check that a complete record carries the fields its type requires.
///
/// India reports need time, vessel type, sensor, position, course, and
/// speed. Other types have no required fields.
///
/// # Errors
///
/// Returns `InvalidField` naming the first missing field.
pub fn validate_required(fields: &TacrepFields) -> Result<()> {
    let TacrepFields::India(c) = fields else {
        return Ok(());
    };
    let required = [
        ("time", c.time_hhmm.is_some()),
        ("vessel type", c.vessel_type.is_some()),
        ("sensor", c.sensor.is_some()),
        ("position", c.position.is_set()),
        ("course", c.course.is_some()),
        ("speed", c.speed.is_some()),
    ];
    match required.iter().find(|(_, present)| !present) {
        Some((field, _)) => Err(invalid(field, "is required for India reports")),
        None => Ok(()),
    }
}
