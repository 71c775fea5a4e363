//! Read-only text projections of records.
//!
//! Nothing here feeds back into board state: these functions only render
//! what the core already holds.

use super::history::ChangeKind;
use super::tacrep::{Position, Record, TacrepFields};

/// Format one axis as `D:MM:SS.ssH`, or `None` when degrees or hemisphere
/// are missing.
fn axis(
    deg: Option<&str>,
    min: Option<&str>,
    sec: Option<&str>,
    dec: Option<&str>,
    hem: Option<&str>,
) -> Option<String> {
    let deg: u32 = deg?.trim().parse().ok()?;
    let hem = hem?.trim().to_uppercase();
    if hem.is_empty() {
        return None;
    }
    let min: u32 = min.map_or(Ok(0), |m| m.trim().parse()).ok()?;
    let sec = format!("{:0>2}", sec.unwrap_or("").trim());
    let seconds = match dec.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!("{sec}.{d:0>2}"),
        None => sec,
    };
    Some(format!("{deg}:{min:02}:{seconds}{hem}"))
}

/// Position as `D:MM:SS.ssH D:MM:SS.ssH`; empty if either axis is incomplete.
#[must_use]
pub fn position_display(p: &Position) -> String {
    let lat = axis(
        p.lat_deg.as_deref(),
        p.lat_min.as_deref(),
        p.lat_sec.as_deref(),
        p.lat_dec_sec.as_deref(),
        p.lat_hem.as_deref(),
    );
    let lon = axis(
        p.lon_deg.as_deref(),
        p.lon_min.as_deref(),
        p.lon_sec.as_deref(),
        p.lon_dec_sec.as_deref(),
        p.lon_hem.as_deref(),
    );
    match (lat, lon) {
        (Some(lat), Some(lon)) => format!("{lat} {lon}"),
        _ => String::new(),
    }
}

/// Labelled, non-empty values of a record in report order.
#[must_use]
pub fn report_fields(record: &Record, callsign: &str) -> Vec<(&'static str, String)> {
    let mut out: Vec<(&'static str, Option<String>)> = vec![("Callsign", Some(callsign.to_string()))];

    match &record.fields {
        TacrepFields::Echo(e) => {
            out.push(("Time (Zulu)", e.time_hhmm.as_ref().map(|t| format!("{t}Z"))));
            out.push(("System or Platform", e.system_or_platform.clone()));
            out.push(("Emitter Name", e.emitter_name.clone()));
            out.push(("Activity or Function", e.activity_or_function.clone()));
            out.push(("Frequency", e.frequency.clone()));
            out.push(("Position", Some(position_display(&e.position))));
            out.push(("Course", e.course.clone()));
            out.push(("Speed", e.speed.clone()));
            out.push(("Track Number", e.track_number.clone()));
            out.push(("Min Vessel Length", e.min_vessel_len.clone()));
            out.push(("Additional Info", e.info.clone()));
        }
        TacrepFields::India(c)
        | TacrepFields::Ais(c)
        | TacrepFields::Alpha(c)
        | TacrepFields::November(c)
        | TacrepFields::Golf(c)
        | TacrepFields::Other(c) => {
            out.push(("Time (Zulu)", c.time_hhmm.as_ref().map(|t| format!("{t}Z"))));
            out.push(("Position", Some(position_display(&c.position))));
            out.push(("Vessel Type", c.vessel_type.clone()));
            out.push(("Sensor", c.sensor.clone()));
            out.push(("Course", c.course.clone()));
            out.push(("Speed", c.speed.clone()));
            out.push(("Track Number", c.track_number.clone()));
            out.push(("Min Vessel Length", c.min_vessel_len.clone()));
            out.push(("Additional Info", c.info.clone()));
        }
    }

    let reported = if record.reported { "REPORTED" } else { "UNREPORTED" };
    out.push(("Reported", Some(reported.to_string())));

    out.into_iter()
        .filter_map(|(label, value)| {
            let value = value?.trim().to_string();
            (!value.is_empty()).then_some((label, value))
        })
        .collect()
}

/// `Label: value` lines for copy/paste.
#[must_use]
pub fn report_text(record: &Record, callsign: &str) -> String {
    report_fields(record, callsign)
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Send preview for a correction or update, built from the post-edit record.
///
/// Plain edits have no preview.
#[must_use]
pub fn preview_text(kind: ChangeKind, record: &Record, callsign: &str) -> Option<String> {
    let header = match kind {
        ChangeKind::Correct => format!("Correction to TACREP {}", record.code),
        ChangeKind::Update => format!("Update to TACREP {}", record.code),
        ChangeKind::Edit => return None,
    };
    let body = report_text(record, callsign);
    Some(if body.is_empty() {
        header
    } else {
        format!("{header}\n{body}")
    })
}
