//! Calendar (iCalendar, RFC 5545) and tabular exports of a schedule

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PlanError, PlanResult};
use crate::types::{CalendarExportRef, Priority, Schedule, ScheduleDay, ScheduleItem};

pub const DEFAULT_PRODUCT_ID: &str = "-//Blue Data//Inspection Planner//EN";

/// Column headers of the tabular export, in order
pub const TABLE_HEADER: [&str; 7] = ["Date", "Inspector", "Outlet", "Area", "Risk", "Priority", "Time Window"];

const MAX_LINE_OCTETS: usize = 75;
const MAX_UID_LEN: usize = 255;
const CRLF: &str = "\r\n";

// ==========================================================================
// Calendar export
// ==========================================================================

/// Result of a calendar export. Rejected entries are left out of `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarExport {
    pub content: String,
    pub event_count: usize,
    pub rejected: Vec<PlanError>,
}

impl CalendarExport {
    /// Report entry for this export once written as `file_name`
    pub fn reference(&self, file_name: impl Into<String>) -> CalendarExportRef {
        CalendarExportRef {
            file_name: file_name.into(),
            event_count: self.event_count,
            rejected_count: self.rejected.len(),
        }
    }
}

/// Serializes schedules to iCalendar text
#[derive(Debug, Clone)]
pub struct CalendarExporter {
    pub product_id: String,
    /// DTSTAMP of every event; supplied by the caller so output is reproducible
    pub dtstamp: DateTime<Utc>,
    /// Offset of the working-day clock from UTC
    pub utc_offset: FixedOffset,
}

impl CalendarExporter {
    pub fn new(dtstamp: DateTime<Utc>, utc_offset: FixedOffset) -> Self {
        Self {
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            dtstamp,
            utc_offset,
        }
    }

    pub fn to_calendar(&self, schedule: &Schedule) -> CalendarExport {
        let mut out = String::new();
        push_line(&mut out, "BEGIN:VCALENDAR");
        push_line(&mut out, "VERSION:2.0");
        push_line(&mut out, &format!("PRODID:{}", self.product_id));
        push_line(&mut out, "CALSCALE:GREGORIAN");
        push_line(&mut out, "METHOD:PUBLISH");
        push_line(
            &mut out,
            &format!(
                "X-WR-CALNAME:{}",
                escape_text(&format!("Inspections {} to {}", schedule.period.start, schedule.period.end))
            ),
        );

        let mut seen = HashSet::new();
        let mut event_count = 0;
        let mut rejected = Vec::new();

        for (day, item) in schedule.items() {
            let uid = item.calendar_uid.as_str();
            let checked = validate_uid(uid).and_then(|()| {
                if seen.contains(uid) {
                    Err(PlanError::ExportFormat {
                        uid: uid.to_string(),
                        reason: "duplicate UID".to_string(),
                    })
                } else {
                    Ok(())
                }
            });

            match checked {
                Ok(()) => {
                    seen.insert(uid.to_string());
                    self.push_event(&mut out, day, item);
                    event_count += 1;
                }
                Err(e) => {
                    warn!("Skipping calendar entry for outlet {} on {}: {}", item.outlet_id, day.date, e);
                    rejected.push(e);
                }
            }
        }

        push_line(&mut out, "END:VCALENDAR");

        info!("Calendar export: {} events, {} rejected", event_count, rejected.len());

        CalendarExport {
            content: out,
            event_count,
            rejected,
        }
    }

    fn push_event(&self, out: &mut String, day: &ScheduleDay, item: &ScheduleItem) {
        let window = item.scheduled_window;
        let description = format!(
            "Risk: {:.1}%\nPriority: {}\nForecast volume: {:.1}\nInspector: {} ({})\nCategory: {}",
            item.risk_percent(),
            item.priority.as_str(),
            item.forecast_volume,
            day.inspector_name,
            day.inspector_id,
            item.category
        );

        push_line(out, "BEGIN:VEVENT");
        push_line(out, &format!("UID:{}", item.calendar_uid));
        push_line(out, &format!("DTSTAMP:{}", format_utc(self.dtstamp)));
        push_line(out, &format!("DTSTART:{}", format_utc(self.to_utc(day.date, window.start))));
        push_line(out, &format!("DTEND:{}", format_utc(self.to_utc(day.date, window.end))));
        push_line(out, &format!("SUMMARY:{}", escape_text(&format!("Inspection: {}", item.name))));
        push_line(out, &format!("DESCRIPTION:{}", escape_text(&description)));
        let location = format!("{} ({:.6}, {:.6})", item.area, item.latitude, item.longitude);
        push_line(out, &format!("LOCATION:{}", escape_text(&location)));
        push_line(out, &format!("GEO:{:.6};{:.6}", item.latitude, item.longitude));
        push_line(out, &format!("CATEGORIES:{}", escape_text(&item.category)));
        push_line(out, &format!("PRIORITY:{}", ical_priority(item.priority)));
        push_line(out, "END:VEVENT");
    }

    fn to_utc(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);
        self.utc_offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local))
    }
}

fn ical_priority(priority: Priority) -> u8 {
    match priority {
        Priority::High => 1,
        Priority::Medium => 5,
        Priority::Low => 9,
    }
}

fn format_utc(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Non-empty, at most 255 chars, no whitespace or control characters
pub fn validate_uid(uid: &str) -> PlanResult<()> {
    let reason = if uid.is_empty() {
        Some("empty UID")
    } else if uid.len() > MAX_UID_LEN {
        Some("UID longer than 255 characters")
    } else if uid.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("UID contains whitespace or control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PlanError::ExportFormat {
            uid: uid.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Escape a TEXT value (RFC 5545 section 3.3.11)
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push(c),
            // TEXT forbids the remaining control characters
            c if c.is_control() => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Append a content line folded at 75 octets, terminated by CRLF
fn push_line(out: &mut String, line: &str) {
    let mut used = 0;
    for c in line.chars() {
        if used + c.len_utf8() > MAX_LINE_OCTETS {
            out.push_str(CRLF);
            out.push(' ');
            used = 1;
        }
        out.push(c);
        used += c.len_utf8();
    }
    out.push_str(CRLF);
}

/// Read back the UIDs of every VEVENT in a calendar file, in order.
///
/// Fails when BEGIN/END blocks are unbalanced or an event has no UID.
pub fn read_event_uids(content: &str) -> PlanResult<Vec<String>> {
    let malformed = |reason: &str| PlanError::ExportFormat {
        uid: String::new(),
        reason: reason.to_string(),
    };

    // Unfold continuation lines first
    let mut lines: Vec<String> = Vec::new();
    for raw in content.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        match raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            Some(rest) if !lines.is_empty() => {
                if let Some(last) = lines.last_mut() {
                    last.push_str(rest);
                }
            }
            _ => lines.push(raw.to_string()),
        }
    }

    let mut uids = Vec::new();
    let mut in_calendar = false;
    let mut current: Option<Option<String>> = None;

    for line in lines.iter().filter(|l| !l.is_empty()) {
        match line.as_str() {
            "BEGIN:VCALENDAR" => in_calendar = true,
            "END:VCALENDAR" => {
                if current.is_some() {
                    return Err(malformed("VEVENT not closed before END:VCALENDAR"));
                }
                in_calendar = false;
            }
            "BEGIN:VEVENT" => {
                if !in_calendar || current.is_some() {
                    return Err(malformed("unexpected BEGIN:VEVENT"));
                }
                current = Some(None);
            }
            "END:VEVENT" => match current.take() {
                Some(Some(uid)) => uids.push(uid),
                Some(None) => return Err(malformed("VEVENT without UID")),
                None => return Err(malformed("END:VEVENT without BEGIN")),
            },
            other => {
                if let (Some(slot), Some(uid)) = (current.as_mut(), other.strip_prefix("UID:")) {
                    *slot = Some(uid.to_string());
                }
            }
        }
    }

    if in_calendar || current.is_some() {
        return Err(malformed("calendar not closed"));
    }
    Ok(uids)
}

// ==========================================================================
// Tabular export
// ==========================================================================

/// One exported row per scheduled item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Inspector")]
    pub inspector: String,
    #[serde(rename = "Outlet")]
    pub outlet: String,
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Risk")]
    pub risk: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Time Window")]
    pub time_window: String,
}

pub fn to_table(schedule: &Schedule) -> Vec<TableRow> {
    schedule
        .items()
        .map(|(day, item)| TableRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            inspector: day.inspector_name.clone(),
            outlet: item.name.clone(),
            area: item.area.clone(),
            risk: format!("{:.1}%", item.risk_percent()),
            priority: item.priority.as_str().to_string(),
            time_window: item.scheduled_window.label(),
        })
        .collect()
}

/// Write rows as CSV. The header row is always written, even with no rows.
pub fn write_csv<W: Write>(rows: &[TableRow], writer: W) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(TABLE_HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn render_csv(rows: &[TableRow]) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
