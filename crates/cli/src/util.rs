//! Shared rendering helpers for CLI output

use form::{FormSnapshot, NameStatus, Record};
use owo_colors::OwoColorize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Format timestamp as relative time ("2 minutes ago")
pub fn format_relative_time(ts_ms: u64) -> String {
    let datetime = UNIX_EPOCH + Duration::from_millis(ts_ms);

    if let Ok(elapsed) = SystemTime::now().duration_since(datetime) {
        let seconds = elapsed.as_secs();

        if seconds < 60 {
            format!("{} seconds ago", seconds)
        } else if seconds < 3600 {
            format!("{} minutes ago", seconds / 60)
        } else if seconds < 86400 {
            format!("{} hours ago", seconds / 3600)
        } else {
            format!("{} days ago", seconds / 86400)
        }
    } else {
        "in the future".to_string()
    }
}

/// Short label for a name status
pub fn status_label(status: NameStatus) -> String {
    match status {
        NameStatus::Unchecked => "-".dimmed().to_string(),
        NameStatus::Checking => "Checking name...".dimmed().to_string(),
        NameStatus::Available => "available ✓".green().to_string(),
        NameStatus::Taken => "This name has already been taken".red().to_string(),
        NameStatus::Unavailable => "could not check (service unavailable)".yellow().to_string(),
    }
}

/// Render the form fields
pub fn render_form(snapshot: &FormSnapshot) -> String {
    let location = match &snapshot.selected_location {
        Some(loc) => loc.cyan().to_string(),
        None => "Select a location".dimmed().to_string(),
    };
    let add = if snapshot.can_add() {
        "enabled".green().to_string()
    } else {
        "disabled".dimmed().to_string()
    };

    let mut out = String::new();
    out.push_str(&format!("Name:      {}\n", snapshot.name));
    out.push_str(&format!("           {}\n", status_label(snapshot.name_status)));
    out.push_str(&format!("Location:  {}\n", location));
    out.push_str(&format!("Add:       {}\n", add));
    out
}

/// Render the records table
pub fn render_table(records: &[Record]) -> String {
    if records.is_empty() {
        return format!("{}\n", "No records yet".dimmed());
    }

    let name_width = records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    let location_width = records
        .iter()
        .map(|r| r.location.chars().count())
        .max()
        .unwrap_or(0)
        .max("LOCATION".len());

    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!(
            "{:<nw$}  {:<lw$}  ADDED",
            "NAME",
            "LOCATION",
            nw = name_width,
            lw = location_width
        )
        .bold()
    ));
    for record in records {
        out.push_str(&format!(
            "{:<nw$}  {:<lw$}  {}\n",
            record.name,
            record.location,
            format_relative_time(record.added_at_ms).dimmed(),
            nw = name_width,
            lw = location_width
        ));
    }
    out
}

pub fn record_count_footer(count: usize) -> String {
    let noun = if count == 1 { "record" } else { "records" };
    format!("{}\n", format!("{} {}", count, noun).dimmed())
}

/// Render the location list, marking the selected one
pub fn render_locations(locations: &[String], selected: Option<&str>) -> String {
    let mut out = String::new();
    for location in locations {
        if Some(location.as_str()) == selected {
            out.push_str(&format!("* {}\n", location.cyan()));
        } else {
            out.push_str(&format!("  {}\n", location));
        }
    }
    out
}
