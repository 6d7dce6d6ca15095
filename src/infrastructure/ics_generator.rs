use crate::domain::models::{parse_hhmm, Assignment, PreviewState, WorkBlock};
use chrono::Utc;

const PRODID: &str = "-//Planfuse//Interactive Preview//EN";
const CALENDAR_NAME: &str = "Study Plan";
const CALENDAR_DESCRIPTION: &str = "Generated study plan";
const DESCRIPTION_PREFIX: &str = "Scheduled study block";

pub fn generate_ics(state: &PreviewState) -> String {
    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        format!("X-WR-CALNAME:{CALENDAR_NAME}"),
        format!("X-WR-CALDESC:{CALENDAR_DESCRIPTION}"),
    ];

    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    for (index, block) in state.work_blocks.iter().enumerate() {
        let assignment = state.find_assignment(&block.assignment_id);
        append_event(&mut lines, block, assignment, index, &dtstamp);
    }

    lines.push("END:VCALENDAR".to_string());

    let mut output = lines.join("\r\n");
    output.push_str("\r\n");
    output
}

fn append_event(
    lines: &mut Vec<String>,
    block: &WorkBlock,
    assignment: Option<&Assignment>,
    index: usize,
    dtstamp: &str,
) {
    lines.push("BEGIN:VEVENT".to_string());

    // Indexed by export position, not block id, so UIDs stay unique even
    // if ids were reused across regenerations.
    lines.push(format!("UID:studyplan-{}-{index}@planfuse", block.date));
    lines.push(format!("DTSTAMP:{dtstamp}"));

    let date_digits: String = block.date.chars().filter(|c| *c != '-').collect();
    let start_digits: String = block.start_time.chars().filter(|c| *c != ':').collect();
    lines.push(format!("DTSTART:{date_digits}T{start_digits}00"));
    lines.push(format!(
        "DTEND:{date_digits}T{}",
        end_time(&block.start_time, block.duration_minutes)
    ));

    let mut summary = block.label.clone();
    if let Some(assignment) = assignment {
        summary.push(' ');
        summary.push_str(&assignment.title);
        if !assignment.course.is_empty() {
            summary.push_str(" [");
            summary.push_str(&assignment.course);
            summary.push(']');
        }
    }
    lines.push(format!("SUMMARY:{}", escape_ics_value(summary.trim())));

    let mut description = DESCRIPTION_PREFIX.to_string();
    if let Some(assignment) = assignment {
        if !assignment.description.is_empty() {
            description.push_str("\n\n");
            description.push_str(&assignment.description);
        }
    }
    lines.push(format!("DESCRIPTION:{}", escape_ics_value(&description)));

    if let Some(assignment) = assignment {
        if !assignment.course.is_empty() {
            lines.push(format!("CATEGORIES:{}", escape_ics_value(&assignment.course)));
        }
    }

    lines.push("END:VEVENT".to_string());
}

// End times wrap past midnight instead of rolling the date.
fn end_time(start_time: &str, duration_minutes: u32) -> String {
    let (hours, minutes) = parse_hhmm(start_time).unwrap_or((0, 0));
    let total = hours * 60 + minutes + duration_minutes;
    format!("{:02}{:02}00", (total / 60) % 24, total % 60)
}

// Backslashes first, so the later passes cannot double-escape.
fn escape_ics_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\r', "\\n")
        .replace('\n', "\\n")
}
