use std::collections::BTreeMap;

const DATE_PROPERTIES: [&str; 3] = ["dtstart", "dtend", "dtstamp"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEvent {
    properties: BTreeMap<String, String>,
}

impl ParsedEvent {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn property_or_default(&self, name: &str) -> &str {
        self.property(name).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn insert(&mut self, name: String, value: String) {
        self.properties.insert(name, value);
    }
}

// Permissive by contract: malformed calendar text degrades to raw
// pass-through, it never errors.
pub fn parse_events(text: &str) -> Vec<ParsedEvent> {
    let unfolded = unfold_lines(text);

    let mut events = Vec::new();
    let mut in_event = false;
    let mut current: Vec<(String, String, String)> = Vec::new();

    for line in unfolded.split(|c| c == '\r' || c == '\n') {
        let line = line.trim();

        if line == "BEGIN:VEVENT" {
            in_event = true;
            current.clear();
            continue;
        }

        if line == "END:VEVENT" {
            in_event = false;
            let event = normalize_event(&current);
            if !event.is_empty() {
                events.push(event);
            }
            continue;
        }

        if !in_event {
            continue;
        }

        let Some((property_part, value)) = line.split_once(':') else {
            continue;
        };
        let (name, params) = match property_part.split_once(';') {
            Some((name, params)) => (name, params),
            None => (property_part, ""),
        };
        current.push((
            name.to_string(),
            params.to_string(),
            unescape_value(value),
        ));
    }

    events
}

// Folded lines resume with a single space or tab after the break.
fn unfold_lines(content: &str) -> String {
    content
        .replace("\r\n ", "")
        .replace("\r\n\t", "")
        .replace("\n ", "")
        .replace("\n\t", "")
}

// \n and \N first so the trailing backslash pass cannot double-unescape.
fn unescape_value(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\N", "\n")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
}

fn normalize_event(properties: &[(String, String, String)]) -> ParsedEvent {
    let mut event = ParsedEvent::default();

    for (name, params, value) in properties {
        let key = name.to_lowercase();
        if DATE_PROPERTIES.contains(&key.as_str()) {
            let normalized = normalize_date_value(value, params);
            if normalized != *value {
                event.insert(format!("{key}_raw"), value.clone());
            }
            event.insert(key, normalized);
        } else {
            event.insert(key, value.clone());
        }
    }

    event
}

// All-day values and datetime values both collapse to a plain calendar
// date; anything unrecognized passes through as-is.
fn normalize_date_value(value: &str, params: &str) -> String {
    let bytes = value.as_bytes();

    // Bare 8-digit values and VALUE=DATE parameters both mean all-day;
    // either way only a YYYYMMDD value can be rewritten.
    let all_day = params.contains("VALUE=DATE") || bytes.len() == 8;
    if all_day && bytes.len() == 8 && is_all_digits(bytes) {
        return format!("{}-{}-{}", &value[0..4], &value[4..6], &value[6..8]);
    }

    let datetime_len = if bytes.last() == Some(&b'Z') { 16 } else { 15 };
    if bytes.len() == datetime_len
        && bytes[8] == b'T'
        && is_all_digits(&bytes[0..8])
        && is_all_digits(&bytes[9..15])
    {
        return format!("{}-{}-{}", &value[0..4], &value[4..6], &value[6..8]);
    }

    value.to_string()
}

fn is_all_digits(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit)
}
