use crate::infrastructure::ics_parser::parse_events;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAssignment {
    pub uid: String,
    pub title: String,
    pub course: String,
    pub due_date: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineBlock {
    pub uid: String,
    pub date: String,
    pub label: String,
    pub assignment_title: String,
    pub course: String,
    pub description: String,
}

// Source calendar summaries carry the course in a trailing bracket:
// "Assignment Title [Course Code]".
pub fn extract_assignments(text: &str) -> Vec<SourceAssignment> {
    parse_events(text)
        .iter()
        .map(|event| {
            let summary = event.property_or_default("summary");
            let (title, course) = split_trailing_bracket(summary);
            let due_date = event
                .property("dtstart")
                .or_else(|| event.property("dtend"))
                .unwrap_or("");

            SourceAssignment {
                uid: event.property_or_default("uid").to_string(),
                title,
                course,
                due_date: due_date.to_string(),
                description: event.property_or_default("description").to_string(),
                url: event.property_or_default("url").to_string(),
            }
        })
        .collect()
}

// Engine summaries prepend a phase label:
// "[phase label] Assignment Title [Course Code]".
pub fn extract_engine_blocks(text: &str) -> Vec<EngineBlock> {
    parse_events(text)
        .iter()
        .map(|event| {
            let summary = event.property_or_default("summary");
            let (label, remainder) = split_leading_bracket(summary);
            let (assignment_title, course) = split_trailing_bracket(&remainder);

            EngineBlock {
                uid: event.property_or_default("uid").to_string(),
                date: event.property_or_default("dtstart").to_string(),
                label,
                assignment_title,
                course,
                description: event.property_or_default("description").to_string(),
            }
        })
        .collect()
}

// "[label] rest" -> ("[label]", "rest"); the label keeps its brackets.
fn split_leading_bracket(summary: &str) -> (String, String) {
    if summary.starts_with('[') {
        if let Some(close) = summary.find(']') {
            if close > 1 {
                let label = summary[..=close].to_string();
                let rest = summary[close + 1..].trim_start().to_string();
                return (label, rest);
            }
        }
    }

    (String::new(), summary.to_string())
}

// "title [course]" -> ("title", "course"); the course loses its brackets.
fn split_trailing_bracket(summary: &str) -> (String, String) {
    if summary.ends_with(']') {
        if let Some(open) = summary.rfind('[') {
            let content = &summary[open + 1..summary.len() - 1];
            if !content.is_empty() && !content.contains(']') {
                return (summary[..open].trim().to_string(), content.to_string());
            }
        }
    }

    (summary.trim().to_string(), String::new())
}
