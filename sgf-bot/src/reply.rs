//! Reply descriptors
//!
//! A [`SessionReply`] is what the transport shows the user: display text and
//! rows of selectable options. Option tokens are produced with
//! [`option_token`] so every offered option decodes back to a command.

use crate::collector::{Collector, CollectorState};
use crate::command::{option_token, Command};
use crate::matcher::SearchResult;
use serde::{Deserialize, Serialize};
use sgf_common::config::InputMode;
use sgf_common::ElementSet;

/// Elements per row in the grid overview
const GRID_COLUMNS: usize = 2;

/// One selectable option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyOption {
    pub label: String,
    pub token: String,
}

/// Display text plus option rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReply {
    pub text: String,
    #[serde(default)]
    pub options: Vec<Vec<ReplyOption>>,
}

impl SessionReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<ReplyOption>) -> Self {
        if !row.is_empty() {
            self.options.push(row);
        }
        self
    }

    /// All option tokens, row by row
    pub fn tokens(&self) -> Vec<&str> {
        self.options
            .iter()
            .flatten()
            .map(|option| option.token.as_str())
            .collect()
    }
}

fn option(label: impl Into<String>, command: &Command, elements: &ElementSet) -> Option<ReplyOption> {
    option_token(command, elements).map(|token| ReplyOption {
        label: label.into(),
        token,
    })
}

fn row(options: impl IntoIterator<Item = Option<ReplyOption>>) -> Vec<ReplyOption> {
    options.into_iter().flatten().collect()
}

fn symbol(elements: &ElementSet, index: usize) -> &str {
    elements.get(index).map(|e| e.symbol()).unwrap_or("?")
}

/// Greeting with the mode choice
pub fn welcome(elements: &ElementSet) -> SessionReply {
    SessionReply::text(format!(
        "Steel grade finder. Enter a chemical composition ({} elements, mass %) \
         and get the grades it fits.\nChoose how to enter it:",
        elements.len()
    ))
    .with_row(row([
        option("All elements at once", &Command::Begin(InputMode::Grid), elements),
        option("Step by step", &Command::Begin(InputMode::Guided), elements),
    ]))
}

/// First reply of a new dialogue
pub fn started(collector: &Collector) -> SessionReply {
    current_view(collector)
}

/// Reply matching the collector's current state
pub fn current_view(collector: &Collector) -> SessionReply {
    match collector.state() {
        CollectorState::AwaitingElementValue(index) => value_prompt(collector, index),
        CollectorState::ConfirmingElementValue(index) => {
            confirm_prompt(collector, index, collector.value(index).unwrap_or(0.0))
        }
        CollectorState::Overview => grid_overview(
            collector,
            "Composition (mass %). Select an element to change it, or search:",
        ),
        CollectorState::Complete => SessionReply::text("Search finished."),
    }
}

/// Grid mode: every element with its value, two per row, then Search/Reset
pub fn grid_overview(collector: &Collector, header: &str) -> SessionReply {
    let elements = collector.elements();

    let cells: Vec<Option<ReplyOption>> = elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let value = collector.value(index).unwrap_or(0.0);
            option(
                format!("{}: {:.3}", element, value),
                &Command::Edit(index),
                elements,
            )
        })
        .collect();

    let mut reply = SessionReply::text(header);
    for chunk in cells.chunks(GRID_COLUMNS) {
        reply = reply.with_row(row(chunk.iter().cloned()));
    }

    reply
        .with_row(row([
            option("Search", &Command::Search, elements),
            option("Reset", &Command::Reset, elements),
        ]))
        .with_row(row([option("Cancel", &Command::Cancel, elements)]))
}

/// Ask for the value of one element
pub fn value_prompt(collector: &Collector, index: usize) -> SessionReply {
    let elements = collector.elements();
    let symbol = symbol(elements, index);

    match collector.mode() {
        InputMode::Grid => grid_overview(
            collector,
            &format!(
                "Enter the {} content (mass %), or select another element:",
                symbol
            ),
        ),
        InputMode::Guided => SessionReply::text(format!(
            "Step {}/{}: enter the {} content (mass %):",
            index + 1,
            elements.len(),
            symbol
        ))
        .with_row(row([option("Cancel", &Command::Cancel, elements)])),
    }
}

/// Guided mode: ask to confirm the value just entered
pub fn confirm_prompt(collector: &Collector, index: usize, value: f64) -> SessionReply {
    let elements = collector.elements();

    SessionReply::text(format!(
        "{} = {:.3} %. Confirm, or type another value:",
        symbol(elements, index),
        value
    ))
    .with_row(row([
        option("Confirm", &Command::Confirm(index), elements),
        option("Edit", &Command::Edit(index), elements),
    ]))
    .with_row(row([option("Cancel", &Command::Cancel, elements)]))
}

/// Text did not parse; the same element is asked for again
pub fn invalid_value(collector: &Collector, index: usize, text: &str) -> SessionReply {
    let mut reply = value_prompt(collector, index);
    reply.text = format!(
        "\"{}\" is not a number. Use digits with '.' or ',' as decimal separator.\n{}",
        text.trim(),
        reply.text
    );
    reply
}

/// Event did not apply; repeat the current view with a hint
pub fn ignored(collector: &Collector, reason: &str) -> SessionReply {
    let mut reply = current_view(collector);
    reply.text = format!("Not now: {}.\n{}", reason, reply.text);
    reply
}

/// Rendered search result with a "new search" option
pub fn search_result(result: &SearchResult, mode: InputMode, elements: &ElementSet) -> SessionReply {
    let text = match result {
        SearchResult::ExactMatches { grades } => {
            let mut text = format!("Grades matching this composition ({}):", grades.len());
            for grade in grades {
                text.push_str(&format!("\n- {} ({})", grade.name, grade.specification));
            }
            text
        }
        SearchResult::NearestMatch(nearest) => {
            let midpoints: Vec<String> = nearest
                .centroid
                .iter()
                .filter(|(_, value)| *value != 0.0)
                .map(|(element, value)| format!("{} {:.3}", element, value))
                .collect();

            format!(
                "No grade contains this composition.\nClosest grade: {} ({}), distance {:.3}\nRange midpoints: {}",
                nearest.grade.name,
                nearest.grade.specification,
                nearest.distance,
                if midpoints.is_empty() {
                    "all 0".to_string()
                } else {
                    midpoints.join(", ")
                }
            )
        }
        SearchResult::NoMatch => "No matching grade found: the catalog is empty.".to_string(),
    };

    SessionReply::text(text).with_row(row([option(
        "New search",
        &Command::Begin(mode),
        elements,
    )]))
}

/// Dialogue cancelled; "New search" restarts in the mode just used
pub fn cancelled(mode: InputMode, elements: &ElementSet) -> SessionReply {
    SessionReply::text("Search cancelled.").with_row(row([option(
        "New search",
        &Command::Begin(mode),
        elements,
    )]))
}

/// Input arrived while no dialogue is in progress
pub fn no_session(elements: &ElementSet) -> SessionReply {
    let mut reply = welcome(elements);
    reply.text = "No search in progress. Use /find, or choose a mode:".to_string();
    reply
}

/// Unknown command or option
pub fn unrecognized(message: &str, elements: &ElementSet) -> SessionReply {
    let mut reply = welcome(elements);
    reply.text = format!("{}. Use /find to start a search.", message);
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectorEvent;
    use crate::command::decode;
    use crate::command::{InboundEvent, UserRef};
    use sgf_common::{GradeRecord, NullBoundPolicy};
    use std::sync::Arc;

    fn elements() -> Arc<ElementSet> {
        Arc::new(ElementSet::new(["C", "Si", "Mn"]).unwrap())
    }

    fn labels(reply: &SessionReply) -> Vec<Vec<&str>> {
        reply
            .options
            .iter()
            .map(|row| row.iter().map(|o| o.label.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_grid_overview_layout() {
        let collector = Collector::new(InputMode::Grid, elements())
            .apply(CollectorEvent::SetValue("0.2".into()))
            .collector;

        let reply = current_view(&collector);
        assert_eq!(
            labels(&reply),
            vec![
                vec!["C: 0.200", "Si: 0.000"],
                vec!["Mn: 0.000"],
                vec!["Search", "Reset"],
                vec!["Cancel"],
            ]
        );
        assert_eq!(
            reply.tokens(),
            vec!["edit:C", "edit:Si", "edit:Mn", "search", "reset", "cancel"]
        );
    }

    #[test]
    fn test_guided_prompts() {
        let collector = Collector::new(InputMode::Guided, elements());
        let reply = current_view(&collector);
        assert!(reply.text.starts_with("Step 1/3"));
        assert_eq!(reply.tokens(), vec!["cancel"]);

        let collector = collector
            .apply(CollectorEvent::SetValue("0.25".into()))
            .collector;
        let reply = current_view(&collector);
        assert!(reply.text.starts_with("C = 0.250 %"));
        assert_eq!(reply.tokens(), vec!["confirm:C", "edit:C", "cancel"]);
    }

    #[test]
    fn test_every_offered_token_decodes() {
        let elements = elements();
        let collector = Collector::new(InputMode::Grid, Arc::clone(&elements));
        let replies = [
            welcome(&elements),
            current_view(&collector),
            confirm_prompt(&collector, 2, 1.0),
            cancelled(InputMode::Grid, &elements),
            cancelled(InputMode::Guided, &elements),
        ];

        for reply in &replies {
            for token in reply.tokens() {
                let event = InboundEvent::OptionSelected {
                    user: UserRef::new(1, "t"),
                    token: token.to_string(),
                };
                assert!(
                    decode(&event, &elements, InputMode::Grid).is_ok(),
                    "offered token {:?} does not decode",
                    token
                );
            }
        }
    }

    #[test]
    fn test_cancel_offers_same_mode() {
        let elements = elements();
        assert_eq!(cancelled(InputMode::Guided, &elements).tokens(), vec!["begin:guided"]);
        assert_eq!(cancelled(InputMode::Grid, &elements).tokens(), vec!["begin:grid"]);
    }

    #[test]
    fn test_exact_result_lists_grades() {
        let grade = GradeRecord {
            name: "A36".to_string(),
            specification: "ASTM A36".to_string(),
            ranges: Vec::new(),
        };
        let result = SearchResult::ExactMatches { grades: vec![grade] };

        let reply = search_result(&result, InputMode::Guided, &elements());
        assert!(reply.text.contains("- A36 (ASTM A36)"));
        assert_eq!(reply.tokens(), vec!["begin:guided"]);
    }

    #[test]
    fn test_nearest_result_shows_distance_and_midpoints() {
        let elements = elements();
        let grade = GradeRecord {
            name: "A36".to_string(),
            specification: "ASTM A36".to_string(),
            ranges: vec![
                sgf_common::ElementRange::new(Some(0.0), Some(0.25)),
                sgf_common::ElementRange::new(Some(0.0), Some(0.0)),
                sgf_common::ElementRange::new(Some(0.0), Some(1.0)),
            ],
        };
        let centroid = grade.centroid(&elements, NullBoundPolicy::Zero).unwrap();
        let result = SearchResult::NearestMatch(crate::matcher::NearestMatch {
            grade,
            centroid,
            distance: 0.5303,
        });

        let reply = search_result(&result, InputMode::Grid, &elements);
        assert!(reply.text.contains("Closest grade: A36 (ASTM A36), distance 0.530"));
        assert!(reply.text.contains("C 0.125, Mn 0.500"));
    }

    #[test]
    fn test_invalid_value_repeats_prompt() {
        let collector = Collector::new(InputMode::Guided, elements());
        let reply = invalid_value(&collector, 0, " abc ");
        assert!(reply.text.starts_with("\"abc\" is not a number"));
        assert!(reply.text.contains("enter the C content"));
    }
}
