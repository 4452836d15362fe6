//! Composition collector state machine
//!
//! Drives one user through supplying a value for every tracked element and
//! emits a [`Composition`] only once every element holds an explicit value.
//!
//! Two input modes are supported:
//! - **Grid**: every element is pre-filled with 0.0 and may be edited in any
//!   order; `Search` finalizes.
//! - **Guided**: elements start empty and are walked one at a time; each value
//!   is confirmed before the walk moves on. Confirming the last missing value
//!   finalizes.
//!
//! Transitions are pure: [`Collector::apply`] consumes the collector and
//! returns the next one together with an [`Outcome`] describing what the user
//! should be told. Storage of collectors between events is the session
//! store's job.

use serde::Serialize;
use sgf_common::config::InputMode;
use sgf_common::{Composition, ElementSet};
use std::sync::Arc;

/// Where the collector is in the input dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum CollectorState {
    /// Waiting for a numeric value for the element at this index
    AwaitingElementValue(usize),
    /// Guided mode: value stored, waiting for the user to confirm it
    ConfirmingElementValue(usize),
    /// Grid mode: showing all values, waiting for the next edit selection
    Overview,
    /// Finalized; accepts no further input
    Complete,
}

/// Input event for a collector, already decoded from the transport
#[derive(Debug, Clone, PartialEq)]
pub enum CollectorEvent {
    /// Raw text for the element currently being asked for
    SetValue(String),
    /// Confirm the value of the element at this index (guided mode)
    Confirm(usize),
    /// Re-enter a value for the element at this index
    Edit(usize),
    /// Finalize with the current values (grid mode)
    Search,
    /// Discard all values and start over
    Reset,
    /// Abandon the dialogue
    Cancel,
}

/// What happened as a result of an event
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Ask for the value of the element at `index`
    Prompt { index: usize },
    /// Text did not parse; ask again for the same element
    InvalidValue { index: usize, text: String },
    /// Guided mode: value stored, ask for confirmation
    AwaitingConfirmation { index: usize, value: f64 },
    /// Grid mode: value stored, show the overview again
    Updated { index: usize, value: f64 },
    /// Every element holds a value; the collector is complete
    Finalized(Composition),
    /// The user abandoned the dialogue; the session should be cleared
    Cancelled,
    /// Event does not apply in the current state; nothing changed
    Ignored { reason: &'static str },
}

/// Result of applying one event
#[derive(Debug, Clone)]
pub struct Transition {
    pub collector: Collector,
    pub outcome: Outcome,
}

impl Transition {
    /// True when the session holding this collector should be cleared
    pub fn ends_session(&self) -> bool {
        matches!(self.outcome, Outcome::Finalized(_) | Outcome::Cancelled)
    }
}

/// Per-user in-progress composition plus dialogue state
#[derive(Debug, Clone, PartialEq)]
pub struct Collector {
    mode: InputMode,
    elements: Arc<ElementSet>,
    values: Vec<Option<f64>>,
    state: CollectorState,
}

impl Collector {
    /// Start a new dialogue in `mode` over `elements`
    pub fn new(mode: InputMode, elements: Arc<ElementSet>) -> Self {
        let values = initial_values(mode, elements.len());
        Self {
            mode,
            elements,
            values,
            state: CollectorState::AwaitingElementValue(0),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn elements(&self) -> &Arc<ElementSet> {
        &self.elements
    }

    /// Stored value for the element at `index` (`None` if not set yet)
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of elements that hold a value
    pub fn filled(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.state == CollectorState::Complete
    }

    /// Apply one event
    pub fn apply(mut self, event: CollectorEvent) -> Transition {
        if self.state == CollectorState::Complete {
            return self.ignore("collector already finalized");
        }

        match event {
            CollectorEvent::SetValue(text) => self.set_value(text),
            CollectorEvent::Confirm(index) => self.confirm(index),
            CollectorEvent::Edit(index) => {
                if index >= self.elements.len() {
                    return self.ignore("unknown element");
                }
                self.state = CollectorState::AwaitingElementValue(index);
                self.emit(Outcome::Prompt { index })
            }
            CollectorEvent::Search => match self.mode {
                InputMode::Grid => self.finalize(),
                InputMode::Guided => self.ignore("search is offered once every value is confirmed"),
            },
            CollectorEvent::Reset => {
                self.values = initial_values(self.mode, self.elements.len());
                self.state = CollectorState::AwaitingElementValue(0);
                self.emit(Outcome::Prompt { index: 0 })
            }
            CollectorEvent::Cancel => self.emit(Outcome::Cancelled),
        }
    }

    fn set_value(mut self, text: String) -> Transition {
        let index = match self.state {
            CollectorState::AwaitingElementValue(i) | CollectorState::ConfirmingElementValue(i) => i,
            CollectorState::Overview | CollectorState::Complete => {
                return self.ignore("choose an element before entering a value");
            }
        };

        let Some(value) = parse_value(&text) else {
            return self.emit(Outcome::InvalidValue { index, text });
        };

        self.values[index] = Some(value);

        match self.mode {
            InputMode::Grid => {
                self.state = CollectorState::Overview;
                self.emit(Outcome::Updated { index, value })
            }
            InputMode::Guided => {
                self.state = CollectorState::ConfirmingElementValue(index);
                self.emit(Outcome::AwaitingConfirmation { index, value })
            }
        }
    }

    fn confirm(mut self, index: usize) -> Transition {
        if self.mode != InputMode::Guided {
            return self.ignore("confirmation is only used in guided mode");
        }

        match self.state {
            CollectorState::ConfirmingElementValue(current) if current == index => {}
            _ => return self.ignore("stale confirmation"),
        }

        match self.next_unset_after(index) {
            Some(next) => {
                self.state = CollectorState::AwaitingElementValue(next);
                self.emit(Outcome::Prompt { index: next })
            }
            None => self.finalize(),
        }
    }

    /// First element without a value after `index`, wrapping around
    fn next_unset_after(&self, index: usize) -> Option<usize> {
        let len = self.values.len();
        (1..=len)
            .map(|offset| (index + offset) % len)
            .find(|i| self.values[*i].is_none())
    }

    fn finalize(mut self) -> Transition {
        let values: Option<Vec<f64>> = self.values.iter().copied().collect();
        let composition = values.and_then(|v| Composition::new(Arc::clone(&self.elements), v).ok());

        match composition {
            Some(composition) => {
                self.state = CollectorState::Complete;
                self.emit(Outcome::Finalized(composition))
            }
            None => self.ignore("not every element has a value"),
        }
    }

    fn emit(self, outcome: Outcome) -> Transition {
        Transition {
            collector: self,
            outcome,
        }
    }

    fn ignore(self, reason: &'static str) -> Transition {
        self.emit(Outcome::Ignored { reason })
    }
}

fn initial_values(mode: InputMode, len: usize) -> Vec<Option<f64>> {
    match mode {
        InputMode::Grid => vec![Some(0.0); len],
        InputMode::Guided => vec![None; len],
    }
}

/// Parse user-entered percentage text
///
/// Accepts surrounding whitespace and `,` as decimal separator. Non-finite
/// values are rejected.
pub fn parse_value(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
