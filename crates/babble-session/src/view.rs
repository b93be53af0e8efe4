//! Render model projected from [`SessionState`].

use serde::Serialize;

use crate::state::SessionState;

/// A button as the renderer should draw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    /// Button caption.
    pub label: &'static str,
    /// Whether the button accepts clicks.
    pub enabled: bool,
}

/// Everything the session screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// The lesson-generation button.
    pub lesson_button: ButtonView,
    /// The analysis-start button.
    pub analysis_button: ButtonView,
    /// Lesson text to display.
    pub lesson: Option<String>,
    /// Whether the export action is offered.
    pub can_export: bool,
    /// Error message to display.
    pub error_message: Option<String>,
}

impl SessionView {
    /// Projects `state` into a view. Pure.
    #[must_use]
    pub fn project(state: &SessionState) -> Self {
        let lesson_button = if state.lesson_in_flight() {
            ButtonView {
                label: "Generating Lesson...",
                enabled: false,
            }
        } else {
            ButtonView {
                label: "I Already Know My Speech Issue",
                enabled: true,
            }
        };

        let analysis_button = if state.analysis_in_flight() {
            ButtonView {
                label: "Starting Analysis...",
                enabled: false,
            }
        } else {
            ButtonView {
                label: "Start AI Speech Analysis",
                enabled: true,
            }
        };

        let lesson = state.lesson_text().map(str::to_string);

        Self {
            lesson_button,
            analysis_button,
            can_export: lesson.is_some(),
            lesson,
            error_message: state.last_error().map(|e| e.message.clone()),
        }
    }
}

impl From<&SessionState> for SessionView {
    fn from(state: &SessionState) -> Self {
        Self::project(state)
    }
}
