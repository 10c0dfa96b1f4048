// Dialog service - modal prompts for the edit interaction
//
// The controller only talks to the `DialogService` trait. `PromptDialog` is
// the in-memory implementation: it holds at most one active modal, lets the
// host fill in fields and press buttons, and keeps a history of everything it
// was asked to show. Rendering is left to whoever drives it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback attached to a dialog button
pub type ButtonAction = Arc<dyn Fn() + Send + Sync>;

/// Dialog flavours the controller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    /// Prompt with input fields and buttons
    Input,
    /// Message box reporting a failed update
    Error,
}

/// A single text input inside an input dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogField {
    /// Label shown next to the input
    pub name: String,
    /// Identifier used to read the value back
    pub id: String,
    pub value: String,
}

/// Labelled button with its action
#[derive(Clone)]
pub struct DialogButton {
    pub label: String,
    pub action: ButtonAction,
}

impl DialogButton {
    pub fn new(label: impl Into<String>, action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            action: Arc::new(action),
        }
    }
}

impl fmt::Debug for DialogButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogButton")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Request to open a dialog
#[derive(Debug, Clone)]
pub enum DialogRequest {
    Input {
        title: String,
        fields: Vec<DialogField>,
        buttons: Vec<DialogButton>,
    },
    Error {
        message: String,
    },
}

impl DialogRequest {
    pub fn kind(&self) -> DialogKind {
        match self {
            DialogRequest::Input { .. } => DialogKind::Input,
            DialogRequest::Error { .. } => DialogKind::Error,
        }
    }

    /// Action-free copy for inspection
    pub fn snapshot(&self) -> DialogSnapshot {
        match self {
            DialogRequest::Input {
                title,
                fields,
                buttons,
            } => DialogSnapshot::Input {
                title: title.clone(),
                fields: fields.clone(),
                buttons: buttons.iter().map(|b| b.label.clone()).collect(),
            },
            DialogRequest::Error { message } => DialogSnapshot::Error {
                message: message.clone(),
            },
        }
    }
}

/// What a dialog looked like when it was opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogSnapshot {
    Input {
        title: String,
        fields: Vec<DialogField>,
        buttons: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl DialogSnapshot {
    pub fn kind(&self) -> DialogKind {
        match self {
            DialogSnapshot::Input { .. } => DialogKind::Input,
            DialogSnapshot::Error { .. } => DialogKind::Error,
        }
    }
}

/// Modal prompt lifecycle consumed by the edit controller
pub trait DialogService: Send + Sync {
    /// Show a dialog, replacing any dialog that is currently open
    fn open(&self, request: DialogRequest);

    /// Close the active dialog if it is of the given kind
    fn close(&self, kind: DialogKind);

    /// Current value of an input field
    fn read_field(&self, kind: DialogKind, field_id: &str) -> Option<String>;
}

#[derive(Default)]
struct PromptState {
    active: Option<DialogRequest>,
    /// Fields of the most recently closed input dialog, readable after close
    closed_fields: Vec<DialogField>,
    history: Vec<DialogSnapshot>,
}

/// In-memory single-modal dialog service
#[derive(Default)]
pub struct PromptDialog {
    state: Mutex<PromptState>,
}

impl PromptDialog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PromptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The open dialog, if any
    pub fn active(&self) -> Option<DialogSnapshot> {
        self.lock().active.as_ref().map(DialogRequest::snapshot)
    }

    pub fn is_open(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Every dialog opened so far, oldest first
    pub fn history(&self) -> Vec<DialogSnapshot> {
        self.lock().history.clone()
    }

    pub fn open_count(&self, kind: DialogKind) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|d| d.kind() == kind)
            .count()
    }

    /// Type into a field of the open input dialog
    pub fn set_field(&self, field_id: &str, value: impl Into<String>) -> bool {
        let mut state = self.lock();
        let Some(DialogRequest::Input { fields, .. }) = state.active.as_mut() else {
            return false;
        };
        match fields.iter_mut().find(|f| f.id == field_id) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Press a button on the open input dialog
    ///
    /// The action runs after the internal lock is released so it can call
    /// back into the service. Returns false if no such button is showing.
    pub fn press(&self, label: &str) -> bool {
        let action = {
            let state = self.lock();
            let Some(DialogRequest::Input { buttons, .. }) = state.active.as_ref() else {
                return false;
            };
            let Some(button) = buttons.iter().find(|b| b.label == label) else {
                return false;
            };
            button.action.clone()
        };

        tracing::debug!(button = label, "Dialog button pressed");
        action();
        true
    }

    /// Close whatever is open (escape key)
    pub fn dismiss(&self) {
        let kind = self.lock().active.as_ref().map(DialogRequest::kind);
        if let Some(kind) = kind {
            self.close(kind);
        }
    }
}

impl DialogService for PromptDialog {
    fn open(&self, request: DialogRequest) {
        let mut state = self.lock();
        if let Some(previous) = state.active.take() {
            tracing::debug!(kind = ?previous.kind(), "Replacing open dialog");
        }
        tracing::debug!(kind = ?request.kind(), "Opening dialog");
        state.history.push(request.snapshot());
        state.active = Some(request);
    }

    fn close(&self, kind: DialogKind) {
        let mut state = self.lock();
        if state.active.as_ref().map(DialogRequest::kind) != Some(kind) {
            return;
        }
        if let Some(DialogRequest::Input { fields, .. }) = state.active.take() {
            state.closed_fields = fields;
        }
        tracing::debug!(kind = ?kind, "Dialog closed");
    }

    fn read_field(&self, kind: DialogKind, field_id: &str) -> Option<String> {
        if kind != DialogKind::Input {
            return None;
        }
        let state = self.lock();
        let fields = match state.active.as_ref() {
            Some(DialogRequest::Input { fields, .. }) => fields,
            _ => &state.closed_fields,
        };
        fields
            .iter()
            .find(|f| f.id == field_id)
            .map(|f| f.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn input_dialog(buttons: Vec<DialogButton>) -> DialogRequest {
        DialogRequest::Input {
            title: "Edit name: \"Alice\"".to_string(),
            fields: vec![DialogField {
                name: "New Value".to_string(),
                id: "name".to_string(),
                value: "Alice".to_string(),
            }],
            buttons,
        }
    }

    #[test]
    fn test_single_active_dialog() {
        let dialogs = PromptDialog::new();
        dialogs.open(input_dialog(vec![]));
        dialogs.open(DialogRequest::Error {
            message: "conflict".to_string(),
        });

        assert_eq!(
            dialogs.active(),
            Some(DialogSnapshot::Error {
                message: "conflict".to_string()
            })
        );
        assert_eq!(dialogs.history().len(), 2);
    }

    #[test]
    fn test_field_readable_after_close() {
        let dialogs = PromptDialog::new();
        dialogs.open(input_dialog(vec![]));
        assert!(dialogs.set_field("name", "Bob"));

        dialogs.close(DialogKind::Input);
        assert!(!dialogs.is_open());
        assert_eq!(
            dialogs.read_field(DialogKind::Input, "name").as_deref(),
            Some("Bob")
        );
        assert_eq!(dialogs.read_field(DialogKind::Input, "missing"), None);
        assert_eq!(dialogs.read_field(DialogKind::Error, "name"), None);
    }

    #[test]
    fn test_close_ignores_other_kind() {
        let dialogs = PromptDialog::new();
        dialogs.open(input_dialog(vec![]));
        dialogs.close(DialogKind::Error);
        assert!(dialogs.is_open());

        dialogs.dismiss();
        assert!(!dialogs.is_open());
    }

    #[test]
    fn test_press_runs_action_outside_lock() {
        let dialogs = Arc::new(PromptDialog::new());
        let pressed = Arc::new(AtomicUsize::new(0));

        let ok = {
            let dialogs = dialogs.clone();
            let pressed = pressed.clone();
            DialogButton::new("OK", move || {
                // Re-entrant call into the service must not deadlock
                dialogs.close(DialogKind::Input);
                pressed.fetch_add(1, Ordering::SeqCst);
            })
        };
        dialogs.open(input_dialog(vec![ok]));

        assert!(!dialogs.press("Cancel"));
        assert!(dialogs.press("OK"));
        assert_eq!(pressed.load(Ordering::SeqCst), 1);
        assert!(!dialogs.is_open());
        assert!(!dialogs.press("OK"));
    }
}
