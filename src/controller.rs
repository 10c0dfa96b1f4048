//! # Editable field controller
//!
//! Turns marked elements into click-to-edit fields.
//!
//! ```text
//! Idle ──click──▶ DialogOpen ──OK──────▶ Committed ──put──▶ Idle
//!                     │
//!                     └──────Cancel────▶ Cancelled ───────▶ Idle
//! ```
//!
//! Any element carrying `data-og-editable="<field>"` is a marker. Sibling
//! `data-og-<key>` attributes travel with the edit as context (node ids,
//! parent ids, ...). On OK the payload goes either straight to the resource
//! named by the current route, or through the configured pre-dispatch hook
//! which decides if and when to proceed.

use crate::dialog::{DialogButton, DialogField, DialogKind, DialogRequest, DialogService};
use crate::dom::{Attribute, Document, DomEvent, ElementId, EventKind};
use crate::resource::{EditRequestPayload, ResourceRegistry, ResultHandler, UpdateResult};
use crate::routes::{resource_name, RouteResolver};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Attribute that marks an element as editable; its value is the field type
pub const EDITABLE_ATTR: &str = "data-og-editable";

/// Prefix of attributes copied into the payload as context
pub const CONTEXT_PREFIX: &str = "data-og-";

/// Context key naming the mechanism itself, never sent
const RESERVED_KEY: &str = "editable";

/// Namespace for the hover and click bindings owned by the controller
const BINDING_NAMESPACE: &str = "og-editable";

/// Label of the dialog input holding the new value
const NEW_VALUE_LABEL: &str = "New Value";

/// Hook run before an update is sent
///
/// Receives the payload and a `Proceed` continuation. Nothing is sent unless
/// the hook calls `proceed.run(payload)`, possibly later or from another
/// thread, possibly with a rewritten payload.
pub type PreDispatch = Arc<dyn Fn(EditRequestPayload, Proceed) + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Caller configuration for one installation
#[derive(Clone, Default)]
pub struct EditableConfig {
    /// Receives successful update results. Required.
    pub handler: Option<ResultHandler>,
    /// Optional interception point before the update is sent
    pub pre_dispatch: Option<PreDispatch>,
}

impl EditableConfig {
    pub fn new(handler: impl Fn(UpdateResult) + Send + Sync + 'static) -> Self {
        Self {
            handler: Some(Arc::new(handler)),
            pre_dispatch: None,
        }
    }

    pub fn with_pre_dispatch(
        mut self,
        hook: impl Fn(EditRequestPayload, Proceed) + Send + Sync + 'static,
    ) -> Self {
        self.pre_dispatch = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for EditableConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableConfig")
            .field("handler", &self.handler.is_some())
            .field("pre_dispatch", &self.pre_dispatch.is_some())
            .finish()
    }
}

/// Rejected configuration; nothing was installed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("config.handler must be a function")]
    MissingHandler,
}

/// Background colours for the hover affordance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightStyle {
    /// Shown while the pointer is over a marker
    pub edit: String,
    /// Restored when the pointer leaves
    pub idle: String,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            edit: "#fffee5".to_string(),
            idle: "transparent".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Sends payloads to the resource named by the current route
#[derive(Clone)]
struct Dispatcher {
    routes: Arc<dyn RouteResolver>,
    resources: Arc<ResourceRegistry>,
}

impl Dispatcher {
    fn dispatch(&self, payload: EditRequestPayload) {
        // Resolved now, not at install time: the user may have navigated
        let page = self.routes.current_page();
        let name = resource_name(&page);

        match self.resources.get(name) {
            Some(client) => {
                tracing::info!(resource = name, fields = ?payload.fields().keys().collect::<Vec<_>>(), "Submitting edit");
                client.put(payload);
            }
            None => {
                tracing::warn!(page = %page, "No resource registered for current route");
                payload.complete(UpdateResult::failed(format!(
                    "No resource registered for route {}",
                    page
                )));
            }
        }
    }
}

/// Continuation handed to the pre-dispatch hook
pub struct Proceed {
    dispatcher: Dispatcher,
}

impl Proceed {
    /// Send the (possibly rewritten) payload
    pub fn run(self, payload: EditRequestPayload) {
        self.dispatcher.dispatch(payload);
    }
}

impl fmt::Debug for Proceed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proceed").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit interaction
// ─────────────────────────────────────────────────────────────────────────────

/// State captured when a marker is clicked
#[derive(Clone)]
struct PendingEdit {
    field_type: String,
    context: EditRequestPayload,
}

/// Everything a click handler needs, shared by all markers of an installation
struct EditSession {
    dialogs: Arc<dyn DialogService>,
    dispatcher: Dispatcher,
    handler: ResultHandler,
    pre_dispatch: Option<PreDispatch>,
}

impl EditSession {
    /// Idle -> DialogOpen
    fn begin(self: &Arc<Self>, event: &mut DomEvent) {
        event.prevent_default();

        let target = &event.target;
        let Some(field_type) = target.attr(EDITABLE_ATTR) else {
            tracing::debug!(element = %target.id(), "Clicked element is no longer editable");
            return;
        };
        let value = target.content();
        let pending = PendingEdit {
            field_type: field_type.clone(),
            context: collect_context(&target.attributes()),
        };

        let ok = {
            let session = Arc::clone(self);
            DialogButton::new("OK", move || session.commit(pending.clone()))
        };
        let cancel = {
            let dialogs = self.dialogs.clone();
            DialogButton::new("Cancel", move || {
                tracing::debug!("Edit cancelled");
                dialogs.close(DialogKind::Input);
            })
        };

        tracing::debug!(element = %target.id(), field = %field_type, "Opening edit dialog");
        self.dialogs.open(DialogRequest::Input {
            title: format!("Edit {}: \"{}\"", field_type, value),
            fields: vec![DialogField {
                name: NEW_VALUE_LABEL.to_string(),
                id: field_type,
                value,
            }],
            buttons: vec![ok, cancel],
        });
    }

    /// DialogOpen -> Committed
    fn commit(&self, pending: PendingEdit) {
        self.dialogs.close(DialogKind::Input);

        let Some(new_value) = self
            .dialogs
            .read_field(DialogKind::Input, &pending.field_type)
        else {
            tracing::warn!(field = %pending.field_type, "Edit dialog returned no value");
            return;
        };

        let mut payload = pending.context;
        payload.insert(pending.field_type, new_value);
        payload.set_handler(self.result_handler());

        let proceed = Proceed {
            dispatcher: self.dispatcher.clone(),
        };
        match &self.pre_dispatch {
            Some(hook) => hook(payload, proceed),
            None => proceed.run(payload),
        }
    }

    /// Server errors go to an error dialog, everything else to the caller
    fn result_handler(&self) -> ResultHandler {
        let dialogs = self.dialogs.clone();
        let handler = self.handler.clone();
        Arc::new(move |result: UpdateResult| {
            if result.error {
                tracing::warn!(message = %result.message, "Server rejected edit");
                dialogs.open(DialogRequest::Error {
                    message: result.message,
                });
                return;
            }
            handler(result);
        })
    }
}

/// Context fields from `data-og-<key>` attributes, minus the reserved key
fn collect_context(attributes: &[Attribute]) -> EditRequestPayload {
    let mut payload = EditRequestPayload::new();
    for attribute in attributes {
        if let Some(key) = attribute.name.strip_prefix(CONTEXT_PREFIX) {
            if !key.is_empty() {
                payload.insert(key, attribute.value.clone());
            }
        }
    }
    payload.remove(RESERVED_KEY);
    payload
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller + Installation
// ─────────────────────────────────────────────────────────────────────────────

/// Installs click-to-edit behaviour on a document
pub struct EditableFieldController {
    document: Document,
    dialogs: Arc<dyn DialogService>,
    routes: Arc<dyn RouteResolver>,
    resources: Arc<ResourceRegistry>,
    highlight: HighlightStyle,
}

impl EditableFieldController {
    pub fn new(
        document: Document,
        dialogs: Arc<dyn DialogService>,
        routes: Arc<dyn RouteResolver>,
        resources: ResourceRegistry,
    ) -> Self {
        Self {
            document,
            dialogs,
            routes,
            resources: Arc::new(resources),
            highlight: HighlightStyle::default(),
        }
    }

    pub fn with_highlight(mut self, highlight: HighlightStyle) -> Self {
        self.highlight = highlight;
        self
    }

    /// Scan the document and bind every marker
    ///
    /// Fails before touching the document if no handler is configured.
    /// Installing again replaces the bindings of the previous installation.
    pub fn install(&self, config: EditableConfig) -> Result<Installation, ConfigurationError> {
        let handler = config.handler.ok_or(ConfigurationError::MissingHandler)?;

        let session = Arc::new(EditSession {
            dialogs: self.dialogs.clone(),
            dispatcher: Dispatcher {
                routes: self.routes.clone(),
                resources: self.resources.clone(),
            },
            handler,
            pre_dispatch: config.pre_dispatch,
        });
        let installation = Installation {
            document: self.document.clone(),
            session,
            highlight: self.highlight.clone(),
            markers: Mutex::new(Vec::new()),
        };

        for marker in self.document.query_by_attribute(EDITABLE_ATTR) {
            installation.bind(marker.id());
        }
        tracing::info!(
            markers = installation.markers().len(),
            resources = ?self.resources.names(),
            "Editable fields installed"
        );
        Ok(installation)
    }
}

/// Result of a successful `install`
pub struct Installation {
    document: Document,
    session: Arc<EditSession>,
    highlight: HighlightStyle,
    markers: Mutex<Vec<ElementId>>,
}

impl Installation {
    /// Elements bound by this installation
    pub fn markers(&self) -> Vec<ElementId> {
        self.markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bind a marker added to the document after installation
    ///
    /// Returns false if the element is gone or carries no marker attribute.
    pub fn register_marker(&self, id: ElementId) -> bool {
        let is_marker = self
            .document
            .element(id)
            .is_some_and(|e| e.attr(EDITABLE_ATTR).is_some());
        if !is_marker {
            tracing::debug!(element = %id, "Not an editable marker");
            return false;
        }
        self.bind(id);
        true
    }

    fn bind(&self, id: ElementId) {
        let doc = &self.document;
        let ns = Some(BINDING_NAMESPACE);

        doc.off(id, EventKind::MouseEnter, ns);
        doc.off(id, EventKind::MouseLeave, ns);
        let edit = self.highlight.edit.clone();
        doc.on(
            id,
            EventKind::MouseEnter,
            ns,
            Arc::new(move |event: &mut DomEvent| {
                event.target.set_css("background-color", edit.as_str())
            }),
        );
        let idle = self.highlight.idle.clone();
        doc.on(
            id,
            EventKind::MouseLeave,
            ns,
            Arc::new(move |event: &mut DomEvent| {
                event.target.set_css("background-color", idle.as_str())
            }),
        );

        // Click replaces every existing click binding, not just ours
        doc.off(id, EventKind::Click, None);
        let session = self.session.clone();
        doc.on(
            id,
            EventKind::Click,
            ns,
            Arc::new(move |event: &mut DomEvent| session.begin(event)),
        );

        let mut markers = self.markers.lock().unwrap_or_else(PoisonError::into_inner);
        if !markers.contains(&id) {
            markers.push(id);
        }
        tracing::debug!(element = %id, "Bound editable marker");
    }
}

impl fmt::Debug for Installation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Installation")
            .field("markers", &self.markers())
            .finish_non_exhaustive()
    }
}
