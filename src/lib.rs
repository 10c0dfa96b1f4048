// og-editable - inline click-to-edit for marked page regions
//
// Elements flagged with `data-og-editable` get a hover highlight and a click
// handler that opens a prompt pre-filled with the current value. Confirmed
// edits are sent to the backend resource named by the current route.
//
// Architecture:
// - dom: element arena with attributes, styles and event bindings
// - controller: discovery, hover/click bindings, the edit state machine
// - dialog: modal prompt service (trait + in-memory implementation)
// - routes: current route -> resource name
// - resource: payload/result types, resource registry, in-memory store
// - rest: reqwest-backed resource client
// - config / logging: ambient setup for the binary

pub mod config;
pub mod controller;
pub mod dialog;
pub mod dom;
pub mod logging;
pub mod resource;
pub mod rest;
pub mod routes;

pub use controller::{
    ConfigurationError, EditableConfig, EditableFieldController, HighlightStyle, Installation,
    PreDispatch, Proceed, CONTEXT_PREFIX, EDITABLE_ATTR,
};
pub use dialog::{DialogKind, DialogRequest, DialogService, DialogSnapshot, PromptDialog};
pub use dom::{Document, Element, ElementId, ElementRef, EventKind};
pub use resource::{
    EditRequestPayload, MemoryResource, ResourceClient, ResourceRegistry, ResultHandler,
    UpdateResult,
};
pub use rest::{RestClient, RestError};
pub use routes::{CurrentRoute, RouteResolver};
