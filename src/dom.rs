//! Document model for editable pages
//!
//! A small element arena with structured attributes, inline styles and event
//! bindings. Elements are addressed by `ElementId`; `ElementRef` is the
//! convenience handle handed to event handlers.
//!
//! Handlers are stored per element and event kind, optionally tagged with a
//! namespace so one owner can remove its own bindings without touching
//! anyone else's.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback invoked when an event fires on an element
pub type EventHandler = Arc<dyn Fn(&mut DomEvent) + Send + Sync>;

/// Stable handle to an element in a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events an element can receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    MouseEnter,
    MouseLeave,
}

/// A single name/value attribute pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element description used to populate a document
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attributes: Vec<Attribute>,
    content: String,
    styles: BTreeMap<String, String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set an attribute, replacing an existing one with the same name
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_attribute(&mut self.attributes, name.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }
}

fn set_attribute(attributes: &mut Vec<Attribute>, name: String, value: String) {
    match attributes.iter_mut().find(|a| a.name == name) {
        Some(existing) => existing.value = value,
        None => attributes.push(Attribute { name, value }),
    }
}

/// Event delivered to handlers
pub struct DomEvent {
    pub kind: EventKind,
    pub target: ElementRef,
    default_prevented: bool,
}

impl DomEvent {
    /// Suppress the element's default action (navigation for links)
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl fmt::Debug for DomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomEvent")
            .field("kind", &self.kind)
            .field("target", &self.target.id())
            .field("default_prevented", &self.default_prevented)
            .finish()
    }
}

struct Binding {
    namespace: Option<String>,
    handler: EventHandler,
}

struct Node {
    element: Element,
    bindings: HashMap<EventKind, Vec<Binding>>,
}

#[derive(Default)]
struct Arena {
    next_id: usize,
    nodes: BTreeMap<ElementId, Node>,
}

/// Shared handle to a rendered document
///
/// Cloning is cheap; all clones observe the same elements.
#[derive(Clone, Default)]
pub struct Document {
    arena: Arc<Mutex<Arena>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Arena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an element to the document and return its handle
    pub fn append(&self, element: Element) -> ElementId {
        let mut arena = self.lock();
        let id = ElementId(arena.next_id);
        arena.next_id += 1;
        arena.nodes.insert(
            id,
            Node {
                element,
                bindings: HashMap::new(),
            },
        );
        id
    }

    /// Remove an element and every binding attached to it
    pub fn remove(&self, id: ElementId) -> bool {
        self.lock().nodes.remove(&id).is_some()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.lock().nodes.contains_key(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<ElementRef> {
        self.contains(id).then(|| ElementRef {
            document: self.clone(),
            id,
        })
    }

    /// All elements carrying the named attribute, in document order
    pub fn query_by_attribute(&self, name: &str) -> Vec<ElementRef> {
        let ids: Vec<ElementId> = self
            .lock()
            .nodes
            .iter()
            .filter(|(_, node)| node.element.attributes.iter().any(|a| a.name == name))
            .map(|(id, _)| *id)
            .collect();

        ids.into_iter()
            .map(|id| ElementRef {
                document: self.clone(),
                id,
            })
            .collect()
    }

    /// Bind a handler; returns false when the element does not exist
    pub fn on(
        &self,
        id: ElementId,
        kind: EventKind,
        namespace: Option<&str>,
        handler: EventHandler,
    ) -> bool {
        let mut arena = self.lock();
        let Some(node) = arena.nodes.get_mut(&id) else {
            return false;
        };
        node.bindings.entry(kind).or_default().push(Binding {
            namespace: namespace.map(str::to_string),
            handler,
        });
        true
    }

    /// Remove handlers for an event kind
    ///
    /// With a namespace only that namespace's handlers are removed; without
    /// one every handler for the kind goes. Returns the number removed.
    pub fn off(&self, id: ElementId, kind: EventKind, namespace: Option<&str>) -> usize {
        let mut arena = self.lock();
        let Some(bindings) = arena
            .nodes
            .get_mut(&id)
            .and_then(|node| node.bindings.get_mut(&kind))
        else {
            return 0;
        };

        let before = bindings.len();
        match namespace {
            Some(ns) => bindings.retain(|b| b.namespace.as_deref() != Some(ns)),
            None => bindings.clear(),
        }
        before - bindings.len()
    }

    pub fn binding_count(&self, id: ElementId, kind: EventKind) -> usize {
        self.lock()
            .nodes
            .get(&id)
            .and_then(|node| node.bindings.get(&kind))
            .map_or(0, Vec::len)
    }

    /// Fire an event on an element
    ///
    /// Handlers run in binding order with the document unlocked, so they may
    /// freely read and mutate the document. Returns `None` if the element
    /// does not exist.
    pub fn trigger(&self, id: ElementId, kind: EventKind) -> Option<DomEvent> {
        let handlers: Vec<EventHandler> = {
            let arena = self.lock();
            let node = arena.nodes.get(&id)?;
            node.bindings
                .get(&kind)
                .map(|bindings| bindings.iter().map(|b| b.handler.clone()).collect())
                .unwrap_or_default()
        };

        let mut event = DomEvent {
            kind,
            target: ElementRef {
                document: self.clone(),
                id,
            },
            default_prevented: false,
        };
        for handler in handlers {
            handler(&mut event);
        }
        Some(event)
    }

    pub fn click(&self, id: ElementId) -> Option<DomEvent> {
        self.trigger(id, EventKind::Click)
    }

    pub fn hover_enter(&self, id: ElementId) -> Option<DomEvent> {
        self.trigger(id, EventKind::MouseEnter)
    }

    pub fn hover_leave(&self, id: ElementId) -> Option<DomEvent> {
        self.trigger(id, EventKind::MouseLeave)
    }

    fn with_element<T>(&self, id: ElementId, f: impl FnOnce(&mut Element) -> T) -> Option<T> {
        self.lock().nodes.get_mut(&id).map(|node| f(&mut node.element))
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.lock().nodes.len())
            .finish()
    }
}

/// Handle to one element of a document
///
/// Accessors return `None`/empty values once the element has been removed.
#[derive(Clone)]
pub struct ElementRef {
    document: Document,
    id: ElementId,
}

impl ElementRef {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn tag(&self) -> Option<String> {
        self.document.with_element(self.id, |e| e.tag.clone())
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.document
            .with_element(self.id, |e| {
                e.attributes
                    .iter()
                    .find(|a| a.name == name)
                    .map(|a| a.value.clone())
            })
            .flatten()
    }

    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        self.document
            .with_element(self.id, |e| set_attribute(&mut e.attributes, name, value));
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> Vec<Attribute> {
        self.document
            .with_element(self.id, |e| e.attributes.clone())
            .unwrap_or_default()
    }

    /// Rendered content (inner markup) of the element
    pub fn content(&self) -> String {
        self.document
            .with_element(self.id, |e| e.content.clone())
            .unwrap_or_default()
    }

    pub fn set_content(&self, content: impl Into<String>) {
        let content = content.into();
        self.document
            .with_element(self.id, |e| e.content = content);
    }

    pub fn css(&self, property: &str) -> Option<String> {
        self.document
            .with_element(self.id, |e| e.styles.get(property).cloned())
            .flatten()
    }

    pub fn set_css(&self, property: impl Into<String>, value: impl Into<String>) {
        let (property, value) = (property.into(), value.into());
        self.document.with_element(self.id, |e| {
            e.styles.insert(property, value);
        });
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef").field("id", &self.id).finish()
    }
}
