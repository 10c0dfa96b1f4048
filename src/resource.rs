// Resource clients - where confirmed edits are sent
//
// An edit becomes an `EditRequestPayload`: the contextual fields of the
// clicked element plus the new value, and a transient handler that receives
// the server's `UpdateResult`. Clients are looked up by resource name in an
// explicit `ResourceRegistry` injected into the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives the outcome of an update
pub type ResultHandler = Arc<dyn Fn(UpdateResult) + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Update Result
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a `put`, as reported by the backend
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct UpdateResult {
    /// Failure flag; the backend may send a bool, a number or a string
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub error: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl UpdateResult {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            error: false,
            message: String::new(),
            data,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: serde_json::Value::Null,
        }
    }

    /// Interpret an arbitrary JSON response body
    ///
    /// Objects carrying `error`/`message` are read as results; anything else
    /// is a successful result wrapping the body.
    pub fn from_value(value: serde_json::Value) -> Self {
        let looks_like_result = value
            .as_object()
            .is_some_and(|o| o.contains_key("error") || o.contains_key("message"));
        if looks_like_result {
            if let Ok(result) = serde_json::from_value::<UpdateResult>(value.clone()) {
                return result;
            }
        }
        Self::ok(value)
    }
}

fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty() && s != "false" && s != "0",
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit Request Payload
// ─────────────────────────────────────────────────────────────────────────────

/// Field values submitted for one edit, plus the result handler
///
/// Serializes as a flat JSON object of the fields; the handler is never sent.
#[derive(Clone, Default, Serialize)]
pub struct EditRequestPayload {
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
    #[serde(skip)]
    handler: Option<ResultHandler>,
}

impl EditRequestPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn set_handler(&mut self, handler: ResultHandler) {
        self.handler = Some(handler);
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Deliver the result to the handler, consuming the payload
    pub fn complete(self, result: UpdateResult) {
        match self.handler {
            Some(handler) => handler(result),
            None => tracing::debug!(error = result.error, "Update finished without a handler"),
        }
    }
}

impl fmt::Debug for EditRequestPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditRequestPayload")
            .field("fields", &self.fields)
            .field("handler", &self.handler.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resource Client + Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Update-capable handle for one backend resource
pub trait ResourceClient: Send + Sync {
    /// Submit the payload; the outcome goes to `payload`'s handler,
    /// possibly from another thread at a later time
    fn put(&self, payload: EditRequestPayload);
}

/// Explicit mapping from resource names to clients
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    clients: HashMap<String, Arc<dyn ResourceClient>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, client: Arc<dyn ResourceClient>) {
        let name = name.into();
        tracing::debug!(resource = %name, "Registered resource client");
        self.clients.insert(name, client);
    }

    pub fn with(mut self, name: impl Into<String>, client: Arc<dyn ResourceClient>) -> Self {
        self.register(name, client);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ResourceClient>> {
        self.clients.get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.names())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory resource
// ─────────────────────────────────────────────────────────────────────────────

/// One accepted update
#[derive(Debug, Clone, PartialEq)]
pub struct PutRecord {
    pub fields: BTreeMap<String, String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
    objects: BTreeMap<String, BTreeMap<String, String>>,
    puts: Vec<PutRecord>,
    failure: Option<String>,
}

/// Resource that applies updates to an in-process object store
///
/// Objects are keyed by the payload's `id` field, falling back to `node`.
/// Results are delivered synchronously from `put`.
#[derive(Default)]
pub struct MemoryResource {
    state: Mutex<MemoryState>,
}

impl MemoryResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject every following put with this message
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    pub fn clear_failure(&self) {
        self.lock().failure = None;
    }

    /// Updates accepted so far, oldest first
    pub fn puts(&self) -> Vec<PutRecord> {
        self.lock().puts.clone()
    }

    pub fn put_count(&self) -> usize {
        self.lock().puts.len()
    }

    /// Current state of a stored object
    pub fn object(&self, key: &str) -> Option<BTreeMap<String, String>> {
        self.lock().objects.get(key).cloned()
    }

    fn object_key(fields: &BTreeMap<String, String>) -> String {
        fields
            .get("id")
            .or_else(|| fields.get("node"))
            .cloned()
            .unwrap_or_default()
    }
}

impl ResourceClient for MemoryResource {
    fn put(&self, payload: EditRequestPayload) {
        let result = {
            let mut state = self.lock();
            match state.failure.clone() {
                Some(message) => UpdateResult::failed(message),
                None => {
                    let fields = payload.fields().clone();
                    let received_at = Utc::now();
                    let object = state.objects.entry(Self::object_key(&fields)).or_default();
                    object.extend(fields.clone());
                    let data = serde_json::json!({
                        "object": object.clone(),
                        "updated_at": received_at.to_rfc3339(),
                    });
                    state.puts.push(PutRecord {
                        fields,
                        received_at,
                    });
                    UpdateResult::ok(data)
                }
            }
        };

        if result.error {
            tracing::warn!(message = %result.message, "In-memory update rejected");
        }
        payload.complete(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn capture() -> (ResultHandler, Arc<Mutex<Vec<UpdateResult>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: ResultHandler = Arc::new(move |result: UpdateResult| sink.lock().unwrap().push(result));
        (handler, seen)
    }

    #[test]
    fn test_update_result_truthy_error_flag() {
        let cases = [
            (json!({"error": true, "message": "conflict"}), true),
            (json!({"error": 1, "message": "x"}), true),
            (json!({"error": "yes"}), true),
            (json!({"error": 0}), false),
            (json!({"error": null}), false),
            (json!({"error": "false"}), false),
            (json!({"message": "saved"}), false),
        ];
        for (body, expected) in cases {
            let result: UpdateResult = serde_json::from_value(body.clone()).unwrap();
            assert_eq!(result.error, expected, "body: {}", body);
        }
    }

    #[test]
    fn test_update_result_from_plain_body() {
        let result = UpdateResult::from_value(json!({"id": "DbPos~1"}));
        assert!(!result.error);
        assert_eq!(result.data, json!({"id": "DbPos~1"}));

        let result = UpdateResult::from_value(json!({"error": true, "message": "conflict"}));
        assert!(result.error);
        assert_eq!(result.message, "conflict");
    }

    #[test]
    fn test_payload_serializes_without_handler() {
        let (handler, _) = capture();
        let mut payload = EditRequestPayload::new();
        payload.insert("node", "n1");
        payload.insert("name", "Bob");
        payload.set_handler(handler);

        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body, json!({"node": "n1", "name": "Bob"}));
    }

    #[test]
    fn test_payload_complete_invokes_handler() {
        let (handler, seen) = capture();
        let mut payload = EditRequestPayload::new();
        payload.set_handler(handler);

        payload.complete(UpdateResult::failed("nope"));
        assert_eq!(seen.lock().unwrap()[0].message, "nope");

        // No handler attached: nothing to call, nothing to panic about
        EditRequestPayload::new().complete(UpdateResult::ok(json!(null)));
    }

    #[test]
    fn test_registry_lookup() {
        let memory = Arc::new(MemoryResource::new());
        let registry = ResourceRegistry::new()
            .with("positions", memory.clone())
            .with("portfolios", memory);

        assert!(registry.get("positions").is_some());
        assert!(registry.get("trades").is_none());
        assert_eq!(registry.names(), vec!["portfolios", "positions"]);
    }

    #[test]
    fn test_memory_resource_applies_updates() {
        let memory = MemoryResource::new();
        let (handler, seen) = capture();

        let mut payload = EditRequestPayload::new();
        payload.insert("id", "DbPos~1");
        payload.insert("quantity", "150");
        payload.set_handler(handler.clone());
        memory.put(payload);

        let mut payload = EditRequestPayload::new();
        payload.insert("id", "DbPos~1");
        payload.insert("name", "IBM");
        payload.set_handler(handler);
        memory.put(payload);

        let object = memory.object("DbPos~1").unwrap();
        assert_eq!(object.get("quantity").map(String::as_str), Some("150"));
        assert_eq!(object.get("name").map(String::as_str), Some("IBM"));
        assert_eq!(memory.put_count(), 2);

        let results = seen.lock().unwrap();
        assert!(results.iter().all(|r| !r.error));
        assert_eq!(results[1].data["object"]["quantity"], "150");
    }

    #[test]
    fn test_memory_resource_scripted_failure() {
        let memory = MemoryResource::new();
        memory.fail_with("conflict");
        let (handler, seen) = capture();

        let mut payload = EditRequestPayload::new();
        payload.insert("node", "n1");
        payload.set_handler(handler);
        memory.put(payload);

        assert_eq!(memory.put_count(), 0);
        assert_eq!(seen.lock().unwrap()[0], UpdateResult::failed("conflict"));

        memory.clear_failure();
        let (handler, seen) = capture();
        let mut payload = EditRequestPayload::new();
        payload.insert("node", "n1");
        payload.insert("name", "Equity Book");
        payload.set_handler(handler);
        memory.put(payload);

        assert_eq!(memory.put_count(), 1);
        assert!(!seen.lock().unwrap()[0].error);
        assert_eq!(
            memory.object("n1").unwrap().get("name").map(String::as_str),
            Some("Equity Book")
        );
    }
}
