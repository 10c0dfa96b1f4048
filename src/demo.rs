// Demo mode: scripted edit session against a sample positions page
//
// Walks through what a user does on a page with editable fields:
// - hovers a marker (highlight on, highlight off)
// - clicks it, types a new value, confirms or cancels
// - waits for the backend outcome (saved or rejected)
// - adds a marker after installation and registers it explicitly
//
// Updates go to the REST API when `api_url` is configured, otherwise to an
// in-memory store that accepts everything.
//
// Run with: cargo run -- demo --value "IBM Common Stock"

use anyhow::{Context, Result};
use og_editable::config::Config;
use og_editable::dialog::DialogSnapshot;
use og_editable::resource::PutRecord;
use og_editable::{
    CurrentRoute, Document, EditableConfig, EditableFieldController, Element, ElementId,
    MemoryResource, PromptDialog, ResourceRegistry, RestClient, UpdateResult, EDITABLE_ATTR,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

/// How often to look for an error dialog while waiting on an update
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Demo settings from the command line
#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub route: String,
    pub value: String,
    pub cancel: bool,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            route: "/positions".to_string(),
            value: "IBM Common Stock".to_string(),
            cancel: false,
        }
    }
}

/// How an edit ended
#[derive(Debug)]
enum Outcome {
    Saved(UpdateResult),
    Rejected(String),
    TimedOut,
}

/// What a session did
#[derive(Debug, Default)]
pub struct DemoSummary {
    pub saved: usize,
    pub rejected: usize,
    /// Updates accepted by the in-memory store; empty when sending to REST
    pub stored: Vec<PutRecord>,
}

impl DemoSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Saved(_) => self.saved += 1,
            Outcome::Rejected(_) => self.rejected += 1,
            Outcome::TimedOut => {}
        }
    }
}

/// Page with a heading, a position row and a portfolio node
fn sample_document() -> Document {
    let doc = Document::new();
    doc.append(Element::new("h1").with_content("Positions"));
    doc.append(
        Element::new("span")
            .with_attr("data-og-id", "DbPos~1001")
            .with_attr(EDITABLE_ATTR, "name")
            .with_content("IBM Equity"),
    );
    doc.append(
        Element::new("td")
            .with_attr("data-og-id", "DbPos~1001")
            .with_attr(EDITABLE_ATTR, "quantity")
            .with_content("1500"),
    );
    doc.append(
        Element::new("span")
            .with_attr("data-og-id", "DbPrt~2001")
            .with_attr("data-og-node", "DbPrt~2001-n1")
            .with_attr(EDITABLE_ATTR, "name")
            .with_content("Equity Book"),
    );
    doc
}

fn build_registry(config: &Config) -> Result<(ResourceRegistry, Option<Arc<MemoryResource>>)> {
    match &config.api_url {
        Some(url) => {
            let client = RestClient::new(url, config.request_timeout())
                .with_context(|| format!("Cannot use API url {}", url))?;
            println!("Sending updates to {}", client.api_url());
            Ok((
                client.registry(config.resources.iter().map(String::as_str)),
                None,
            ))
        }
        None => {
            println!("No api_url configured; updates stay in memory");
            let memory = Arc::new(MemoryResource::new());
            let mut registry = ResourceRegistry::new();
            for name in &config.resources {
                registry.register(name.clone(), memory.clone());
            }
            Ok((registry, Some(memory)))
        }
    }
}

/// Run the scripted session
pub async fn run_demo(config: &Config, options: DemoOptions) -> Result<DemoSummary> {
    let document = sample_document();
    let dialogs = Arc::new(PromptDialog::new());
    let route = Arc::new(CurrentRoute::new(options.route.clone()));
    let (registry, memory) = build_registry(config)?;

    let controller =
        EditableFieldController::new(document.clone(), dialogs.clone(), route, registry)
            .with_highlight(config.highlight.style());

    let (result_tx, mut result_rx) = mpsc::unbounded_channel();
    let installation = controller.install(EditableConfig::new(move |result| {
        let _ = result_tx.send(result);
    }))?;

    let markers = installation.markers();
    println!("Route {}: {} editable field(s)", options.route, markers.len());
    let first = *markers
        .first()
        .context("Sample page has no editable fields")?;

    let mut summary = DemoSummary::default();
    hover(&document, first);
    edit(&document, &dialogs, first, &options.value, options.cancel);
    if !options.cancel {
        let outcome = await_outcome(&dialogs, &mut result_rx, config.request_timeout()).await;
        summary.record(&outcome);
        report(&document, first, &options.value, outcome);
    }

    // Markers added after install are only live once registered
    let late = document.append(
        Element::new("td")
            .with_attr("data-og-id", "DbPos~1002")
            .with_attr(EDITABLE_ATTR, "quantity")
            .with_content("200"),
    );
    document.click(late);
    println!(
        "Unregistered late field clicked: dialog open = {}",
        dialogs.is_open()
    );
    installation.register_marker(late);
    edit(&document, &dialogs, late, "250", false);
    let outcome = await_outcome(&dialogs, &mut result_rx, config.request_timeout()).await;
    summary.record(&outcome);
    report(&document, late, "250", outcome);

    if let Some(memory) = memory {
        println!("In-memory store received {} update(s)", memory.put_count());
        summary.stored = memory.puts();
        for record in &summary.stored {
            println!("  {} {:?}", record.received_at.to_rfc3339(), record.fields);
        }
    }
    Ok(summary)
}

fn hover(document: &Document, id: ElementId) {
    let Some(element) = document.element(id) else {
        return;
    };
    document.hover_enter(id);
    println!(
        "Hover {}: background {}",
        id,
        element.css("background-color").unwrap_or_default()
    );
    document.hover_leave(id);
    println!(
        "Leave {}: background {}",
        id,
        element.css("background-color").unwrap_or_default()
    );
}

fn edit(document: &Document, dialogs: &PromptDialog, id: ElementId, value: &str, cancel: bool) {
    document.click(id);
    let Some(DialogSnapshot::Input { title, fields, .. }) = dialogs.active() else {
        println!("Click on {} opened no dialog", id);
        return;
    };
    println!("Dialog: {}", title);

    if let Some(field) = fields.first() {
        dialogs.set_field(&field.id, value);
    }
    let button = if cancel { "Cancel" } else { "OK" };
    println!("Typed {:?}, pressed {}", value, button);
    dialogs.press(button);
}

async fn await_outcome(
    dialogs: &PromptDialog,
    results: &mut mpsc::UnboundedReceiver<UpdateResult>,
    timeout: Duration,
) -> Outcome {
    let deadline = Instant::now() + timeout;
    loop {
        // Errors never reach the handler; they show up as an error dialog
        if let Some(DialogSnapshot::Error { message }) = dialogs.active() {
            dialogs.dismiss();
            return Outcome::Rejected(message);
        }
        if Instant::now() >= deadline {
            return Outcome::TimedOut;
        }
        tokio::select! {
            Some(result) = results.recv() => return Outcome::Saved(result),
            _ = sleep(POLL_INTERVAL) => {}
        }
    }
}

fn report(document: &Document, id: ElementId, value: &str, outcome: Outcome) {
    match outcome {
        Outcome::Saved(result) => {
            // The page re-renders the field with the accepted value
            if let Some(element) = document.element(id) {
                element.set_content(value);
            }
            tracing::info!(element = %id, "Edit saved");
            println!("Saved: {}", result.data);
        }
        Outcome::Rejected(message) => println!("Rejected: {}", message),
        Outcome::TimedOut => println!("No answer from the backend"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_document_markers() {
        let doc = sample_document();
        let markers = doc.query_by_attribute(EDITABLE_ATTR);
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].content(), "IBM Equity");
    }

    #[tokio::test]
    async fn test_demo_saves_both_edits_to_memory_store() {
        let config = Config::default();
        let summary = run_demo(&config, DemoOptions::default()).await.unwrap();

        assert_eq!(summary.saved, 2);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.stored.len(), 2);

        let first = &summary.stored[0].fields;
        assert_eq!(first.get("id").map(String::as_str), Some("DbPos~1001"));
        assert_eq!(first.get("name").map(String::as_str), Some("IBM Common Stock"));
        assert!(!first.contains_key("editable"));

        let late = &summary.stored[1].fields;
        assert_eq!(late.get("id").map(String::as_str), Some("DbPos~1002"));
        assert_eq!(late.get("quantity").map(String::as_str), Some("250"));
    }

    #[tokio::test]
    async fn test_demo_cancel_path() {
        let config = Config::default();
        let options = DemoOptions {
            cancel: true,
            ..DemoOptions::default()
        };
        let summary = run_demo(&config, options).await.unwrap();

        // Only the late marker's edit is confirmed
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.stored.len(), 1);
        let fields = &summary.stored[0].fields;
        assert_eq!(fields.get("id").map(String::as_str), Some("DbPos~1002"));
        assert_eq!(fields.get("quantity").map(String::as_str), Some("250"));
        assert!(!fields.contains_key("name"));
    }
}
