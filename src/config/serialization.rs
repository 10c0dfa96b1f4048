//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

/// TOML literal for a string, escaped as needed
fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_owned()).to_string()
}

fn toml_string_array(values: &[String]) -> String {
    toml::Value::Array(values.iter().cloned().map(toml::Value::String).collect()).to_string()
}

impl Config {
    /// Render the config as a commented TOML file
    pub fn to_toml(&self) -> String {
        let api_url = match &self.api_url {
            Some(url) => format!("api_url = {}", toml_string(url)),
            None => "# api_url = \"http://localhost:8080/jax\"".to_string(),
        };

        format!(
            r#"# og-editable configuration

# Base URL of the REST API. Edits are sent as PUT {{api_url}}/{{resource}}.
# Leave unset to keep edits in memory (demo mode).
{api_url}

# Timeout for a single update request
request_timeout_secs = {timeout}

# Route the session starts on; the resource is the route without its leading "/"
route = {route}

# Resources served by the REST API
resources = {resources}

# Hover highlight for editable fields
[highlight]
edit_color = {edit_color}
idle_color = {idle_color}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level}
# JSON file logging (in addition to stderr)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir}
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = {log_file_prefix}
"#,
            api_url = api_url,
            timeout = self.request_timeout_secs,
            route = toml_string(&self.route),
            resources = toml_string_array(&self.resources),
            edit_color = toml_string(&self.highlight.edit_color),
            idle_color = toml_string(&self.highlight.idle_color),
            log_level = toml_string(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = toml_string(&self.logging.file_dir.to_string_lossy()),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = toml_string(&self.logging.file_prefix),
        )
    }
}
