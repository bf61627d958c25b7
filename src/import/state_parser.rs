use anyhow::{Context, Result};
use serde_json::Value;

/// One resource block of a Terraform state file
#[derive(Debug, Clone, PartialEq)]
pub struct StateResource {
    pub resource_type: Option<String>,
    pub name: Option<String>,
    pub instances: Vec<StateInstance>,
}

/// One instance of a resource; only the `id` attribute is kept
#[derive(Debug, Clone, PartialEq)]
pub struct StateInstance {
    pub id: Option<String>,
}

/// Parsed state file: resources in file order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateFileRecord {
    pub resources: Vec<StateResource>,
}

/// Parses Terraform state files emitted by the import tool
///
/// Fields that are missing or not strings are recorded as `None`, except
/// numeric ids which are kept in their JSON form. Deciding what to skip is
/// left to the caller.
pub struct StateParser;

impl StateParser {
    /// Parse state JSON
    pub fn parse(content: &str) -> Result<StateFileRecord> {
        let state: Value =
            serde_json::from_str(content).context("Failed to parse state file as JSON")?;

        if !state.is_object() {
            anyhow::bail!("State file is not a JSON object");
        }

        Ok(StateFileRecord {
            resources: Self::extract_resources(&state),
        })
    }

    /// Extract resources from state
    fn extract_resources(state: &Value) -> Vec<StateResource> {
        let Some(state_resources) = state.get("resources").and_then(|r| r.as_array()) else {
            return Vec::new();
        };

        state_resources
            .iter()
            .map(|resource| {
                let instances = resource
                    .get("instances")
                    .and_then(|i| i.as_array())
                    .map(|instances| {
                        instances
                            .iter()
                            .map(|instance| StateInstance {
                                id: id_field(instance.get("attributes")),
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                StateResource {
                    resource_type: string_field(Some(resource), "type"),
                    name: string_field(Some(resource), "name"),
                    instances,
                }
            })
            .collect()
    }
}

fn string_field(value: Option<&Value>, key: &str) -> Option<String> {
    value
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Some providers store numeric ids; those render as their JSON number text
fn id_field(attributes: Option<&Value>) -> Option<String> {
    match attributes.and_then(|v| v.get("id"))? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
