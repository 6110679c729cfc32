//! In-memory projection of the system-of-record document.
//!
//! The document holds three collections: billable resources, categories
//! (each with priced configurations) and clients (each with instances and
//! their logged consumption). Identifiers are kept as the strings found in
//! the document; lookups compare them verbatim.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Hardware,
    Software,
    Other(String),
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Hardware => "Hardware",
            ResourceKind::Software => "Software",
            ResourceKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ResourceKind {
    fn from(value: String) -> Self {
        let kind = value.trim();
        if kind.eq_ignore_ascii_case("hardware") {
            ResourceKind::Hardware
        } else if kind.eq_ignore_ascii_case("software") {
            ResourceKind::Software
        } else {
            ResourceKind::Other(value)
        }
    }
}

impl From<ResourceKind> for String {
    fn from(value: ResourceKind) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceState {
    Active,
    Cancelled,
    Other(String),
}

impl InstanceState {
    pub fn as_str(&self) -> &str {
        match self {
            InstanceState::Active => "Vigente",
            InstanceState::Cancelled => "Cancelada",
            InstanceState::Other(state) => state,
        }
    }
}

impl From<String> for InstanceState {
    fn from(value: String) -> Self {
        let state = value.trim();
        if state.eq_ignore_ascii_case("vigente") {
            InstanceState::Active
        } else if state.eq_ignore_ascii_case("cancelada") {
            InstanceState::Cancelled
        } else {
            InstanceState::Other(value)
        }
    }
}

impl From<InstanceState> for String {
    fn from(value: InstanceState) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub metric: String,
    pub kind: ResourceKind,
    pub rate_per_hour: f64,
}

/// One line of a configuration: how many units of a resource it bundles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceQuantity {
    pub resource_id: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub id: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<ResourceQuantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub workload: String,
    pub configurations: Vec<Configuration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub hours: f64,
    /// Free text as received; the date inside it is extracted at billing time.
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub configuration_id: String,
    pub name: String,
    pub started_on: String,
    pub state: InstanceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_on: Option<String>,
    #[serde(default)]
    pub consumptions: Vec<ConsumptionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub nit: String,
    pub name: String,
    pub username: String,
    // never leaves the backend in JSON form
    #[serde(default, skip_serializing)]
    pub password: String,
    pub address: String,
    pub email: String,
    pub instances: Vec<Instance>,
}

impl Client {
    pub fn find_instance(&self, id: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn find_instance_mut(&mut self, id: &str) -> Option<&mut Instance> {
        self.instances.iter_mut().find(|i| i.id == id)
    }
}

/// The whole system state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub resources: Vec<Resource>,
    pub categories: Vec<Category>,
    pub clients: Vec<Client>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn find_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Resolve a configuration id by scanning every category, returning the
    /// owning category alongside it.
    pub fn find_configuration(&self, id: &str) -> Option<(&Category, &Configuration)> {
        self.categories.iter().find_map(|category| {
            category
                .configurations
                .iter()
                .find(|c| c.id == id)
                .map(|configuration| (category, configuration))
        })
    }

    pub fn find_client(&self, nit: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.nit == nit)
    }

    pub fn find_client_mut(&mut self, nit: &str) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.nit == nit)
    }

    pub fn instance_count(&self) -> usize {
        self.clients.iter().map(|c| c.instances.len()).sum()
    }

    /// One past the highest numeric resource id; non-numeric ids are ignored.
    /// `None` once the highest id is `u64::MAX`.
    pub fn next_resource_id(&self) -> Option<u64> {
        self.resources
            .iter()
            .filter_map(|r| r.id.trim().parse::<u64>().ok())
            .max()
            .map_or(Some(1), |max| max.checked_add(1))
    }
}
