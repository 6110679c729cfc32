//! XML codec for the configuration document and consumption batches.
//!
//! The on-disk layout mirrors the upload format, so a configuration file can
//! be stored as-is after parsing. Element and attribute names follow the
//! upload files (`archivoConfiguraciones`, `listaRecursos`, ...); the
//! `*Xml` structs below exist only to map them onto [`crate::model`].

use quick_xml::se::Serializer;
use serde::{Deserialize, Serialize};

use crate::errors::DocumentError;
use crate::model::{
    Catalog, Category, Client, Configuration, ConsumptionRecord, Instance, Resource,
    ResourceQuantity,
};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// One `<consumo>` entry from a consumption batch, as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionEntry {
    pub nit: String,
    pub instance_id: String,
    pub hours: Option<String>,
    pub recorded_at: Option<String>,
}

/// Parse a configuration document into a [`Catalog`].
pub fn parse_catalog(xml: &str) -> Result<Catalog, DocumentError> {
    let document: CatalogXml =
        quick_xml::de::from_str(xml).map_err(|e| DocumentError::Malformed(e.to_string()))?;
    Catalog::try_from(document)
}

/// Serialize a [`Catalog`] back into the configuration document format.
pub fn render_catalog(catalog: &Catalog) -> Result<String, DocumentError> {
    let document = CatalogXml::from(catalog);
    let mut buffer = String::from(XML_DECLARATION);
    let mut serializer = Serializer::new(&mut buffer);
    serializer.indent(' ', 2);
    document
        .serialize(serializer)
        .map_err(|e| DocumentError::Serialization(e.to_string()))?;
    buffer.push('\n');
    Ok(buffer)
}

/// Parse a `listadoConsumos` batch.
pub fn parse_consumption_batch(xml: &str) -> Result<Vec<ConsumptionEntry>, DocumentError> {
    let batch: ConsumptionBatchXml =
        quick_xml::de::from_str(xml).map_err(|e| DocumentError::Malformed(e.to_string()))?;

    Ok(batch
        .entries
        .into_iter()
        .map(|entry| ConsumptionEntry {
            nit: entry.nit.trim().to_string(),
            instance_id: entry.instance_id.trim().to_string(),
            hours: entry.hours,
            recorded_at: entry.recorded_at,
        })
        .collect())
}

/// Lenient decimal parsing: surrounding whitespace is ignored and a decimal
/// comma is accepted. Non-finite values are rejected.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn required_decimal(field: &'static str, text: &str) -> Result<f64, DocumentError> {
    parse_decimal(text).ok_or_else(|| DocumentError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}

fn trimmed(text: String) -> String {
    text.trim().to_string()
}

// ---------------------------------------------------------------------------
// Wire structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "archivoConfiguraciones")]
struct CatalogXml {
    #[serde(rename = "listaRecursos", default)]
    resources: ResourceListXml,
    #[serde(rename = "listaCategorias", default)]
    categories: CategoryListXml,
    #[serde(rename = "listaClientes", default)]
    clients: ClientListXml,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ResourceListXml {
    #[serde(rename = "recurso", default)]
    items: Vec<ResourceXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ResourceXml {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "nombre", default)]
    name: String,
    #[serde(rename = "abreviatura", default)]
    abbreviation: String,
    #[serde(rename = "metrica", default)]
    metric: String,
    #[serde(rename = "tipo", default)]
    kind: String,
    #[serde(rename = "valorXhora", default)]
    rate_per_hour: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CategoryListXml {
    #[serde(rename = "categoria", default)]
    items: Vec<CategoryXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CategoryXml {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "nombre", default)]
    name: String,
    #[serde(rename = "descripcion", default)]
    description: String,
    #[serde(rename = "cargaTrabajo", default)]
    workload: String,
    #[serde(rename = "listaConfiguraciones", default)]
    configurations: ConfigurationListXml,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigurationListXml {
    #[serde(rename = "configuracion", default)]
    items: Vec<ConfigurationXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigurationXml {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "nombre", default)]
    name: String,
    #[serde(rename = "descripcion", default)]
    description: String,
    #[serde(rename = "recursosConfiguracion", default)]
    resources: ResourceQuantityListXml,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ResourceQuantityListXml {
    #[serde(rename = "recurso", default)]
    items: Vec<ResourceQuantityXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ResourceQuantityXml {
    #[serde(rename = "@id", default)]
    resource_id: String,
    #[serde(rename = "$text", default)]
    quantity: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ClientListXml {
    #[serde(rename = "cliente", default)]
    items: Vec<ClientXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ClientXml {
    #[serde(rename = "@nit", default)]
    nit: String,
    #[serde(rename = "nombre", default)]
    name: String,
    #[serde(rename = "usuario", default)]
    username: String,
    #[serde(rename = "clave", default)]
    password: String,
    #[serde(rename = "direccion", default)]
    address: String,
    #[serde(rename = "correoElectronico", default)]
    email: String,
    #[serde(rename = "listaInstancias", default)]
    instances: InstanceListXml,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InstanceListXml {
    #[serde(rename = "instancia", default)]
    items: Vec<InstanceXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InstanceXml {
    #[serde(rename = "@id", default)]
    id: String,
    #[serde(rename = "idConfiguracion", default)]
    configuration_id: String,
    #[serde(rename = "nombre", default)]
    name: String,
    #[serde(rename = "fechaInicio", default)]
    started_on: String,
    #[serde(rename = "estado", default)]
    state: String,
    #[serde(
        rename = "fechaFinal",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    ended_on: Option<String>,
    #[serde(
        rename = "listaConsumos",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    consumptions: Option<ConsumptionListXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConsumptionListXml {
    #[serde(rename = "consumoRegistrado", default)]
    items: Vec<RecordedConsumptionXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordedConsumptionXml {
    #[serde(rename = "tiempo", default)]
    hours: String,
    #[serde(rename = "fechaHora", default)]
    recorded_at: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConsumptionBatchXml {
    #[serde(rename = "consumo", default)]
    entries: Vec<ConsumptionXml>,
}

#[derive(Debug, Default, Deserialize)]
struct ConsumptionXml {
    #[serde(rename = "@nitCliente", default)]
    nit: String,
    #[serde(rename = "@idInstancia", default)]
    instance_id: String,
    #[serde(rename = "tiempo", default)]
    hours: Option<String>,
    #[serde(rename = "fechaHora", default)]
    recorded_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire -> model
// ---------------------------------------------------------------------------

impl TryFrom<CatalogXml> for Catalog {
    type Error = DocumentError;

    fn try_from(document: CatalogXml) -> Result<Self, Self::Error> {
        let resources = document
            .resources
            .items
            .into_iter()
            .map(|r| {
                Ok(Resource {
                    rate_per_hour: required_decimal("valorXhora", &r.rate_per_hour)?,
                    id: trimmed(r.id),
                    name: trimmed(r.name),
                    abbreviation: trimmed(r.abbreviation),
                    metric: trimmed(r.metric),
                    kind: trimmed(r.kind).into(),
                })
            })
            .collect::<Result<Vec<_>, DocumentError>>()?;

        let categories = document
            .categories
            .items
            .into_iter()
            .map(category_from_xml)
            .collect::<Result<Vec<_>, DocumentError>>()?;

        let clients = document
            .clients
            .items
            .into_iter()
            .map(client_from_xml)
            .collect::<Result<Vec<_>, DocumentError>>()?;

        Ok(Catalog {
            resources,
            categories,
            clients,
        })
    }
}

fn category_from_xml(category: CategoryXml) -> Result<Category, DocumentError> {
    let configurations = category
        .configurations
        .items
        .into_iter()
        .map(|c| {
            let resources = c
                .resources
                .items
                .into_iter()
                .map(|line| {
                    Ok(ResourceQuantity {
                        quantity: required_decimal("recurso", &line.quantity)?,
                        resource_id: trimmed(line.resource_id),
                    })
                })
                .collect::<Result<Vec<_>, DocumentError>>()?;
            Ok(Configuration {
                id: trimmed(c.id),
                name: trimmed(c.name),
                description: trimmed(c.description),
                resources,
            })
        })
        .collect::<Result<Vec<_>, DocumentError>>()?;

    Ok(Category {
        id: trimmed(category.id),
        name: trimmed(category.name),
        description: trimmed(category.description),
        workload: trimmed(category.workload),
        configurations,
    })
}

fn client_from_xml(client: ClientXml) -> Result<Client, DocumentError> {
    let instances = client
        .instances
        .items
        .into_iter()
        .map(|i| {
            let consumptions = i
                .consumptions
                .map(|list| list.items)
                .unwrap_or_default()
                .into_iter()
                .map(|record| {
                    Ok(ConsumptionRecord {
                        hours: required_decimal("tiempo", &record.hours)?,
                        recorded_at: trimmed(record.recorded_at),
                    })
                })
                .collect::<Result<Vec<_>, DocumentError>>()?;
            Ok(Instance {
                id: trimmed(i.id),
                configuration_id: trimmed(i.configuration_id),
                name: trimmed(i.name),
                started_on: trimmed(i.started_on),
                state: trimmed(i.state).into(),
                ended_on: i.ended_on.map(trimmed).filter(|s| !s.is_empty()),
                consumptions,
            })
        })
        .collect::<Result<Vec<_>, DocumentError>>()?;

    Ok(Client {
        nit: trimmed(client.nit),
        name: trimmed(client.name),
        username: trimmed(client.username),
        password: trimmed(client.password),
        address: trimmed(client.address),
        email: trimmed(client.email),
        instances,
    })
}

// ---------------------------------------------------------------------------
// Model -> wire
// ---------------------------------------------------------------------------

impl From<&Catalog> for CatalogXml {
    fn from(catalog: &Catalog) -> Self {
        CatalogXml {
            resources: ResourceListXml {
                items: catalog
                    .resources
                    .iter()
                    .map(|r| ResourceXml {
                        id: r.id.clone(),
                        name: r.name.clone(),
                        abbreviation: r.abbreviation.clone(),
                        metric: r.metric.clone(),
                        kind: r.kind.as_str().to_string(),
                        rate_per_hour: r.rate_per_hour.to_string(),
                    })
                    .collect(),
            },
            categories: CategoryListXml {
                items: catalog.categories.iter().map(category_to_xml).collect(),
            },
            clients: ClientListXml {
                items: catalog.clients.iter().map(client_to_xml).collect(),
            },
        }
    }
}

fn category_to_xml(category: &Category) -> CategoryXml {
    CategoryXml {
        id: category.id.clone(),
        name: category.name.clone(),
        description: category.description.clone(),
        workload: category.workload.clone(),
        configurations: ConfigurationListXml {
            items: category
                .configurations
                .iter()
                .map(|c| ConfigurationXml {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    description: c.description.clone(),
                    resources: ResourceQuantityListXml {
                        items: c
                            .resources
                            .iter()
                            .map(|line| ResourceQuantityXml {
                                resource_id: line.resource_id.clone(),
                                quantity: line.quantity.to_string(),
                            })
                            .collect(),
                    },
                })
                .collect(),
        },
    }
}

fn client_to_xml(client: &Client) -> ClientXml {
    ClientXml {
        nit: client.nit.clone(),
        name: client.name.clone(),
        username: client.username.clone(),
        password: client.password.clone(),
        address: client.address.clone(),
        email: client.email.clone(),
        instances: InstanceListXml {
            items: client
                .instances
                .iter()
                .map(|i| InstanceXml {
                    id: i.id.clone(),
                    configuration_id: i.configuration_id.clone(),
                    name: i.name.clone(),
                    started_on: i.started_on.clone(),
                    state: i.state.as_str().to_string(),
                    ended_on: i.ended_on.clone(),
                    consumptions: (!i.consumptions.is_empty()).then(|| ConsumptionListXml {
                        items: i
                            .consumptions
                            .iter()
                            .map(|record| RecordedConsumptionXml {
                                hours: record.hours.to_string(),
                                recorded_at: record.recorded_at.clone(),
                            })
                            .collect(),
                    }),
                })
                .collect(),
        },
    }
}
