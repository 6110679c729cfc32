//! Invoice computation.
//!
//! Billing walks every client → instance → consumption record, keeps the
//! records whose date falls inside the requested range, resolves the
//! instance's configuration and prices each configuration line as
//! `hours × quantity × rate_per_hour`. Records that cannot be resolved are
//! skipped and reported in [`BillingRun::errors`]; they never abort the run.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dates::{self, DateRange};
use crate::model::Catalog;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: u32,
    pub client_nit: String,
    pub client_name: String,
    pub issued_on: NaiveDate,
    pub amount_due: f64,
}

/// One priced configuration line of one consumption record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionDetail {
    pub client_nit: String,
    pub client_name: String,
    pub instance_id: String,
    pub instance_name: String,
    pub category_id: String,
    pub category_name: String,
    pub configuration_id: String,
    pub configuration_name: String,
    pub resource_id: String,
    pub resource_name: String,
    pub resource_metric: String,
    pub consumed_at: NaiveDateTime,
    pub hours: f64,
    pub quantity: f64,
    pub rate_per_hour: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingRun {
    pub invoices: Vec<Invoice>,
    pub details: Vec<ConsumptionDetail>,
    pub errors: Vec<String>,
}

impl BillingRun {
    pub fn details_for<'a>(&'a self, nit: &'a str) -> impl Iterator<Item = &'a ConsumptionDetail> {
        self.details.iter().filter(move |d| d.client_nit == nit)
    }

    pub fn invoice(&self, number: u32) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.invoice_number == number)
    }

    pub fn total(&self) -> f64 {
        self.invoices.iter().map(|i| i.amount_due).sum()
    }
}

/// Compute invoices plus per-line detail rows for every client with billable
/// consumption inside `range`. Invoices are numbered from 1 in client order
/// and dated on the last day of the range.
pub fn bill_detailed(catalog: &Catalog, range: &DateRange) -> BillingRun {
    let mut run = BillingRun::default();

    for client in &catalog.clients {
        let mut amount_due = 0.0;
        let mut billed_lines = 0usize;

        for instance in &client.instances {
            for record in &instance.consumptions {
                let consumed_at = match dates::extract_datetime(&record.recorded_at) {
                    Ok(dt) => dt,
                    Err(e) => {
                        run.errors.push(format!(
                            "consumption of instance '{}' (client NIT '{}') skipped: {}",
                            instance.id, client.nit, e
                        ));
                        continue;
                    }
                };
                if !range.contains(consumed_at.date()) {
                    continue;
                }

                let Some((category, configuration)) =
                    catalog.find_configuration(&instance.configuration_id)
                else {
                    run.errors.push(format!(
                        "configuration '{}' of instance '{}' (client NIT '{}') not found, consumption skipped",
                        instance.configuration_id, instance.id, client.nit
                    ));
                    continue;
                };

                for line in &configuration.resources {
                    let Some(resource) = catalog.find_resource(&line.resource_id) else {
                        run.errors.push(format!(
                            "resource '{}' of configuration '{}' not found, line skipped",
                            line.resource_id, configuration.id
                        ));
                        continue;
                    };

                    let cost = record.hours * line.quantity * resource.rate_per_hour;
                    amount_due += cost;
                    billed_lines += 1;

                    run.details.push(ConsumptionDetail {
                        client_nit: client.nit.clone(),
                        client_name: client.name.clone(),
                        instance_id: instance.id.clone(),
                        instance_name: instance.name.clone(),
                        category_id: category.id.clone(),
                        category_name: category.name.clone(),
                        configuration_id: configuration.id.clone(),
                        configuration_name: configuration.name.clone(),
                        resource_id: resource.id.clone(),
                        resource_name: resource.name.clone(),
                        resource_metric: resource.metric.clone(),
                        consumed_at,
                        hours: record.hours,
                        quantity: line.quantity,
                        rate_per_hour: resource.rate_per_hour,
                        cost,
                    });
                }
            }
        }

        if billed_lines > 0 {
            let invoice_number = run.invoices.len() as u32 + 1;
            debug!(
                invoice_number,
                nit = %client.nit,
                lines = billed_lines,
                amount_due,
                "client invoiced"
            );
            run.invoices.push(Invoice {
                invoice_number,
                client_nit: client.nit.clone(),
                client_name: client.name.clone(),
                issued_on: range.end,
                amount_due,
            });
        }
    }

    info!(
        start = %range.start,
        end = %range.end,
        invoices = run.invoices.len(),
        lines = run.details.len(),
        errors = run.errors.len(),
        "billing run complete"
    );
    run
}

/// Totals-only billing: the same invoices as [`bill_detailed`] without the
/// detail rows.
pub fn bill_summary(catalog: &Catalog, range: &DateRange) -> Vec<Invoice> {
    bill_detailed(catalog, range).invoices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Category, Client, Configuration, ConsumptionRecord, Instance, InstanceState, Resource,
        ResourceKind, ResourceQuantity,
    };

    fn resource(id: &str, name: &str, rate: f64) -> Resource {
        Resource {
            id: id.to_string(),
            name: name.to_string(),
            abbreviation: name.to_string(),
            metric: "units".to_string(),
            kind: ResourceKind::Hardware,
            rate_per_hour: rate,
        }
    }

    fn instance(id: &str, configuration_id: &str, records: &[(f64, &str)]) -> Instance {
        Instance {
            id: id.to_string(),
            configuration_id: configuration_id.to_string(),
            name: format!("instance-{id}"),
            started_on: "01/01/2024".to_string(),
            state: InstanceState::Active,
            ended_on: None,
            consumptions: records
                .iter()
                .map(|(hours, at)| ConsumptionRecord {
                    hours: *hours,
                    recorded_at: at.to_string(),
                })
                .collect(),
        }
    }

    fn client(nit: &str, instances: Vec<Instance>) -> Client {
        Client {
            nit: nit.to_string(),
            name: format!("client-{nit}"),
            username: String::new(),
            password: String::new(),
            address: String::new(),
            email: String::new(),
            instances,
        }
    }

    fn catalog(clients: Vec<Client>) -> Catalog {
        Catalog {
            resources: vec![resource("1", "CPU", 2.0), resource("2", "RAM", 0.5)],
            categories: vec![Category {
                id: "1".to_string(),
                name: "Compute".to_string(),
                description: String::new(),
                workload: String::new(),
                configurations: vec![
                    Configuration {
                        id: "10".to_string(),
                        name: "Small".to_string(),
                        description: String::new(),
                        resources: vec![
                            ResourceQuantity {
                                resource_id: "1".to_string(),
                                quantity: 2.0,
                            },
                            ResourceQuantity {
                                resource_id: "2".to_string(),
                                quantity: 4.0,
                            },
                        ],
                    },
                    Configuration {
                        id: "11".to_string(),
                        name: "Broken".to_string(),
                        description: String::new(),
                        resources: vec![ResourceQuantity {
                            resource_id: "99".to_string(),
                            quantity: 1.0,
                        }],
                    },
                ],
            }],
            clients,
        }
    }

    fn january() -> DateRange {
        DateRange::parse("01/01/2024", "31/01/2024").unwrap()
    }

    #[test]
    fn prices_every_configuration_line() {
        let catalog = catalog(vec![client(
            "100",
            vec![instance("1", "10", &[(3.0, "15/01/2024 10:00")])],
        )]);

        let run = bill_detailed(&catalog, &january());

        // CPU: 3h * 2 * 2.0 = 12, RAM: 3h * 4 * 0.5 = 6
        assert_eq!(run.details.len(), 2);
        assert_eq!(run.details[0].cost, 12.0);
        assert_eq!(run.details[1].cost, 6.0);
        assert_eq!(run.details[0].category_name, "Compute");
        assert_eq!(run.invoices.len(), 1);
        assert_eq!(run.invoices[0].amount_due, 18.0);
        assert_eq!(run.invoices[0].issued_on, january().end);
        assert!(run.errors.is_empty());
    }

    #[test]
    fn filters_records_outside_the_range() {
        let catalog = catalog(vec![client(
            "100",
            vec![instance(
                "1",
                "10",
                &[
                    (1.0, "31/12/2023 23:59"),
                    (1.0, "01/01/2024"),
                    (1.0, "31/01/2024 23:59"),
                    (1.0, "01/02/2024"),
                ],
            )],
        )]);

        let run = bill_detailed(&catalog, &january());
        assert_eq!(run.details.len(), 4);
        assert_eq!(run.invoices[0].amount_due, 12.0);
    }

    #[test]
    fn clients_without_billable_consumption_get_no_invoice() {
        let catalog = catalog(vec![
            client("100", vec![instance("1", "10", &[(1.0, "01/03/2024")])]),
            client("200", vec![instance("2", "10", &[(2.0, "10/01/2024")])]),
        ]);

        let run = bill_detailed(&catalog, &january());
        assert_eq!(run.invoices.len(), 1);
        assert_eq!(run.invoices[0].invoice_number, 1);
        assert_eq!(run.invoices[0].client_nit, "200");
        assert_eq!(run.details_for("200").count(), 2);
        assert_eq!(run.details_for("100").count(), 0);
    }

    #[test]
    fn unresolvable_records_are_collected_not_fatal() {
        let catalog = catalog(vec![client(
            "100",
            vec![
                instance("1", "missing", &[(1.0, "10/01/2024")]),
                instance("2", "11", &[(1.0, "10/01/2024")]),
                instance("3", "10", &[(1.0, "no date"), (1.0, "11/01/2024")]),
            ],
        )]);

        let run = bill_detailed(&catalog, &january());
        assert_eq!(run.errors.len(), 3);
        assert!(run.errors[0].contains("configuration 'missing'"));
        assert!(run.errors[1].contains("resource '99'"));
        assert!(run.errors[2].contains("no date found"));
        assert_eq!(run.invoices.len(), 1);
        assert_eq!(run.invoices[0].amount_due, 6.0);
    }

    #[test]
    fn summary_matches_detailed_totals() {
        let catalog = catalog(vec![
            client("100", vec![instance("1", "10", &[(1.5, "02/01/2024")])]),
            client("200", vec![instance("2", "10", &[(0.5, "03/01/2024")])]),
        ]);

        let detailed = bill_detailed(&catalog, &january());
        let summary = bill_summary(&catalog, &january());
        assert_eq!(summary, detailed.invoices);
        assert_eq!(summary[1].invoice_number, 2);
        assert_eq!(detailed.total(), 12.0);
        assert_eq!(detailed.invoice(2).map(|i| i.client_nit.as_str()), Some("200"));
        assert!(detailed.invoice(3).is_none());
    }
}
