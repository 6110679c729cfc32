use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::billing::ConsumptionDetail;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueLine {
    pub name: String,
    pub revenue: f64,
}

/// Revenue aggregated per resource and per category, highest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesAnalysis {
    pub by_resource: Vec<RevenueLine>,
    pub by_category: Vec<RevenueLine>,
    pub total: f64,
}

impl SalesAnalysis {
    pub fn from_details(details: &[ConsumptionDetail]) -> Self {
        let mut by_resource: HashMap<&str, f64> = HashMap::new();
        let mut by_category: HashMap<&str, f64> = HashMap::new();

        for detail in details {
            *by_resource.entry(detail.resource_name.as_str()).or_default() += detail.cost;
            *by_category.entry(detail.category_name.as_str()).or_default() += detail.cost;
        }

        Self {
            by_resource: ranked(by_resource),
            by_category: ranked(by_category),
            total: details.iter().map(|d| d.cost).sum(),
        }
    }
}

fn ranked(totals: HashMap<&str, f64>) -> Vec<RevenueLine> {
    let mut lines: Vec<RevenueLine> = totals
        .into_iter()
        .map(|(name, revenue)| RevenueLine {
            name: name.to_string(),
            revenue,
        })
        .collect();
    lines.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.name.cmp(&b.name))
    });
    lines
}

/// Detail rows of one invoice grouped per instance, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBreakdown {
    pub instance_id: String,
    pub instance_name: String,
    pub lines: Vec<RevenueLine>,
    pub subtotal: f64,
}

impl InstanceBreakdown {
    pub fn group(details: &[ConsumptionDetail]) -> Vec<Self> {
        let mut groups: Vec<InstanceBreakdown> = Vec::new();

        for detail in details {
            let position = groups
                .iter()
                .position(|g| g.instance_id == detail.instance_id);
            let group = match position {
                Some(index) => &mut groups[index],
                None => {
                    groups.push(InstanceBreakdown {
                        instance_id: detail.instance_id.clone(),
                        instance_name: detail.instance_name.clone(),
                        lines: Vec::new(),
                        subtotal: 0.0,
                    });
                    let last = groups.len() - 1;
                    &mut groups[last]
                }
            };
            group.lines.push(RevenueLine {
                name: detail.resource_name.clone(),
                revenue: detail.cost,
            });
            group.subtotal += detail.cost;
        }

        groups
    }
}
