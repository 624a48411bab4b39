//! Launch report: the validated active datasets in a serializable form,
//! plus a dependency-respecting load order for downstream processing.

use crate::context::ValidationContext;
use crate::error::RuleError;
use crate::spec::{MasterSpecRow, MasterSpecTable};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize)]
pub struct DatasetView {
    pub dataset_id: String,
    pub primary_keys: Vec<String>,
    pub partition_keys: Vec<String>,
    pub dependencies: Vec<String>,
    pub standard_checks: usize,
    pub vacuum_hours: Option<f64>,
    /// The master spec record as loaded.
    pub record: MasterSpecRow,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub datasets: usize,
    pub active: usize,
    pub inactive: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub master_spec: String,
    pub datasets: Vec<DatasetView>,
    /// Active dataset ids, every dataset after all of its dependencies.
    pub load_order: Vec<String>,
    pub totals: TotalsView,
}

/// Build the report for an already validated active table.
///
/// Feed specs come from the context cache, so this is cheap after a
/// successful run.
pub fn build_launch_report(
    ctx: &ValidationContext,
    active: &MasterSpecTable,
) -> Result<LaunchReport, RuleError> {
    let all = ctx.get_master_specs()?;

    let mut datasets = Vec::new();
    let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in &active.rows {
        let Some(id) = row.dataset_id() else {
            continue;
        };
        let spec = ctx.get_feed_spec(id)?;
        edges.insert(id.to_string(), spec.dependencies.clone());
        datasets.push(DatasetView {
            dataset_id: id.to_string(),
            primary_keys: spec.primary_keys.clone(),
            partition_keys: spec.partition_keys.clone(),
            dependencies: spec.dependencies.clone(),
            standard_checks: spec.standard_checks.len(),
            vacuum_hours: spec.vacuum_hours,
            record: row.clone(),
        });
    }

    let order: Vec<String> = datasets.iter().map(|d| d.dataset_id.clone()).collect();
    Ok(LaunchReport {
        master_spec: ctx.master_spec_name().to_string(),
        load_order: load_order(&order, &edges),
        totals: TotalsView {
            datasets: all.len(),
            active: active.len(),
            inactive: all.len() - active.len(),
        },
        datasets,
    })
}

/// Post-order walk from each id in table order, over an explicit frame
/// stack. The graph is known to be acyclic here; a revisit is simply skipped.
fn load_order(ids: &[String], edges: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::new();

    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let mut stack: Vec<(&str, usize)> = vec![(id.as_str(), 0)];
        while let Some(frame) = stack.last_mut() {
            let (v, next) = *frame;
            match edges.get(v).and_then(|deps| deps.get(next)) {
                Some(d) => {
                    frame.1 += 1;
                    if seen.insert(d.as_str()) {
                        stack.push((d.as_str(), 0));
                    }
                }
                None => {
                    out.push(v.to_string());
                    stack.pop();
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, dataset, feed_with, valid_feed};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn dependencies_load_first() {
        let ctx = context(vec![
            dataset("orders", true, &feed_with(json!({"dependencies": ["customers", "products"]}))),
            dataset("legacy", false, &valid_feed()),
            dataset("customers", true, &feed_with(json!({"dependencies": ["regions"]}))),
            dataset("products", true, &valid_feed()),
            dataset("regions", true, &valid_feed()),
        ]);
        let active = ctx.get_master_specs().unwrap().filter_active();
        let report = build_launch_report(&ctx, &active).unwrap();

        assert_eq!(
            report.load_order,
            vec!["regions", "customers", "products", "orders"]
        );
        assert_eq!(report.totals.datasets, 5);
        assert_eq!(report.totals.active, 4);
        assert_eq!(report.totals.inactive, 1);
        assert_eq!(report.datasets[0].dependencies, vec!["customers", "products"]);
        assert_eq!(report.datasets[0].primary_keys, vec!["id"]);
    }

    #[test]
    fn report_serializes_records_flat() {
        let ctx = context(vec![dataset("orders", true, &valid_feed())]);
        let active = ctx.get_master_specs().unwrap().filter_active();
        let report = build_launch_report(&ctx, &active).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["master_spec"], json!("master.json"));
        assert_eq!(value["datasets"][0]["record"]["dataset_id"], json!("orders"));
        assert_eq!(value["datasets"][0]["record"]["is_active"], json!(true));
        assert_eq!(value["load_order"], json!(["orders"]));
    }

    #[test]
    fn long_chain_orders_deepest_first() {
        let len = 200_000;
        let ids: Vec<String> = (0..len).map(|i| format!("d{}", i)).collect();
        let edges: BTreeMap<String, Vec<String>> = ids
            .windows(2)
            .map(|w| (w[0].clone(), vec![w[1].clone()]))
            .collect();

        let order = load_order(&ids, &edges);
        assert_eq!(order.len(), len);
        assert_eq!(order.first().map(String::as_str), Some("d199999"));
        assert_eq!(order.last().map(String::as_str), Some("d0"));
    }
}
