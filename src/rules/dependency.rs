//! Cross-dataset dependency resolution.
//!
//! The dependency graph has one node per active dataset and an edge
//! `a -> b` for every entry `b` in `a`'s `dependencies`. Inactive datasets
//! are never nodes: an active dataset depending on one is a referential
//! violation, and their own dependency lists are ignored.
//!
//! We check, in order:
//! 1) every dependency names an existing, active dataset
//! 2) referential_integrity checks point at a declared dependency and at a
//!    column that dependency declares
//! 3) the graph is acyclic (self-dependencies included)

use super::ValidationRule;
use super::checks::CheckType;
use crate::context::ValidationContext;
use crate::error::{ErrorKind, RuleError};
use std::collections::BTreeMap;

pub struct ComprehensiveChecksDependencyDatasetCheck;

impl ValidationRule for ComprehensiveChecksDependencyDatasetCheck {
    fn name(&self) -> &'static str {
        "ComprehensiveChecksDependencyDatasetCheck"
    }

    fn validate(&self, ctx: &ValidationContext) -> Result<(), RuleError> {
        let table = ctx.get_master_specs()?;
        let specs = ctx.active_feed_specs()?;

        // 1) Resolve dependencies and build the adjacency map.
        let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (id, spec) in &specs {
            let mut deps: Vec<String> = Vec::new();
            for dep in &spec.dependencies {
                match table.find(dep) {
                    None => {
                        return Err(RuleError::for_dataset(
                            ErrorKind::ReferentialViolation,
                            id,
                            format!("depends on unknown dataset '{}'", dep),
                        ));
                    }
                    Some(row) if !row.is_active() => {
                        return Err(RuleError::for_dataset(
                            ErrorKind::ReferentialViolation,
                            id,
                            format!("depends on inactive dataset '{}'", dep),
                        ));
                    }
                    Some(_) => {}
                }
                if !deps.contains(dep) {
                    deps.push(dep.clone());
                }
            }
            edges.insert(id.clone(), deps);
        }

        // 2) Dependency-sensitive checks.
        for (id, spec) in &specs {
            for (idx, check) in spec.standard_checks.iter().enumerate() {
                let is_ref = check
                    .type_name()
                    .and_then(CheckType::from_name)
                    .is_some_and(|t| t == CheckType::ReferentialIntegrity);
                if !is_ref {
                    continue;
                }
                let (Some(ref_dataset), Some(ref_column)) = (
                    check.text_param("reference_dataset"),
                    check.text_param("reference_column"),
                ) else {
                    return Err(RuleError::for_dataset(
                        ErrorKind::StructuralViolation,
                        id,
                        format!(
                            "standard check #{} needs reference_dataset and reference_column",
                            idx + 1
                        ),
                    ));
                };

                if !spec.dependencies.iter().any(|d| d == ref_dataset) {
                    return Err(RuleError::for_dataset(
                        ErrorKind::ReferentialViolation,
                        id,
                        format!(
                            "standard check #{} references dataset '{}' which is not a declared dependency",
                            idx + 1,
                            ref_dataset
                        ),
                    ));
                }
                let ref_spec = ctx.get_feed_spec(ref_dataset)?;
                if !ref_spec.has_column(ref_column) {
                    return Err(RuleError::for_dataset(
                        ErrorKind::ReferentialViolation,
                        id,
                        format!(
                            "standard check #{} references column '{}' not declared by dataset '{}'",
                            idx + 1,
                            ref_column,
                            ref_dataset
                        ),
                    ));
                }
            }
        }

        // 3) Cycle detection, starting from each active dataset in table order.
        if let Some(cycle) = find_cycle(specs.iter().map(|(id, _)| id.as_str()), &edges) {
            return Err(RuleError::for_dataset(
                ErrorKind::CyclicDependency,
                cycle[0],
                format!("dependency cycle detected: {}", cycle.join(" -> ")),
            ));
        }

        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Temp,
    Perm,
}

/// DFS coloring over an explicit frame stack, so chain length is bounded
/// by the heap rather than the call stack. Returns the first cycle found as
/// a closed path (`a -> b -> a`).
fn find_cycle<'a>(
    roots: impl IntoIterator<Item = &'a str>,
    edges: &'a BTreeMap<String, Vec<String>>,
) -> Option<Vec<&'a str>> {
    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();

    for root in roots {
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root, Mark::Temp);
        // (node, index of the next dependency to follow); the frames are the current path
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (v, next) = *frame;
            let Some(d) = edges.get(v).and_then(|deps| deps.get(next)) else {
                marks.insert(v, Mark::Perm);
                stack.pop();
                continue;
            };
            frame.1 += 1;
            let d = d.as_str();

            match marks.get(d) {
                Some(Mark::Perm) => {}
                Some(Mark::Temp) => {
                    let start = stack.iter().position(|&(s, _)| s == d).unwrap_or(0);
                    let mut cycle: Vec<&str> = stack[start..].iter().map(|&(s, _)| s).collect();
                    cycle.push(d);
                    return Some(cycle);
                }
                None => {
                    marks.insert(d, Mark::Temp);
                    stack.push((d, 0));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationSettings;
    use crate::rules::launch_rules;
    use crate::testing::{context, dataset, feed_with, valid_feed};
    use crate::validator::Validator;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn deps(list: &[&str]) -> String {
        feed_with(json!({ "dependencies": list }))
    }

    #[test]
    fn independent_datasets_pass() {
        let ctx = context(vec![
            dataset("orders", true, &valid_feed()),
            dataset("customers", true, &valid_feed()),
        ]);
        ComprehensiveChecksDependencyDatasetCheck.validate(&ctx).unwrap();
    }

    #[test]
    fn chain_and_diamond_pass() {
        let ctx = context(vec![
            dataset("a", true, &deps(&["b", "c"])),
            dataset("b", true, &deps(&["d"])),
            dataset("c", true, &deps(&["d"])),
            dataset("d", true, &deps(&[])),
        ]);
        ComprehensiveChecksDependencyDatasetCheck.validate(&ctx).unwrap();
    }

    #[test]
    fn unknown_dependency_is_referential() {
        let ctx = context(vec![dataset("orders", true, &deps(&["ghost"]))]);
        let err = ComprehensiveChecksDependencyDatasetCheck
            .validate(&ctx)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReferentialViolation);
        assert_eq!(err.dataset.as_deref(), Some("orders"));
        assert!(err.message.contains("unknown dataset 'ghost'"));
    }

    #[test]
    fn inactive_dependency_is_referential() {
        let ctx = context(vec![
            dataset("orders", true, &deps(&["legacy"])),
            dataset("legacy", false, &valid_feed()),
        ]);
        let err = ComprehensiveChecksDependencyDatasetCheck
            .validate(&ctx)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReferentialViolation);
        assert!(err.message.contains("inactive dataset 'legacy'"));
    }

    #[test]
    fn inactive_datasets_may_depend_on_anything() {
        let ctx = context(vec![
            dataset("orders", true, &valid_feed()),
            dataset("legacy", false, &deps(&["ghost", "legacy"])),
        ]);
        ComprehensiveChecksDependencyDatasetCheck.validate(&ctx).unwrap();
    }

    #[test]
    fn mutual_dependency_is_a_cycle_until_back_edge_removed() {
        let ctx = context(vec![
            dataset("a", true, &deps(&["b"])),
            dataset("b", true, &deps(&["a"])),
        ]);
        let err = ComprehensiveChecksDependencyDatasetCheck
            .validate(&ctx)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CyclicDependency);
        assert!(err.message.contains("a -> b -> a"));

        let ctx = context(vec![
            dataset("a", true, &deps(&["b"])),
            dataset("b", true, &deps(&[])),
        ]);
        ComprehensiveChecksDependencyDatasetCheck.validate(&ctx).unwrap();
    }

    #[test]
    fn transitive_and_self_cycles_are_detected() {
        let ctx = context(vec![
            dataset("a", true, &deps(&["b"])),
            dataset("b", true, &deps(&["c"])),
            dataset("c", true, &deps(&["a"])),
        ]);
        let err = ComprehensiveChecksDependencyDatasetCheck
            .validate(&ctx)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CyclicDependency);
        assert!(err.message.contains("a -> b -> c -> a"));

        let ctx = context(vec![dataset("a", true, &deps(&["a"]))]);
        let err = ComprehensiveChecksDependencyDatasetCheck
            .validate(&ctx)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CyclicDependency);
        assert!(err.message.contains("a -> a"));
    }

    fn ri_check(reference_dataset: &str, reference_column: &str, dependencies: &[&str]) -> String {
        feed_with(json!({
            "dependencies": dependencies,
            "standard_checks": [{
                "check_type": "referential_integrity",
                "column": "id",
                "reference_dataset": reference_dataset,
                "reference_column": reference_column
            }]
        }))
    }

    #[test]
    fn referential_integrity_resolves_through_dependency() {
        let ctx = context(vec![
            dataset("orders", true, &ri_check("customers", "id", &["customers"])),
            dataset("customers", true, &valid_feed()),
        ]);
        ComprehensiveChecksDependencyDatasetCheck.validate(&ctx).unwrap();
    }

    #[test]
    fn referential_integrity_requires_declared_dependency() {
        let ctx = context(vec![
            dataset("orders", true, &ri_check("customers", "id", &[])),
            dataset("customers", true, &valid_feed()),
        ]);
        let err = ComprehensiveChecksDependencyDatasetCheck
            .validate(&ctx)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReferentialViolation);
        assert!(err.message.contains("not a declared dependency"));
    }

    #[test]
    fn referential_integrity_requires_column_in_dependency() {
        let ctx = context(vec![
            dataset("orders", true, &ri_check("customers", "email", &["customers"])),
            dataset("customers", true, &valid_feed()),
        ]);
        let err = ComprehensiveChecksDependencyDatasetCheck
            .validate(&ctx)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReferentialViolation);
        assert!(err.message.contains("column 'email'"));
    }

    #[test]
    fn padded_referential_integrity_is_still_resolved() {
        let orders = feed_with(json!({
            "dependencies": ["customers"],
            "standard_checks": [{
                "check_type": " referential_integrity ",
                "column": "id",
                "reference_dataset": " customers ",
                "reference_column": "ghost"
            }]
        }));
        let ctx = context(vec![
            dataset("orders", true, &orders),
            dataset("customers", true, &valid_feed()),
        ]);

        let err = Validator::fail_fast(launch_rules(&ValidationSettings::default()))
            .validate(&ctx)
            .unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].rule.as_deref(),
            Some("ComprehensiveChecksDependencyDatasetCheck")
        );
        assert_eq!(violations[0].kind, ErrorKind::ReferentialViolation);
        assert!(violations[0].message.contains("column 'ghost'"));
    }

    fn chain(len: usize) -> BTreeMap<String, Vec<String>> {
        (0..len)
            .map(|i| {
                let deps = if i + 1 < len { vec![format!("d{}", i + 1)] } else { Vec::new() };
                (format!("d{}", i), deps)
            })
            .collect()
    }

    #[test]
    fn long_chain_has_no_cycle() {
        let edges = chain(200_000);
        assert_eq!(find_cycle(["d0"], &edges), None);
    }

    #[test]
    fn long_chain_closed_at_the_end_is_a_cycle() {
        let mut edges = chain(200_000);
        edges.insert("d199999".to_string(), vec!["d0".to_string()]);
        let cycle = find_cycle(["d0"], &edges).unwrap();
        assert_eq!(cycle.len(), 200_001);
        assert_eq!(cycle.first(), Some(&"d0"));
        assert_eq!(cycle.last(), Some(&"d0"));
    }
}
