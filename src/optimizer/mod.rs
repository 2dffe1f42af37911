//! Redundant reference detection.
//!
//! Two kinds of unnecessary references are reported per component:
//!
//! - **Transitive**: a direct reference `O` is already reachable through another
//!   direct reference `D`; the path is reported as `P → D → O`.
//! - **Unused**: no usage token equals the target name or starts with
//!   `<target>.` (ASCII case-insensitive).
//!
//! Special references (analyzers, build-only) are ignored throughout. A target
//! flagged as transitive is never also flagged as unused.

mod graph;
pub mod usage;

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use crate::core::{OptimizationResult, ProjectInfo, ReferenceReason, UnnecessaryReference};

pub use graph::ReferenceGraph;
pub use usage::{collect_tokens, NoUsage, UsageScanner, UsageSource};

pub struct ReferenceOptimizer<'a> {
    projects: &'a [ProjectInfo],
    graph: ReferenceGraph,
}

impl<'a> ReferenceOptimizer<'a> {
    pub fn new(projects: &'a [ProjectInfo]) -> Self {
        Self {
            projects,
            graph: ReferenceGraph::build(projects),
        }
    }

    /// Analyze every component, keeping input order for the results.
    pub fn analyze<U: UsageSource>(&self, usage: &U) -> Vec<OptimizationResult> {
        let results: Vec<OptimizationResult> = self
            .projects
            .par_iter()
            .filter(|project| self.graph.contains(&project.name))
            .filter_map(|project| self.analyze_project(project, usage))
            .collect();

        debug!(
            "Optimization found unnecessary references in {} of {} projects",
            results.len(),
            self.projects.len()
        );
        results
    }

    fn analyze_project<U: UsageSource>(
        &self,
        project: &ProjectInfo,
        usage: &U,
    ) -> Option<OptimizationResult> {
        let direct = self.graph.direct_references(&project.name);
        let mut references = self.transitive_references(&project.name, &direct);

        let flagged: HashSet<String> = references.iter().map(|r| r.reference_name.clone()).collect();
        let candidates: Vec<&str> = direct
            .iter()
            .copied()
            .filter(|name| !flagged.contains(*name))
            .collect();

        if !candidates.is_empty() {
            if let Some(tokens) = usage.tokens_for(project) {
                references.extend(unused_references(&candidates, &tokens));
            }
        }

        if references.is_empty() {
            return None;
        }
        Some(OptimizationResult {
            project_name: project.name.clone(),
            descriptor_path: project.descriptor_path.clone(),
            references,
        })
    }

    fn transitive_references(&self, project: &str, direct: &[&str]) -> Vec<UnnecessaryReference> {
        let mut found: Vec<UnnecessaryReference> = Vec::new();

        for &via in direct {
            let reachable = self.graph.reachable_from(via);
            for &other in direct {
                if other == via || !reachable.contains(other) {
                    continue;
                }
                if found.iter().any(|r| r.reference_name == other) {
                    continue;
                }
                found.push(UnnecessaryReference {
                    reference_name: other.to_string(),
                    reason: ReferenceReason::Transitive,
                    transitive_path: Some(format!("{} → {} → {}", project, via, other)),
                });
            }
        }

        found
    }
}

fn unused_references(candidates: &[&str], tokens: &HashSet<String>) -> Vec<UnnecessaryReference> {
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_ascii_lowercase()).collect();

    candidates
        .iter()
        .filter(|name| !is_used(name, &lowered))
        .map(|name| UnnecessaryReference {
            reference_name: name.to_string(),
            reason: ReferenceReason::Unused,
            transitive_path: None,
        })
        .collect()
}

fn is_used(target: &str, lowered_tokens: &[String]) -> bool {
    let target = target.to_ascii_lowercase();
    let prefix = format!("{}.", target);
    lowered_tokens
        .iter()
        .any(|token| *token == target || token.starts_with(&prefix))
}

/// Analyze components in one call.
pub fn analyze_optimizations<U: UsageSource>(
    projects: &[ProjectInfo],
    usage: &U,
) -> Vec<OptimizationResult> {
    ReferenceOptimizer::new(projects).analyze(usage)
}
