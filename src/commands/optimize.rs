use anyhow::Result;
use tracing::info_span;

use super::{load_config, resolve_root, EXIT_SUCCESS};
use crate::cli::CommonArgs;
use crate::descriptor::ProjectFileLoader;
use crate::io::{create_writer, OptimizeReport};
use crate::optimizer::{ReferenceOptimizer, UsageScanner};
use crate::pipeline::load_workspace;

/// Report-only; an optimization finding never fails the run.
pub fn run(common: &CommonArgs) -> Result<i32> {
    let _span = info_span!("optimize").entered();

    let root = resolve_root(common)?;
    let loaded = load_config(common, &root)?;
    let workspace = load_workspace(&root, &loaded.config, &ProjectFileLoader::new());

    let projects = workspace.projects();
    let results = ReferenceOptimizer::new(&projects).analyze(&UsageScanner::new());
    let report = OptimizeReport::new(&root, projects.len(), results);

    let mut writer = create_writer(common.format, common.output.as_deref(), common.quiet)?;
    writer.write_optimization(&report)?;

    Ok(EXIT_SUCCESS)
}
