use anyhow::Result;
use tracing::info_span;

use super::{load_config, resolve_root, EXIT_FAILURE, EXIT_SUCCESS};
use crate::cli::CommonArgs;
use crate::descriptor::ProjectFileLoader;
use crate::io::{create_writer, CheckReport};
use crate::pipeline::load_workspace;
use crate::rules::RuleEngine;

pub fn run(common: &CommonArgs) -> Result<i32> {
    let _span = info_span!("check").entered();

    let root = resolve_root(common)?;
    let loaded = load_config(common, &root)?;
    let workspace = load_workspace(&root, &loaded.config, &ProjectFileLoader::new());
    let violations = RuleEngine::new(&loaded.config).validate_all(&workspace.modules);

    let report = CheckReport::new(&root, &workspace.modules, violations, workspace.failures)
        .with_config_source(loaded.source, common.profile.clone());

    let mut writer = create_writer(common.format, common.output.as_deref(), common.quiet)?;
    writer.write_check(&report)?;

    if let Some(output) = &common.output {
        if !common.quiet {
            println!("Report exported to: {}", output.display());
        }
    }

    Ok(if report.summary.error_count > 0 {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}
