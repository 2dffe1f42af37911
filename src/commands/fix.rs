use anyhow::Result;
use tracing::{info, info_span};

use super::{load_config, resolve_root, EXIT_FAILURE, EXIT_SUCCESS};
use crate::cli::CommonArgs;
use crate::core::{Severity, Violation};
use crate::descriptor::ProjectFileLoader;
use crate::fix::AutoFixEngine;
use crate::io::{create_writer, FixReport};
use crate::pipeline::load_workspace;
use crate::rules::RuleEngine;

pub fn run(common: &CommonArgs, dry_run: bool) -> Result<i32> {
    let _span = info_span!("fix", dry_run).entered();

    let root = resolve_root(common)?;
    let loaded = load_config(common, &root)?;
    let workspace = load_workspace(&root, &loaded.config, &ProjectFileLoader::new());
    let violations = RuleEngine::new(&loaded.config).validate_all(&workspace.modules);

    let fixable: Vec<Violation> = violations
        .into_iter()
        .filter(|v| v.auto_fixable && v.severity == Severity::Error)
        .collect();
    info!("{} auto-fixable violation(s)", fixable.len());

    let results = AutoFixEngine::new(dry_run).fix_violations(&fixable, &workspace.modules);
    let report = FixReport::new(dry_run, results);

    let mut writer = create_writer(common.format, common.output.as_deref(), common.quiet)?;
    writer.write_fix(&report)?;

    Ok(if report.failed > 0 {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}
