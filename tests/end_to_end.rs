use indoc::indoc;
use modguard::core::{ProjectReference, Severity};
use modguard::{
    create_default_configuration, fix_violations, load_configuration, load_workspace, validate_all, Classifier,
    ModuleInfo, ProjectFileLoader, ProjectInfo,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_project(root: &Path, name: &str, references: &[&str]) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    let items: String = references
        .iter()
        .map(|r| format!("    <ProjectReference Include=\"..\\{0}\\{0}.csproj\" />\n", r))
        .collect();
    let body = if items.is_empty() {
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n</Project>\n".to_string()
    } else {
        format!(
            "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <ItemGroup>\n{}  </ItemGroup>\n</Project>\n",
            items
        )
    };
    fs::write(dir.join(format!("{}.csproj", name)), body).unwrap();
}

fn sample_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_project(dir.path(), "Shared.Core", &[]);
    write_project(dir.path(), "Orders.Core", &["Shared.Core", "Orders.Infrastructure"]);
    write_project(dir.path(), "Orders.Infrastructure", &["Orders.Core"]);
    write_project(dir.path(), "Orders.Admin.App", &["Orders.Core", "Orders.Admin.Endpoints"]);
    write_project(dir.path(), "Orders.Admin.Endpoints", &["Orders.Admin.App"]);
    dir
}

#[test]
fn core_referencing_infrastructure_is_one_fixable_error() {
    let config = create_default_configuration();
    let classifier = Classifier::new(&config);
    let modules = vec![
        classifier.classify_project(
            ProjectInfo::new(
                "Orders.Core",
                "/repo/Orders.Core/Orders.Core.csproj",
                vec![ProjectReference::new(r"..\Orders.Infrastructure\Orders.Infrastructure.csproj")],
            ),
            None,
        ),
        classifier.classify_project(
            ProjectInfo::new(
                "Orders.Infrastructure",
                "/repo/Orders.Infrastructure/Orders.Infrastructure.csproj",
                vec![],
            ),
            None,
        ),
    ];

    let violations = validate_all(&config, &modules);
    assert_eq!(violations.len(), 1);
    let violation = &violations[0];
    assert_eq!(violation.severity, Severity::Error);
    assert_eq!(violation.project_name, "Orders.Core");
    assert_eq!(violation.offending_reference.as_deref(), Some("Orders.Infrastructure"));
    assert_eq!(violation.rule_id, "dependency-rule(core)");
    assert!(violation.auto_fixable);
}

#[test]
fn workspace_on_disk_reports_layering_breaches() {
    let dir = sample_workspace();
    let loaded = load_configuration(dir.path(), None).unwrap();
    assert!(loaded.source.is_none());

    let workspace = load_workspace(dir.path(), &loaded.config, &ProjectFileLoader::new());
    assert_eq!(workspace.modules.len(), 5);
    assert!(workspace.failures.is_empty());

    let violations = validate_all(&loaded.config, &workspace.modules);
    let pairs: Vec<(&str, &str)> = violations
        .iter()
        .map(|v| (v.project_name.as_str(), v.offending_reference.as_deref().unwrap_or("")))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Orders.Admin.App", "Orders.Admin.Endpoints"),
            ("Orders.Core", "Orders.Infrastructure"),
        ]
    );
    let located = violations[1].location.as_ref().unwrap();
    assert!(located.file.ends_with("Orders.Core/Orders.Core.csproj"));
    assert_eq!(located.line, 4);
}

#[test]
fn profile_downgrades_severity_and_extends_default() {
    let dir = sample_workspace();
    fs::write(
        dir.path().join(".modguard.toml"),
        indoc! {r#"
            extends = "default"

            [profiles.lenient]
            severity_overrides = [{ rule = "dependency-rule(core)", severity = "warning" }]
            ignored_projects = ["*.Admin.*"]
        "#},
    )
    .unwrap();

    let strict = load_configuration(dir.path(), None).unwrap();
    let strict_workspace = load_workspace(dir.path(), &strict.config, &ProjectFileLoader::new());
    assert_eq!(validate_all(&strict.config, &strict_workspace.modules).len(), 2);

    let lenient = load_configuration(dir.path(), Some("lenient")).unwrap();
    let workspace = load_workspace(dir.path(), &lenient.config, &ProjectFileLoader::new());
    assert_eq!(workspace.ignored, 2);
    let violations = validate_all(&lenient.config, &workspace.modules);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, Severity::Warning);

    let missing = load_configuration(dir.path(), Some("nightly")).unwrap_err();
    assert!(missing.to_string().contains("Available profiles: lenient"));
}

#[test]
fn fixing_removes_offending_references_and_revalidates_clean() {
    let dir = sample_workspace();
    let config = create_default_configuration();
    let workspace = load_workspace(dir.path(), &config, &ProjectFileLoader::new());
    let violations = validate_all(&config, &workspace.modules);

    let preview = fix_violations(&violations, &workspace.modules, true);
    assert!(preview.iter().all(|r| r.success && !r.changed));
    let untouched = load_workspace(dir.path(), &config, &ProjectFileLoader::new());
    assert_eq!(validate_all(&config, &untouched.modules).len(), 2);

    let results = fix_violations(&violations, &workspace.modules, false);
    assert!(results.iter().all(|r| r.success && r.changed));

    let after = load_workspace(dir.path(), &config, &ProjectFileLoader::new());
    assert!(validate_all(&config, &after.modules).is_empty());

    let core: &ModuleInfo = after.modules.iter().find(|m| m.name() == "Orders.Core").unwrap();
    let remaining: Vec<String> = core.project.references.iter().map(|r| r.target_name()).collect();
    assert_eq!(remaining, vec!["Shared.Core".to_string()]);
}
