use modguard::core::{ProjectReference, ReferenceReason};
use modguard::optimizer::NoUsage;
use modguard::{
    analyze_optimizations, create_default_configuration, load_workspace, ProjectFileLoader, ProjectInfo,
    UsageScanner,
};
use pretty_assertions::assert_eq;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(name: &str, references: &[&str]) -> ProjectInfo {
    ProjectInfo::new(
        name,
        format!("/repo/{0}/{0}.csproj", name),
        references
            .iter()
            .map(|r| ProjectReference::new(format!(r"..\{0}\{0}.csproj", r)))
            .collect(),
    )
}

#[test]
fn transitive_reference_is_never_also_unused() {
    let projects = vec![project("X", &["Y", "Z"]), project("Y", &["Z"]), project("Z", &[])];
    let usage: HashMap<String, HashSet<String>> =
        HashMap::from([("X".to_string(), HashSet::from(["Y".to_string()]))]);

    let results = analyze_optimizations(&projects, &usage);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].project_name, "X");
    assert_eq!(results[0].references.len(), 1);
    let finding = &results[0].references[0];
    assert_eq!(finding.reference_name, "Z");
    assert_eq!(finding.reason, ReferenceReason::Transitive);
    assert_eq!(finding.transitive_path.as_deref(), Some("X → Y → Z"));
}

#[test]
fn cyclic_references_terminate() {
    let projects = vec![project("A", &["B", "C"]), project("B", &["C"]), project("C", &["A"])];
    let results = analyze_optimizations(&projects, &NoUsage);
    let a = results.iter().find(|r| r.project_name == "A").unwrap();
    assert_eq!(a.references[0].reference_name, "C");
}

fn write(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

#[test]
fn scanning_sources_on_disk_finds_unused_and_transitive() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "Billing.Api/Billing.Api.csproj",
        r#"<Project>
  <ItemGroup>
    <ProjectReference Include="..\Billing.Domain\Billing.Domain.csproj" />
    <ProjectReference Include="..\Billing.Data\Billing.Data.csproj" />
    <ProjectReference Include="..\Audit.Log\Audit.Log.csproj" />
    <ProjectReference Include="..\Billing.Generators\Billing.Generators.csproj" OutputItemType="Analyzer" ReferenceOutputAssembly="false" />
  </ItemGroup>
</Project>
"#,
    );
    write(
        root,
        "Billing.Api/Program.cs",
        "using Billing.Domain.Invoices;\n\nvar invoice = new Invoice();\n",
    );
    write(root, "Billing.Api/obj/Generated.cs", "using Audit.Log;\n");
    write(
        root,
        "Billing.Domain/Billing.Domain.csproj",
        r#"<Project><ItemGroup><ProjectReference Include="..\Billing.Data\Billing.Data.csproj" /></ItemGroup></Project>"#,
    );
    write(root, "Billing.Data/Billing.Data.csproj", "<Project/>");
    write(root, "Audit.Log/Audit.Log.csproj", "<Project/>");
    write(root, "Billing.Generators/Billing.Generators.csproj", "<Project/>");

    let workspace = load_workspace(root, &create_default_configuration(), &ProjectFileLoader::new());
    let projects = workspace.projects();
    assert_eq!(projects.len(), 5);

    let results = analyze_optimizations(&projects, &UsageScanner::new());
    assert_eq!(results.len(), 1);
    let api = &results[0];
    assert_eq!(api.project_name, "Billing.Api");
    let findings: Vec<(&str, ReferenceReason)> = api
        .references
        .iter()
        .map(|r| (r.reference_name.as_str(), r.reason))
        .collect();
    assert_eq!(
        findings,
        vec![
            ("Billing.Data", ReferenceReason::Transitive),
            ("Audit.Log", ReferenceReason::Unused),
        ]
    );
}
