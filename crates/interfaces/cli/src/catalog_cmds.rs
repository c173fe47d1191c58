use std::path::Path;

use anyhow::{Context, Result};
use vasini_survey::Catalog;

pub(crate) fn run_catalog_check(path: Option<&Path>, inventory_len: usize) -> Result<()> {
    let source = path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in catalog".to_string());
    let catalog = Catalog::load_or_builtin(path, inventory_len)
        .with_context(|| format!("catalog check failed for {source}"))?;

    println!("catalog OK: {source}");
    for line in summary_lines(&catalog) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn summary_lines(catalog: &Catalog) -> Vec<String> {
    let mut lines = vec![
        format!("- demo questions: {}", catalog.list_demo_questions().len()),
        format!(
            "- inventory questions: {}",
            catalog.list_inventory_questions().len()
        ),
        "- options per type:".to_string(),
    ];
    lines.extend(
        catalog
            .leanings()
            .into_iter()
            .map(|(ty, count)| format!("    {ty:<12} {count}")),
    );
    lines
}
