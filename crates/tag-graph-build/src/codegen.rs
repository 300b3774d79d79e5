//! Rust source generation for a parsed taxonomy.

use std::collections::BTreeMap;
use std::fmt::Write;

use tag_graph::accessor_for;

use crate::toml_parser::{TaxonomyConfig, TaxonomyEntry};

const INDENT: &str = "    ";

/// Generate a module holding `NODE_COUNT`, `TABLE` and one nested module
/// (with `PATH`/`NAME` constants) per node that has an accessor.
pub fn generate_table_code(config: &TaxonomyConfig) -> String {
    let mut out = String::new();
    let module = &config.module_name;

    out.push_str("// @generated by tag-graph-build. Do not edit by hand.\n\n");
    out.push_str("#[allow(non_snake_case, non_camel_case_types, dead_code)]\n");
    let _ = writeln!(out, "pub mod {module} {{");
    let _ = writeln!(out, "{INDENT}/// Total number of declared nodes.");
    let _ = writeln!(out, "{INDENT}pub const NODE_COUNT: usize = {};", config.len());
    out.push('\n');
    let _ = writeln!(out, "{INDENT}/// Flat table, parents before children.");
    let _ = writeln!(out, "{INDENT}pub const TABLE: &[::tag_graph::NodeDef] = &[");
    for entry in config.entries() {
        write_def(&mut out, entry);
    }
    let _ = writeln!(out, "{INDENT}];");

    let mut children: BTreeMap<Option<&str>, Vec<&TaxonomyEntry>> = BTreeMap::new();
    for entry in config.entries() {
        children.entry(entry.parent.as_deref()).or_default().push(entry);
    }
    write_modules(&mut out, &children, None, 1);

    out.push_str("}\n");
    out
}

fn write_def(out: &mut String, entry: &TaxonomyEntry) {
    let parent = match &entry.parent {
        Some(parent) => format!("Some({parent:?})"),
        None => "None".to_string(),
    };
    let capabilities = entry
        .capabilities
        .iter()
        .map(|c| format!("{c:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    let aliases = entry
        .aliases
        .iter()
        .map(|alias| {
            format!(
                "::tag_graph::AliasDef {{ path: {:?}, localization_key: {} }}",
                alias.path,
                option_literal(alias.localization_key.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let _ = writeln!(out, "{INDENT}{INDENT}::tag_graph::NodeDef {{");
    let _ = writeln!(out, "{INDENT}{INDENT}{INDENT}path: {:?},", entry.path);
    let _ = writeln!(out, "{INDENT}{INDENT}{INDENT}parent: {parent},");
    let _ = writeln!(out, "{INDENT}{INDENT}{INDENT}capabilities: &[{capabilities}],");
    let _ = writeln!(out, "{INDENT}{INDENT}{INDENT}aliases: &[{aliases}],");
    let _ = writeln!(
        out,
        "{INDENT}{INDENT}{INDENT}localization_key: {},",
        option_literal(entry.localization_key.as_deref())
    );
    let _ = writeln!(out, "{INDENT}{INDENT}}},");
}

fn option_literal(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("Some({value:?})"),
        None => "None".to_string(),
    }
}

fn write_modules(
    out: &mut String,
    children: &BTreeMap<Option<&str>, Vec<&TaxonomyEntry>>,
    parent: Option<&str>,
    level: usize,
) {
    let Some(entries) = children.get(&parent) else {
        return;
    };
    let pad = INDENT.repeat(level);
    for entry in entries {
        // Segments that cannot be spelled as identifiers stay TABLE-only
        let name = entry.path.rsplit('.').next().unwrap_or(&entry.path);
        let Some(accessor) = accessor_for(name) else {
            continue;
        };
        out.push('\n');
        let _ = writeln!(out, "{pad}pub mod {accessor} {{");
        let _ = writeln!(out, "{pad}{INDENT}pub const PATH: &str = {:?};", entry.path);
        let _ = writeln!(out, "{pad}{INDENT}pub const NAME: &str = {name:?};");
        write_modules(out, children, Some(&entry.path), level + 1);
        let _ = writeln!(out, "{pad}}}");
    }
}
