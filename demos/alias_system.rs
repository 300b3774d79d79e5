//! Alias system demonstration.
//!
//! This example shows how to:
//! - Declare aliases with `#[alias = "..."]` (same node, different path)
//! - Override the localization key when a node is reached through an alias
//! - Reach children through an aliased parent
//!
//! ## Use Cases
//!
//! 1. **Renaming tags**: Keep the old path as an alias for backward compatibility
//! 2. **Restructuring**: Move tags to a new location without breaking stored keys

use std::collections::HashMap;

use tag_graph::{taxonomy, Node, TableRow, TagGraph};

// =============================================================================
// Define a taxonomy with current paths and their legacy names
// =============================================================================

taxonomy! {
    pub mod tags {
        equipment {
            #[alias = "equipment.sword"]
            weapon {
                blade;
                bow;
            }
            armor {
                helmet;
            }
        }

        ability {
            combat {
                #[alias = "ability.attack"]
                strike;
                parry;
            }
        }
    }
}

fn main() {
    println!("=== Alias System Example ===\n");

    let graph = TagGraph::from_defs(tags::TABLE).expect("taxonomy table is valid");

    // -------------------------------------------------------------------------
    // 1. Aliases resolve to the same node instance
    // -------------------------------------------------------------------------
    println!("1. Alias identity:");

    let strike = graph.resolve_str(tags::ability::combat::strike::PATH).unwrap();
    let attack = graph.resolve_str("ability.attack").unwrap();

    println!("   {} resolved from 'ability.attack'", attack);
    println!("   Same instance? {}", Node::ptr_eq(&strike, &attack));
    println!();

    // -------------------------------------------------------------------------
    // 2. Children through an aliased parent
    // -------------------------------------------------------------------------
    println!("2. Children through an alias:");

    let blade = graph.resolve_str("equipment.sword.blade").unwrap();
    println!("   'equipment.sword.blade' -> {}", blade.canonical());
    println!();

    // -------------------------------------------------------------------------
    // 3. Localization key overrides
    // -------------------------------------------------------------------------
    println!("3. Localization through an alias:");

    let renamed = TagGraph::load([
        TableRow::new("menu"),
        TableRow::new("menu.quit").with_localization_key("strings.quit"),
        TableRow::alias("menu.exit", "menu.quit").with_localization_key("strings.exit"),
    ])
    .unwrap();
    let strings: HashMap<String, String> = [
        ("strings.quit".to_string(), "Quit".to_string()),
        ("strings.exit".to_string(), "Exit".to_string()),
    ]
    .into();

    for path in ["menu.quit", "menu.exit"] {
        let path = path.parse().unwrap();
        println!(
            "   {:<10} key={:<14} text={}",
            path,
            renamed.localization_key(&path).unwrap(),
            renamed.localized(&path, &strings).unwrap()
        );
    }
    println!();

    // -------------------------------------------------------------------------
    // 4. Listing the aliases of a node
    // -------------------------------------------------------------------------
    println!("4. Declared aliases:");
    for (alias, entry) in graph.table().aliases().iter() {
        println!("   {} -> {}", alias, entry.target);
    }
}
