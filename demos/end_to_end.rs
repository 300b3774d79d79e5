//! A loaded graph from end to end: resolution, conformance, inherited
//! children and keyed functions.

use tag_graph::{FunctionTable, Path, TableRow, TagGraph};

fn main() {
    let graph = TagGraph::load([
        TableRow::new("root"),
        TableRow::new("root.api"),
        TableRow::new("root.api.nabu").with_capabilities(["boolean-leaf"]),
        TableRow::new("root.ux"),
        TableRow::new("root.ux.buy").with_capabilities(["ux.type.story"]),
        TableRow::new("boolean-leaf"),
        TableRow::new("ux"),
        TableRow::new("ux.type"),
        TableRow::new("ux.type.story"),
        TableRow::new("ux.type.story.entry"),
    ])
    .expect("table is valid");

    println!("=== Tag Graph ===\n");

    let root = graph.root("root").unwrap();
    let nabu = graph.descendant(&root, "api.nabu").unwrap();
    let flag = Path::parse("boolean-leaf").unwrap();

    println!("{} conforms to {}: {}", nabu, flag, graph.conforms_to(&nabu, &flag));
    let api = graph.child_of(&root, "api").unwrap();
    println!("{} conforms to {}: {}", api, flag, graph.conforms_to(&api, &flag));

    // `entry` is not a row under root.ux.buy; it comes from ux.type.story
    let buy = graph.resolve_str("root.ux.buy").unwrap();
    let entry = graph.child_of(&buy, "entry").unwrap();
    println!("{} ({:?}) capabilities: {:?}", entry, entry.origin(), graph.capabilities(&entry));

    match graph.child_of(&api, "blockchain") {
        Ok(node) => println!("unexpected: {node}"),
        Err(err) => println!("error: {err}"),
    }

    let functions = FunctionTable::standard();
    for key in functions.keys() {
        println!("{key}({}) = {}", nabu, functions.call(key, &graph, &nabu).unwrap());
    }

    println!("\nconstructed {} of {} declared nodes", graph.constructed_count(), graph.len());
}
