//! `taxonomy!` expansions load into a working graph.

use tag_graph::{taxonomy, Node, Path, TagGraph};

taxonomy! {
    pub mod lexicon {
        root {
            api {
                #[alias = "root.api.legacy_nabu"]
                #[localization = "strings.nabu"]
                nabu: "boolean-leaf";
            }
            type;
            _2fa;
            SSL;
        }
        "boolean-leaf";
    }
}

// Same-name children under different parents
taxonomy! {
    mod tags {
        combat { attack; idle; }
        movement { attack; idle; }
    }
}

fn graph() -> TagGraph {
    TagGraph::from_defs(lexicon::TABLE).unwrap()
}

#[test]
fn test_module_constants() {
    assert_eq!(lexicon::NODE_COUNT, 7);
    assert_eq!(lexicon::root::api::nabu::PATH, "root.api.nabu");
    assert_eq!(lexicon::root::api::nabu::CAPABILITIES, &["boolean-leaf"]);
    assert_eq!(lexicon::root::api::nabu::ALIASES, &["root.api.legacy_nabu"]);
    assert_eq!(lexicon::root::type_::PATH, "root.type");
    assert_eq!(lexicon::root::_2fa::PATH, "root.2fa");
    assert_eq!(lexicon::root::_2fa::NAME, "2fa");
    assert_eq!(lexicon::root::SSL::PATH, "root.SSL");
}

#[test]
fn test_table_is_parent_first() {
    let paths: Vec<_> = lexicon::TABLE.iter().map(|def| def.path).collect();
    assert_eq!(
        paths,
        [
            "root",
            "root.api",
            "root.api.nabu",
            "root.type",
            "root.2fa",
            "root.SSL",
            "boolean-leaf",
        ]
    );
    assert_eq!(lexicon::TABLE[2].parent, Some("root.api"));
    assert_eq!(lexicon::TABLE[2].localization_key, Some("strings.nabu"));
}

#[test]
fn test_table_loads_and_conforms() {
    let graph = graph();
    let nabu = graph.resolve_str(lexicon::root::api::nabu::PATH).unwrap();
    let legacy = graph.resolve_str("root.api.legacy_nabu").unwrap();
    let flag = Path::parse("boolean-leaf").unwrap();

    assert!(graph.conforms_to(&nabu, &flag));
    assert!(Node::ptr_eq(&nabu, &legacy));
    assert_eq!(nabu.localization_key().canonical(), "strings.nabu");
}

#[test]
fn test_accessors_reach_escaped_children() {
    let graph = graph();
    let root = graph.root("root").unwrap();

    let kind = graph.child_by_accessor(&root, "type_").unwrap();
    assert_eq!(kind.canonical(), lexicon::root::type_::PATH);
    let two_factor = graph.child_by_accessor(&root, "_2fa").unwrap();
    assert_eq!(two_factor.canonical(), lexicon::root::_2fa::PATH);
}

#[test]
fn test_same_name_correct_paths() {
    assert_eq!(tags::combat::attack::PATH, "combat.attack");
    assert_eq!(tags::movement::attack::PATH, "movement.attack");
    assert_eq!(tags::combat::idle::PATH, "combat.idle");
    assert_eq!(tags::movement::idle::PATH, "movement.idle");

    let graph = TagGraph::from_defs(tags::TABLE).unwrap();
    let a = graph.resolve_str(tags::combat::attack::PATH).unwrap();
    let b = graph.resolve_str(tags::movement::attack::PATH).unwrap();
    assert_ne!(a, b);
}
