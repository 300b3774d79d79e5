// @generated by tag-graph-build. Do not edit by hand.

#[allow(non_snake_case, non_camel_case_types, dead_code)]
pub mod lexicon {
    /// Total number of declared nodes.
    pub const NODE_COUNT: usize = 5;

    /// Flat table, parents before children.
    pub const TABLE: &[::tag_graph::NodeDef] = &[
        ::tag_graph::NodeDef {
            path: "boolean-leaf",
            parent: None,
            capabilities: &[],
            aliases: &[],
            localization_key: None,
        },
        ::tag_graph::NodeDef {
            path: "root",
            parent: None,
            capabilities: &[],
            aliases: &[],
            localization_key: None,
        },
        ::tag_graph::NodeDef {
            path: "root.api",
            parent: Some("root"),
            capabilities: &[],
            aliases: &[],
            localization_key: None,
        },
        ::tag_graph::NodeDef {
            path: "root.api.nabu",
            parent: Some("root.api"),
            capabilities: &["boolean-leaf"],
            aliases: &[::tag_graph::AliasDef { path: "root.api.legacy_nabu", localization_key: None }],
            localization_key: Some("strings.nabu"),
        },
        ::tag_graph::NodeDef {
            path: "root.type",
            parent: Some("root"),
            capabilities: &[],
            aliases: &[],
            localization_key: None,
        },
    ];

    pub mod root {
        pub const PATH: &str = "root";
        pub const NAME: &str = "root";

        pub mod api {
            pub const PATH: &str = "root.api";
            pub const NAME: &str = "api";

            pub mod nabu {
                pub const PATH: &str = "root.api.nabu";
                pub const NAME: &str = "nabu";
            }
        }

        pub mod type_ {
            pub const PATH: &str = "root.type";
            pub const NAME: &str = "type";
        }
    }
}
