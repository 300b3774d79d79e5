use std::collections::BTreeMap;

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{braced, token, Ident, LitStr, Result, Token, Visibility};

use proc_macro_crate::{crate_name, FoundCrate};

/// Parsed attributes for a node.
#[derive(Clone, Default)]
struct NodeAttrs {
    /// `#[alias = "other.path"]`, any number of times
    aliases: Vec<LitStr>,
    /// `#[localization = "key"]`
    localization: Option<LitStr>,
}

struct Node {
    /// Canonical segment text (escaping already undone)
    segment: String,
    span: Span,
    attrs: NodeAttrs,
    capabilities: Vec<LitStr>,
    children: Vec<Node>,
}

struct TaxonomyInput {
    vis: Visibility,
    root: Ident,
    nodes: Vec<Node>,
}

impl Parse for TaxonomyInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let vis: Visibility = input.parse()?;
        input.parse::<Token![mod]>()?;
        let root: Ident = input.parse()?;
        let content;
        braced!(content in input);
        let nodes = parse_nodes(&content)?;
        Ok(Self { vis, root, nodes })
    }
}

fn parse_nodes(input: ParseStream) -> Result<Vec<Node>> {
    let mut nodes: Vec<Node> = Vec::new();
    while !input.is_empty() {
        let attrs = parse_all_attrs(input)?;

        // Identifier (keywords and raw identifiers allowed) or a string
        // literal for segments that are not identifiers.
        let (segment, span) = if input.peek(LitStr) {
            let lit: LitStr = input.parse()?;
            (lit.value(), lit.span())
        } else {
            let ident = input.call(Ident::parse_any)?;
            (segment_for(&ident.unraw().to_string()), ident.span())
        };
        check_segment(&segment, span)?;

        // Optional capability list: `name: "cap.a", "cap.b"`
        let mut capabilities = Vec::new();
        if input.peek(Token![:]) {
            input.parse::<Token![:]>()?;
            loop {
                capabilities.push(input.parse::<LitStr>()?);
                if !input.peek(Token![,]) {
                    break;
                }
                input.parse::<Token![,]>()?;
            }
        }

        let children = if input.peek(token::Brace) {
            let content;
            braced!(content in input);
            parse_nodes(&content)?
        } else {
            input.parse::<Token![;]>()?;
            Vec::new()
        };

        if nodes.iter().any(|node| node.segment == segment) {
            return Err(syn::Error::new(
                span,
                format!("duplicate node '{segment}' under the same parent"),
            ));
        }
        nodes.push(Node {
            segment,
            span,
            attrs,
            capabilities,
            children,
        });
    }
    check_accessors(&nodes)?;
    Ok(nodes)
}

/// Parse `#[alias = "..."]` and `#[localization = "..."]`.
fn parse_all_attrs(input: ParseStream) -> Result<NodeAttrs> {
    let mut result = NodeAttrs::default();

    while input.peek(Token![#]) {
        input.parse::<Token![#]>()?;
        let content;
        syn::bracketed!(content in input);

        let key: Ident = content.parse()?;
        content.parse::<Token![=]>()?;
        let value: LitStr = content.parse()?;

        if key == "alias" {
            result.aliases.push(value);
        } else if key == "localization" {
            if result.localization.is_some() {
                return Err(syn::Error::new(key.span(), "duplicate #[localization]"));
            }
            result.localization = Some(value);
        } else {
            return Err(syn::Error::new(
                key.span(),
                format!("unknown attribute '{key}', expected `alias` or `localization`"),
            ));
        }
    }

    Ok(result)
}

fn check_segment(segment: &str, span: Span) -> Result<()> {
    if segment.is_empty() {
        return Err(syn::Error::new(span, "empty segment"));
    }
    if segment.contains('.') {
        return Err(syn::Error::new(span, "segment must not contain '.'"));
    }
    if segment.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(syn::Error::new(span, "segment must not contain whitespace"));
    }
    Ok(())
}

/// Siblings must not share a module name, and a module name must read back
/// as its own segment (`"type_"` would read as `type`).
fn check_accessors(nodes: &[Node]) -> Result<()> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for node in nodes {
        let Some(accessor) = accessor_for(&node.segment) else {
            continue;
        };
        if segment_for(&accessor) != node.segment {
            return Err(syn::Error::new(
                node.span,
                format!(
                    "segment '{}' is spelled `{accessor}` in code, which names '{}'",
                    node.segment,
                    segment_for(&accessor)
                ),
            ));
        }
        if let Some(other) = seen.insert(accessor.clone(), &node.segment) {
            return Err(syn::Error::new(
                node.span,
                format!("'{}' and '{other}' both map to accessor '{accessor}'", node.segment),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Segment escaping (mirrors tag_graph::escape)
// =============================================================================

const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn accessor_for(segment: &str) -> Option<String> {
    if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    if segment == "_" {
        return Some("__".to_string());
    }
    if KEYWORDS.contains(&segment) {
        return Some(format!("{segment}_"));
    }
    if segment.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(format!("_{segment}"));
    }
    Some(segment.to_string())
}

fn segment_for(accessor: &str) -> String {
    if accessor == "__" {
        return "_".to_string();
    }
    if let Some(rest) = accessor.strip_prefix('_')
        && rest.starts_with(|c: char| c.is_ascii_digit())
    {
        return rest.to_string();
    }
    if let Some(rest) = accessor.strip_suffix('_')
        && KEYWORDS.contains(&rest)
    {
        return rest.to_string();
    }
    accessor.to_string()
}

// =============================================================================
// Crate path resolution
// =============================================================================

fn tag_graph_crate_path() -> TokenStream2 {
    match crate_name("tag-graph") {
        Ok(FoundCrate::Itself) => {
            quote!(::tag_graph)
        }
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::tag_graph),
    }
}

// =============================================================================
// Code generation
// =============================================================================

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

/// Nested modules, one per node with an accessor.
///
/// ```ignore
/// taxonomy! {
///     pub mod lexicon {
///         root { r#type; "2fa-legacy"; }
///     }
/// }
///
/// // Generates:
/// pub mod lexicon {
///     pub mod root {
///         pub const PATH: &'static str = "root";
///         pub const NAME: &'static str = "root";
///         pub mod type_ {
///             pub const PATH: &'static str = "root.type";
///             pub const NAME: &'static str = "type";
///         }
///         // "2fa-legacy" has no accessor: it is in TABLE only
///     }
/// }
/// ```
fn generate_modules(nodes: &[Node], prefix: &str) -> Vec<TokenStream2> {
    let mut output = Vec::new();

    for node in nodes {
        let path = join(prefix, &node.segment);
        let children = generate_modules(&node.children, &path);
        let Some(accessor) = accessor_for(&node.segment) else {
            continue;
        };
        let module = Ident::new(&accessor, node.span);
        let path_lit = LitStr::new(&path, node.span);
        let name_lit = LitStr::new(&node.segment, node.span);
        let capability_lits = &node.capabilities;
        let alias_lits = &node.attrs.aliases;

        output.push(quote! {
            #[allow(non_snake_case)]
            pub mod #module {
                /// Canonical dot-separated path.
                pub const PATH: &'static str = #path_lit;
                /// Canonical segment.
                pub const NAME: &'static str = #name_lit;
                /// Direct capabilities.
                pub const CAPABILITIES: &'static [&'static str] = &[#(#capability_lits),*];
                pub const ALIASES: &'static [&'static str] = &[#(#alias_lits),*];

                #(#children)*
            }
        });
    }

    output
}

/// Generate `NodeDef` entries in declaration (DFS) order.
fn collect_defs(
    nodes: &[Node],
    prefix: &str,
    parent: Option<&str>,
    ns_crate: &TokenStream2,
    out: &mut Vec<TokenStream2>,
) {
    for node in nodes {
        let path = join(prefix, &node.segment);
        let path_lit = LitStr::new(&path, Span::call_site());

        let parent_tokens = match parent {
            Some(pp) => {
                let parent_lit = LitStr::new(pp, Span::call_site());
                quote!(Some(#parent_lit))
            }
            None => quote!(None),
        };
        let capabilities = &node.capabilities;
        let aliases = &node.attrs.aliases;
        let localization = match &node.attrs.localization {
            Some(key) => quote!(Some(#key)),
            None => quote!(None),
        };

        out.push(quote! {
            #ns_crate::NodeDef {
                path: #path_lit,
                parent: #parent_tokens,
                capabilities: &[#(#capabilities),*],
                aliases: &[#(#ns_crate::AliasDef { path: #aliases, localization_key: None }),*],
                localization_key: #localization,
            },
        });

        collect_defs(&node.children, &path, Some(&path), ns_crate, out);
    }
}

fn expand(input: TaxonomyInput, ns_crate: &TokenStream2) -> TokenStream2 {
    let mut defs = Vec::new();
    collect_defs(&input.nodes, "", None, ns_crate, &mut defs);
    let node_count = defs.len();
    let modules = generate_modules(&input.nodes, "");

    let vis = input.vis;
    let root = input.root;

    quote! {
        #[allow(non_snake_case, non_camel_case_types, dead_code)]
        #vis mod #root {
            /// Total number of declared nodes.
            pub const NODE_COUNT: usize = #node_count;

            /// Flat table, parents before children (for `TagGraph::from_defs`).
            pub const TABLE: &'static [#ns_crate::NodeDef] = &[
                #(#defs)*
            ];

            #(#modules)*
        }
    }
}

// =============================================================================
// Entry point
// =============================================================================

/// Declare a tag table inline.
///
/// ```ignore
/// taxonomy! {
///     pub mod lexicon {
///         root {
///             api {
///                 #[alias = "root.api.legacy_nabu"]
///                 nabu: "boolean-leaf";
///             }
///         }
///         "boolean-leaf";
///     }
/// }
///
/// let graph = TagGraph::from_defs(lexicon::TABLE)?;
/// let nabu = graph.resolve_str(lexicon::root::api::nabu::PATH)?;
/// ```
#[proc_macro]
pub fn taxonomy(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as TaxonomyInput);
    expand(input, &tag_graph_crate_path()).into()
}
