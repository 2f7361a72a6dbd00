//! Boilerplate removal over a mutable copy of a parsed document.
//!
//! `scraper::Html` is built for querying, so the pipeline copies it into an
//! owned [`ego_tree::Tree`] first. Extraction keeps working against the
//! original document no matter how many times a page is sanitized.

use crate::parsers::text::compact_markup;
use crate::utils::{alphanumeric_len, truncate_to_bytes};
use ego_tree::{NodeId, NodeMut, NodeRef, Tree};
use scraper::{ElementRef, Html, Node};

/// Tags that rarely carry readable content
const BOILERPLATE_TAGS: &[&str] = &[
    "style", "link", "script", "aside", "button", "svg", "label", "nav", "textarea", "noscript",
    "iframe", "form", "input", "img", "image", "select", "option", "picture", "figure",
    "figcaption", "menu",
];
const BOILERPLATE_IDS: &[&str] = &[
    "header",
    "footer",
    "site-header",
    "site-footer",
    "cookie-banner",
    "outdated",
];
const BOILERPLATE_CLASSES: &[&str] = &["message-bar", "tag", "adwrap", "sidebar"];
/// Matched as substrings of the whole `class` attribute
const NON_CONTENT_CLASS_FRAGMENTS: &[&str] =
    &["related", "cookie", "consent", "sticky", "share", "sr-only"];
const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "rel", "src", "alt", "title", "class", "id", "name", "type",
];
const EMPTY_CANDIDATE_TAGS: &[&str] = &["div", "li", "span", "p"];
const LINK_DENSE_CANDIDATE_TAGS: &[&str] = &["div", "article", "aside", "p"];
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const MAX_FOOTER_CHARS: usize = 1000;
const MAX_CLASS_CHARS: usize = 20;
const MIN_LINK_BLOCK_CHARS: usize = 100;
const MIN_LINK_BLOCK_ANCHORS: usize = 4;
const MAX_NOISE_ALPHANUMERICS: usize = 4;

/// A node of the working tree
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Document,
    Doctype(String),
    Comment(String),
    Text(String),
    Element(ElementData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| key != name);
    }

    /// Whether `class` appears as a whitespace-separated class token
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|token| token == class))
    }

    fn is_one_of(&self, names: &[&str]) -> bool {
        names.contains(&self.name.as_str())
    }
}

impl From<&scraper::node::Element> for ElementData {
    fn from(element: &scraper::node::Element) -> Self {
        Self {
            name: element.name().to_string(),
            attrs: element
                .attrs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// A pass mutates the document and reports how many nodes it touched
type Pass = fn(&mut WorkingDocument) -> usize;

/// Passes in the order they must run; later passes rely on earlier removals
const PASSES: &[(&str, Pass)] = &[
    ("scripts and styles", WorkingDocument::remove_scripts_and_styles),
    ("hidden elements", WorkingDocument::remove_hidden),
    ("display none", WorkingDocument::remove_display_none),
    ("comments", WorkingDocument::remove_comments),
    ("empty blocks", WorkingDocument::remove_empty_blocks),
    ("boilerplate tags", WorkingDocument::remove_boilerplate_tags),
    ("long footers", WorkingDocument::remove_long_footers),
    ("boilerplate ids", WorkingDocument::remove_boilerplate_ids),
    ("boilerplate classes", WorkingDocument::remove_boilerplate_classes),
    ("long classes and data", WorkingDocument::strip_long_classes),
    ("non-content classes", WorkingDocument::remove_non_content_classes),
    ("head", WorkingDocument::remove_head),
    ("span unwrapping", WorkingDocument::unwrap_spans),
    ("link-dense blocks", WorkingDocument::remove_link_dense_blocks),
    ("blank text", WorkingDocument::remove_blank_text),
    ("attribute allow-list", WorkingDocument::strip_disallowed_attributes),
    ("doctype comments", WorkingDocument::remove_doctype_comments),
    ("residual noise", WorkingDocument::remove_residual_noise),
];

/// Owned, mutable copy of a document
#[derive(Debug, Clone)]
pub struct WorkingDocument {
    tree: Tree<DomNode>,
}

impl WorkingDocument {
    /// Copy a parsed document into a mutable tree
    pub fn from_html(html: &Html) -> Self {
        let mut tree = Tree::new(DomNode::Document);
        {
            let mut root = tree.root_mut();
            for child in html.tree.root().children() {
                append_converted(&mut root, child.value(), ElementRef::wrap(child));
            }
        }
        Self { tree }
    }

    pub fn parse(markup: &str) -> Self {
        Self::from_html(&Html::parse_document(markup))
    }

    /// Run every pass in order
    pub fn sanitize(&mut self) -> &mut Self {
        for (name, pass) in PASSES {
            let touched = pass(self);
            ::log::trace!("Sanitize pass '{}' touched {} nodes", name, touched);
        }
        self
    }

    /// Serialize the tree as HTML
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        for child in self.tree.root().children() {
            write_node(child, &mut output);
        }
        output
    }

    /// Serialize, compact and optionally cap at `max_bytes`
    pub fn to_compact_html(&self, max_bytes: Option<usize>) -> String {
        let mut compact = compact_markup(&self.to_html());
        if let Some(max_bytes) = max_bytes {
            truncate_to_bytes(&mut compact, max_bytes);
        }
        compact
    }

    /// Concatenated text of the whole document
    pub fn text(&self) -> String {
        text_content(self.tree.root())
    }

    fn remove_scripts_and_styles(&mut self) -> usize {
        self.remove_elements_where(|element, _| element.is_one_of(&["script", "style"]))
    }

    fn remove_hidden(&mut self) -> usize {
        self.remove_elements_where(|element, _| element.has_attr("hidden"))
    }

    fn remove_display_none(&mut self) -> usize {
        self.remove_elements_where(|element, _| {
            element
                .attr("style")
                .is_some_and(|style| style.contains("display: none"))
        })
    }

    fn remove_comments(&mut self) -> usize {
        self.remove_where(|node| matches!(node.value(), DomNode::Comment(_)))
    }

    fn remove_empty_blocks(&mut self) -> usize {
        self.remove_elements_where(|element, node| {
            element.is_one_of(EMPTY_CANDIDATE_TAGS) && text_content(node).trim().is_empty()
        })
    }

    fn remove_boilerplate_tags(&mut self) -> usize {
        self.remove_elements_where(|element, _| element.is_one_of(BOILERPLATE_TAGS))
    }

    /// Short footers (copyright lines) stay
    fn remove_long_footers(&mut self) -> usize {
        self.remove_elements_where(|element, node| {
            element.name == "footer" && text_content(node).chars().count() > MAX_FOOTER_CHARS
        })
    }

    fn remove_boilerplate_ids(&mut self) -> usize {
        self.remove_elements_where(|element, _| {
            element
                .attr("id")
                .is_some_and(|id| BOILERPLATE_IDS.contains(&id))
        })
    }

    fn remove_boilerplate_classes(&mut self) -> usize {
        self.remove_elements_where(|element, _| {
            BOILERPLATE_CLASSES
                .iter()
                .any(|class| element.has_class(class))
        })
    }

    fn strip_long_classes(&mut self) -> usize {
        let mut touched = 0;
        for id in self.node_ids() {
            let Some(mut node) = self.tree.get_mut(id) else {
                continue;
            };
            if let DomNode::Element(element) = node.value() {
                let before = element.attrs.len();
                if element
                    .attr("class")
                    .is_some_and(|class| class.chars().count() > MAX_CLASS_CHARS)
                {
                    element.remove_attr("class");
                }
                element.remove_attr("data");
                touched += before - element.attrs.len();
            }
        }
        touched
    }

    fn remove_non_content_classes(&mut self) -> usize {
        self.remove_elements_where(|element, _| {
            element.attr("class").is_some_and(|class| {
                NON_CONTENT_CLASS_FRAGMENTS
                    .iter()
                    .any(|fragment| class.contains(fragment))
            })
        })
    }

    fn remove_head(&mut self) -> usize {
        self.remove_elements_where(|element, _| element.name == "head")
    }

    /// Replace each `<span>` by a text node holding its text
    fn unwrap_spans(&mut self) -> usize {
        let mut touched = 0;
        for id in self.node_ids() {
            if !self.is_attached(id) {
                continue;
            }
            let text = match self.tree.get(id) {
                Some(node) if is_span(node) => text_content(node),
                _ => continue,
            };
            if let Some(mut span) = self.tree.get_mut(id) {
                span.insert_before(DomNode::Text(text));
                span.detach();
                touched += 1;
            }
        }
        touched
    }

    /// Blocks of 100+ characters made mostly of links (menus, tag clouds)
    fn remove_link_dense_blocks(&mut self) -> usize {
        self.remove_elements_where(|element, node| {
            if !element.is_one_of(LINK_DENSE_CANDIDATE_TAGS) {
                return false;
            }
            let text_len = text_content(node).chars().count();
            if text_len < MIN_LINK_BLOCK_CHARS {
                return false;
            }
            let anchors = node
                .descendants()
                .skip(1)
                .filter(|descendant| {
                    matches!(descendant.value(), DomNode::Element(element) if element.name == "a")
                })
                .count();
            anchors > MIN_LINK_BLOCK_ANCHORS && anchors > text_len / 10
        })
    }

    fn remove_blank_text(&mut self) -> usize {
        self.remove_where(|node| matches!(node.value(), DomNode::Text(text) if text.trim().is_empty()))
    }

    fn strip_disallowed_attributes(&mut self) -> usize {
        let mut touched = 0;
        for id in self.node_ids() {
            let Some(mut node) = self.tree.get_mut(id) else {
                continue;
            };
            if let DomNode::Element(element) = node.value() {
                let before = element.attrs.len();
                element
                    .attrs
                    .retain(|(key, _)| ALLOWED_ATTRIBUTES.contains(&key.as_str()));
                touched += before - element.attrs.len();
            }
        }
        touched
    }

    fn remove_doctype_comments(&mut self) -> usize {
        self.remove_where(|node| {
            matches!(node.value(), DomNode::Comment(comment) if comment.trim().starts_with("<!DOCTYPE"))
        })
    }

    /// Leaf elements with almost no text (icons, stray bullets)
    fn remove_residual_noise(&mut self) -> usize {
        self.remove_elements_where(|_, node| {
            let has_child_elements = node
                .children()
                .any(|child| matches!(child.value(), DomNode::Element(_)));
            !has_child_elements && alphanumeric_len(&text_content(node)) <= MAX_NOISE_ALPHANUMERICS
        })
    }

    /// Every attached node id in document order
    fn node_ids(&self) -> Vec<NodeId> {
        self.tree.root().descendants().map(|node| node.id()).collect()
    }

    fn is_attached(&self, id: NodeId) -> bool {
        let root = self.tree.root().id();
        self.tree
            .get(id)
            .is_some_and(|node| node.ancestors().last().is_some_and(|top| top.id() == root))
    }

    /// Detach every node matching `predicate`, visiting in document order and
    /// evaluating against the tree as it stands at that moment
    fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(NodeRef<'_, DomNode>) -> bool,
    {
        let mut removed = 0;
        for id in self.node_ids() {
            if !self.is_attached(id) {
                continue;
            }
            let matched = self.tree.get(id).is_some_and(&mut predicate);
            if matched {
                if let Some(mut node) = self.tree.get_mut(id) {
                    node.detach();
                    removed += 1;
                }
            }
        }
        removed
    }

    fn remove_elements_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&ElementData, NodeRef<'_, DomNode>) -> bool,
    {
        self.remove_where(|node| match node.value() {
            DomNode::Element(element) => predicate(element, node),
            _ => false,
        })
    }
}

/// Sanitize a parsed document and return its compacted serialization
pub fn clean_html(html: &Html, max_bytes: Option<usize>) -> String {
    let mut working = WorkingDocument::from_html(html);
    working.sanitize();
    working.to_compact_html(max_bytes)
}

fn append_converted(parent: &mut NodeMut<'_, DomNode>, node: &Node, element: Option<ElementRef<'_>>) {
    match (node, element) {
        (Node::Element(data), Some(element)) => {
            let mut child = parent.append(DomNode::Element(ElementData::from(data)));
            for grandchild in element.children() {
                append_converted(&mut child, grandchild.value(), ElementRef::wrap(grandchild));
            }
        }
        (Node::Text(text), _) => {
            parent.append(DomNode::Text(String::from(&**text)));
        }
        (Node::Comment(comment), _) => {
            parent.append(DomNode::Comment(String::from(&**comment)));
        }
        (Node::Doctype(doctype), _) => {
            parent.append(DomNode::Doctype(doctype.name().to_string()));
        }
        _ => {}
    }
}

fn is_span(node: NodeRef<'_, DomNode>) -> bool {
    matches!(node.value(), DomNode::Element(element) if element.name == "span")
}

fn text_content(node: NodeRef<'_, DomNode>) -> String {
    node.descendants()
        .filter_map(|descendant| match descendant.value() {
            DomNode::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn write_node(node: NodeRef<'_, DomNode>, output: &mut String) {
    match node.value() {
        DomNode::Document => {
            for child in node.children() {
                write_node(child, output);
            }
        }
        DomNode::Doctype(name) => {
            output.push_str("<!DOCTYPE ");
            output.push_str(name);
            output.push('>');
        }
        DomNode::Comment(comment) => {
            output.push_str("<!--");
            output.push_str(comment);
            output.push_str("-->");
        }
        DomNode::Text(text) => escape_into(text, false, output),
        DomNode::Element(element) => {
            output.push('<');
            output.push_str(&element.name);
            for (key, value) in &element.attrs {
                output.push(' ');
                output.push_str(key);
                output.push_str("=\"");
                escape_into(value, true, output);
                output.push('"');
            }
            output.push('>');

            if element.is_one_of(VOID_ELEMENTS) {
                return;
            }
            for child in node.children() {
                write_node(child, output);
            }
            output.push_str("</");
            output.push_str(&element.name);
            output.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, output: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '"' if attribute => output.push_str("&quot;"),
            '<' if !attribute => output.push_str("&lt;"),
            '>' if !attribute => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            c => output.push(c),
        }
    }
}
