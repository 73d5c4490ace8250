//! Read-only structural access to a rendered page.
//!
//! The extractor and the auto-expander only see [`PageDom`] and [`DomNode`]; the
//! production implementation wraps a parsed `scraper` document, tests use canned trees.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

pub trait PageDom {
    type Node<'a>: DomNode
    where
        Self: 'a;

    /// Address the page was loaded from; relative `href`/`src` resolve against it.
    fn location(&self) -> &str;

    fn select_first(&self, selector: &str) -> Option<Self::Node<'_>>;

    fn select_all(&self, selector: &str) -> Vec<Self::Node<'_>>;

    /// Clicks an interactive control.
    fn activate(&self, _node: &Self::Node<'_>) -> anyhow::Result<()> {
        anyhow::bail!("page does not support interaction")
    }
}

pub trait DomNode: Sized {
    /// Rendered text, roughly what a browser's `innerText` returns.
    fn inner_text(&self) -> String;

    /// Attribute value resolved to an absolute URL (`href`, `src`).
    fn url_attr(&self, name: &str) -> Option<String>;

    fn select_first(&self, selector: &str) -> Option<Self>;
}

/// Parsed HTML snapshot of a page.
pub struct HtmlPage {
    document: Html,
    location: Url,
}

impl HtmlPage {
    pub fn parse(html: &str, location: Url) -> Self {
        Self {
            document: Html::parse_document(html),
            location,
        }
    }
}

impl PageDom for HtmlPage {
    type Node<'a> = HtmlNode<'a>;

    fn location(&self) -> &str {
        self.location.as_str()
    }

    fn select_first(&self, selector: &str) -> Option<HtmlNode<'_>> {
        let selector = parse_selector(selector)?;
        self.document
            .select(&selector)
            .next()
            .map(|element| HtmlNode {
                element,
                base: &self.location,
            })
    }

    fn select_all(&self, selector: &str) -> Vec<HtmlNode<'_>> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .map(|element| HtmlNode {
                element,
                base: &self.location,
            })
            .collect()
    }

    fn activate(&self, node: &HtmlNode<'_>) -> anyhow::Result<()> {
        anyhow::bail!(
            "static page snapshot cannot activate <{}> ({:?}); expand the set in the browser before saving",
            node.element.value().name(),
            node.inner_text()
        )
    }
}

#[derive(Clone, Copy)]
pub struct HtmlNode<'a> {
    element: ElementRef<'a>,
    base: &'a Url,
}

impl DomNode for HtmlNode<'_> {
    fn inner_text(&self) -> String {
        let mut out = String::new();
        push_inner_text(self.element, &mut out);
        out
    }

    fn url_attr(&self, name: &str) -> Option<String> {
        let raw = self.element.value().attr(name)?.trim();
        if raw.is_empty() {
            return None;
        }
        match self.base.join(raw) {
            Ok(url) => Some(url.to_string()),
            Err(err) => {
                tracing::debug!(attr = name, raw, ?err, "unresolvable url attribute");
                Some(raw.to_owned())
            }
        }
    }

    fn select_first(&self, selector: &str) -> Option<Self> {
        let selector = parse_selector(selector)?;
        self.element.select(&selector).next().map(|element| HtmlNode {
            element,
            base: self.base,
        })
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(err) => {
            tracing::warn!(selector, %err, "invalid selector; treating as no match");
            None
        }
    }
}

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

fn push_inner_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(el) => {
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                match el.name() {
                    "br" => out.push('\n'),
                    "script" | "style" | "template" | "noscript" => {}
                    name if BLOCK_ELEMENTS.contains(&name) => {
                        out.push('\n');
                        push_inner_text(child_element, out);
                        out.push('\n');
                    }
                    _ => push_inner_text(child_element, out),
                }
            }
            _ => {}
        }
    }
}

// Source whitespace is not significant; only <br> and block boundaries produce newlines.
fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() && ch != '\u{a0}' {
            if !out.ends_with([' ', '\n']) && !out.is_empty() {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Canned node trees for extractor tests.

    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::{DomNode, PageDom};

    #[derive(Debug, Clone, Default)]
    pub struct FakeNode {
        pub text: String,
        pub attrs: HashMap<String, String>,
        pub children: HashMap<String, FakeNode>,
    }

    impl FakeNode {
        pub fn text(text: &str) -> Self {
            Self {
                text: text.to_owned(),
                ..Self::default()
            }
        }

        pub fn with_attr(mut self, name: &str, value: &str) -> Self {
            self.attrs.insert(name.to_owned(), value.to_owned());
            self
        }

        pub fn with_child(mut self, selector: &str, child: FakeNode) -> Self {
            self.children.insert(selector.to_owned(), child);
            self
        }
    }

    impl DomNode for FakeNode {
        fn inner_text(&self) -> String {
            self.text.clone()
        }

        fn url_attr(&self, name: &str) -> Option<String> {
            self.attrs.get(name).cloned()
        }

        fn select_first(&self, selector: &str) -> Option<Self> {
            self.children.get(selector).cloned()
        }
    }

    #[derive(Debug, Default)]
    pub struct FakePage {
        pub location: String,
        pub nodes: HashMap<String, Vec<FakeNode>>,
        pub activated: RefCell<Vec<String>>,
        pub fail_activation: bool,
    }

    impl FakePage {
        pub fn new(location: &str) -> Self {
            Self {
                location: location.to_owned(),
                ..Self::default()
            }
        }

        pub fn with(mut self, selector: &str, nodes: Vec<FakeNode>) -> Self {
            self.nodes.insert(selector.to_owned(), nodes);
            self
        }
    }

    impl PageDom for FakePage {
        type Node<'a> = FakeNode;

        fn location(&self) -> &str {
            &self.location
        }

        fn select_first(&self, selector: &str) -> Option<FakeNode> {
            self.nodes.get(selector).and_then(|n| n.first()).cloned()
        }

        fn select_all(&self, selector: &str) -> Vec<FakeNode> {
            self.nodes.get(selector).cloned().unwrap_or_default()
        }

        fn activate(&self, node: &FakeNode) -> anyhow::Result<()> {
            if self.fail_activation {
                anyhow::bail!("detached control");
            }
            self.activated.borrow_mut().push(node.text.clone());
            Ok(())
        }
    }
}
