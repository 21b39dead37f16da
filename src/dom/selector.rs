use std::fmt;

use cssparser::{ParserInput, ToCss};
use precomputed_hash::PrecomputedHash;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{
    self, ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::{self, ParseRelative, SelectorList, SelectorParseErrorKind};
use selectors::{NthIndexCache, OpaqueElement};

use crate::error::{BlitzError, Result};

use super::{NodeId, Page};

/// A parsed CSS selector list, matched against any [`Page`].
#[derive(Clone)]
pub struct Selector {
    source: String,
    selectors: Vec<parser::Selector<Simple>>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let mut input = ParserInput::new(source);
        let mut css = cssparser::Parser::new(&mut input);
        let list = SelectorList::parse(&SelectorParser, &mut css, ParseRelative::No).map_err(
            |err| BlitzError::Selector {
                selector: source.to_string(),
                reason: format!("{:?}", err.kind),
            },
        )?;

        Ok(Self {
            source: source.to_string(),
            selectors: list.0.into_vec(),
        })
    }

    pub fn matches<P: Page + ?Sized>(&self, page: &P, node: NodeId) -> bool {
        let mut nth_index_cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut nth_index_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        let element = PageElement { page, node };
        self.selectors
            .iter()
            .any(|selector| matching::matches_selector(selector, 0, None, &element, &mut context))
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Selector {}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Selector flavour for page documents: no namespaces, no pseudo-classes
/// beyond the tree-structural ones the parser knows itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simple;

impl parser::SelectorImpl for Simple {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssName;
    type LocalName = CssName;
    type NamespacePrefix = CssName;
    type NamespaceUrl = CssName;
    type BorrowedNamespaceUrl = CssName;
    type BorrowedLocalName = CssName;

    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

struct SelectorParser;

impl<'i> parser::Parser<'i> for SelectorParser {
    type Impl = Simple;
    type Error = SelectorParseErrorKind<'i>;
}

/// Identifier, tag or class name inside a selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssName(String);

impl From<&str> for CssName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl ToCss for CssName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        cssparser::serialize_identifier(&self.0, dest)
    }
}

impl PrecomputedHash for CssName {
    fn precomputed_hash(&self) -> u32 {
        // FNV-1a
        self.0.bytes().fold(0x811c_9dc5, |hash: u32, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
        })
    }
}

/// Attribute value operand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssString(String);

impl From<&str> for CssString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for CssString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssString {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        cssparser::serialize_string(&self.0, dest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonTSPseudoClass {}

impl parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = Simple;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {}

impl parser::PseudoElement for PseudoElement {
    type Impl = Simple;
}

impl ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

/// A node of a page as the matcher sees it.
struct PageElement<'a, P: ?Sized> {
    page: &'a P,
    node: NodeId,
}

impl<P: ?Sized> Clone for PageElement<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized> Copy for PageElement<'_, P> {}

impl<P: Page + ?Sized> fmt::Debug for PageElement<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageElement")
            .field("tag", &self.page.tag(self.node))
            .field("node", &self.node)
            .finish()
    }
}

impl<'a, P: Page + ?Sized> PageElement<'a, P> {
    fn at(&self, node: NodeId) -> Self {
        Self {
            page: self.page,
            node,
        }
    }

    fn siblings(&self) -> Option<(&'a [NodeId], usize)> {
        let siblings = self.page.children(self.page.parent(self.node)?);
        let index = siblings.iter().position(|&n| n == self.node)?;
        Some((siblings, index))
    }
}

impl<P: Page + ?Sized> selectors::Element for PageElement<'_, P> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        static DETACHED: u8 = 0;
        // A node's slot in its parent's child list is unique to it
        match self.siblings() {
            Some((siblings, index)) => OpaqueElement::new(&siblings[index]),
            None => OpaqueElement::new(&DETACHED),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        self.page.parent(self.node).map(|parent| self.at(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let (siblings, index) = self.siblings()?;
        index.checked_sub(1).map(|prev| self.at(siblings[prev]))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let (siblings, index) = self.siblings()?;
        siblings.get(index + 1).map(|&next| self.at(next))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.page.children(self.node).first().map(|&child| self.at(child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssName) -> bool {
        self.page.tag(self.node).eq_ignore_ascii_case(&name.0)
    }

    fn has_namespace(&self, namespace: &CssName) -> bool {
        namespace.0.is_empty()
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.page.tag(self.node) == other.page.tag(other.node)
    }

    fn attr_matches(
        &self,
        _ns: &NamespaceConstraint<&CssName>,
        local_name: &CssName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        self.page
            .attr(self.node, &local_name.0)
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<Simple>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<Simple>,
    ) -> bool {
        match *pe {}
    }

    fn is_link(&self) -> bool {
        matches!(self.page.tag(self.node), "a" | "area" | "link")
            && self.page.attr(self.node, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &CssName, case_sensitivity: CaseSensitivity) -> bool {
        self.page
            .attr(self.node, "id")
            .is_some_and(|value| case_sensitivity.eq(value.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &CssName, case_sensitivity: CaseSensitivity) -> bool {
        self.page.attr(self.node, "class").is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
        })
    }

    fn imported_part(&self, _name: &CssName) -> Option<CssName> {
        None
    }

    fn is_part(&self, _name: &CssName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.page.children(self.node).is_empty() && self.page.text(self.node).is_empty()
    }

    fn is_root(&self) -> bool {
        self.page.parent(self.node).is_none()
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}
}
