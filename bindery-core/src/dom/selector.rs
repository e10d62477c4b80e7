//! Selector Matching
//!
//! Selectors are parsed and matched by the `selectors` crate, the engine that
//! `scraper` is built on. This module supplies what that engine needs from
//! the document layer: a [`SelectorImpl`] naming the string and pseudo-class
//! types, and a parser hook for the pseudo-classes that depend on form state.
//!
//! Everything structural is handled by the engine: combinators (` `, `>`,
//! `+`, `~`), attribute operators, `:not()`, `:first-child`, `:nth-child()`
//! and friends. On top of that, `:checked`, `:disabled` and `:enabled` are
//! recognised here and evaluated by the document's element view.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use cssparser::{CowRcStr, ParseError, ParserInput, SourceLocation, ToCss};
use precomputed_hash::PrecomputedHash;
use selectors::context::QuirksMode;
use selectors::matching::{self, MatchingContext, MatchingMode};
use selectors::parser::{self, SelectorImpl, SelectorList, SelectorParseErrorKind};

use crate::error::DomError;

/// Names: tags, attributes, ids, classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct CssIdent(String);

impl CssIdent {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for CssIdent {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CssIdent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssIdent {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        cssparser::serialize_identifier(&self.0, dest)
    }
}

impl fmt::Display for CssIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_css(f)
    }
}

impl PrecomputedHash for CssIdent {
    fn precomputed_hash(&self) -> u32 {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish() as u32
    }
}

/// Attribute values on the right of `=`, `~=`, `^=` and the other operators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CssValue(String);

impl<'a> From<&'a str> for CssValue {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CssValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssValue {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        cssparser::serialize_string(&self.0, dest)
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_css(f)
    }
}

/// Pseudo-classes that read element state rather than tree shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PseudoClass {
    Checked,
    Disabled,
    Enabled,
}

impl PseudoClass {
    fn name(&self) -> &'static str {
        match self {
            PseudoClass::Checked => "checked",
            PseudoClass::Disabled => "disabled",
            PseudoClass::Enabled => "enabled",
        }
    }
}

impl ToCss for PseudoClass {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_char(':')?;
        dest.write_str(self.name())
    }
}

impl parser::NonTSPseudoClass for PseudoClass {
    type Impl = BinderySelectors;

    fn is_active_or_hover(&self) -> bool {
        false
    }

    fn is_user_action_state(&self) -> bool {
        false
    }

    fn has_zero_specificity(&self) -> bool {
        false
    }
}

/// No pseudo-elements are supported; `::before` and the like fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PseudoElement {}

impl ToCss for PseudoElement {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

impl parser::PseudoElement for PseudoElement {
    type Impl = BinderySelectors;
}

/// The selector vocabulary of the document layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BinderySelectors;

impl SelectorImpl for BinderySelectors {
    type ExtraMatchingData = ();
    type AttrValue = CssValue;
    type Identifier = CssIdent;
    type ClassName = CssIdent;
    type PartName = CssIdent;
    type LocalName = CssIdent;
    type NamespaceUrl = CssIdent;
    type NamespacePrefix = CssIdent;
    type BorrowedNamespaceUrl = CssIdent;
    type BorrowedLocalName = CssIdent;
    type NonTSPseudoClass = PseudoClass;
    type PseudoElement = PseudoElement;
}

struct SelectorParser;

impl<'i> parser::Parser<'i> for SelectorParser {
    type Impl = BinderySelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoClass, ParseError<'i, SelectorParseErrorKind<'i>>> {
        [PseudoClass::Checked, PseudoClass::Disabled, PseudoClass::Enabled]
            .into_iter()
            .find(|pc| name.eq_ignore_ascii_case(pc.name()))
            .ok_or_else(|| {
                location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(
                    name,
                ))
            })
    }
}

/// A parsed, comma-separated selector list.
pub(crate) struct SelectorGroup(SelectorList<BinderySelectors>);

impl SelectorGroup {
    /// Parse `selector`, reporting malformed input as
    /// [`DomError::InvalidSelector`].
    pub(crate) fn parse(selector: &str) -> Result<Self, DomError> {
        let mut input = ParserInput::new(selector);
        let mut css = cssparser::Parser::new(&mut input);
        SelectorList::parse(&SelectorParser, &mut css)
            .map(Self)
            .map_err(|error| {
                let reason = format!("{:?} at column {}", error.kind, error.location.column);
                DomError::invalid_selector(selector, reason)
            })
    }

    /// Whether any selector in the group matches `element`.
    pub(crate) fn matches<E>(&self, element: &E) -> bool
    where
        E: selectors::Element<Impl = BinderySelectors>,
    {
        let mut context =
            MatchingContext::new(MatchingMode::Normal, None, None, QuirksMode::NoQuirks);
        matching::matches_selector_list(&self.0, element, &mut context)
    }
}

impl fmt::Debug for SelectorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorGroup").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(selector: &str) -> String {
        match SelectorGroup::parse(selector) {
            Err(DomError::InvalidSelector { reason, .. }) => reason,
            other => panic!("{selector:?} parsed: {other:?}"),
        }
    }

    #[test]
    fn parses_full_selector_syntax() {
        for selector in [
            "ul > li",
            "ul li, ol li",
            "li:first-child",
            "li:nth-child(2n + 1)",
            "li + li",
            "li ~ li",
            "[class~=a]",
            "[lang|=en]",
            "a[href^=\"https\"]",
            "input:checked",
            "input:not([type=checkbox])",
            "*",
            "#main .item",
        ] {
            assert!(SelectorGroup::parse(selector).is_ok(), "{selector:?} rejected");
        }
    }

    #[test]
    fn pseudo_class_names_ignore_case() {
        assert!(SelectorGroup::parse("input:CHECKED").is_ok());
        assert!(SelectorGroup::parse("input:Disabled").is_ok());
    }

    #[test]
    fn rejects_malformed_selectors() {
        for selector in ["ul >", "", "[", "li:bogus", "li::before", "a,,b", "#"] {
            assert!(!reason(selector).is_empty(), "{selector:?}");
        }
    }

    #[test]
    fn error_names_the_selector() {
        let error = SelectorGroup::parse("li:bogus").unwrap_err();
        assert!(error.to_string().contains("li:bogus"));
    }

    #[test]
    fn ident_hash_is_stable() {
        let a = CssIdent::from("li");
        let b = CssIdent::from("li");
        assert_eq!(a.precomputed_hash(), b.precomputed_hash());
        assert_eq!(a.as_str(), "li");
    }
}
