//! Selectors Level 3 subset used by the page host for element lookups.
//! Reference: <https://www.w3.org/TR/selectors-3/>
//!
//! Supported:
//! - Type, class, id and universal selectors
//! - Attribute selectors: `[name]`, `[name=v]`, `[name^=v]`, `[name$=v]`, `[name*=v]`
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - Comma separated selector lists

mod matcher;
mod parser;

// Re-export public API
pub use matcher::{matches_complex, matches_compound, matches_selector_list};
pub use parser::{parse_complex_selector, parse_selector_list};

/// An adapter that abstracts DOM access for selector matching.
/// Implement this for your DOM layer.
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// Parent element if any.
    /// Selectors-3, Section 11: Combinators (for tree relationships)
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element (skip non-elements if your DOM has mixed nodes).
    /// Selectors-3, Section 11: Sibling combinators
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Tag name in ASCII lowercase (per HTML parsing conventions).
    fn tag_name(&self, element: Self::Handle) -> Option<&str>;

    /// True if the element has the given class token.
    fn has_class(&self, element: Self::Handle, class: &str) -> bool;

    /// Returns the attribute value if present. The `id` attribute is looked up here too.
    fn attr(&self, element: Self::Handle, name: &str) -> Option<&str>;
}

/// Attribute comparison operators.
/// Selectors-3, Section 6.3, 6.3.2: attribute presence and substring matching
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrOperator {
    /// `[name]`
    Exists,
    /// `[name=value]`
    Equals,
    /// `[name^=value]`
    Prefix,
    /// `[name$=value]`
    Suffix,
    /// `[name*=value]`
    Contains,
}

impl AttrOperator {
    /// Compare an attribute value against the selector operand.
    pub fn matches(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Exists => true,
            Self::Equals => actual == expected,
            // Empty operands never match for substring operators (Section 6.3.2).
            Self::Prefix => !expected.is_empty() && actual.starts_with(expected),
            Self::Suffix => !expected.is_empty() && actual.ends_with(expected),
            Self::Contains => !expected.is_empty() && actual.contains(expected),
        }
    }
}

/// Simple selectors (subset).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    /// Selectors-3, Section 5: Type selectors
    Type(String),
    /// Selectors-3, Section 6.4: Class selectors
    Class(String),
    /// Selectors-3, Section 6.5: ID selectors
    IdSelector(String),
    /// Selectors-3, Section 6.3: Attribute selectors
    Attribute {
        name: String,
        operator: AttrOperator,
        value: String,
    },
    /// Universal selector '*'.
    Universal,
}

/// A compound selector is a sequence of simple selectors (no combinators).
/// Selectors-3, Section 5: Simple selector sequences
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

/// Combinators between compounds.
/// Selectors-3, Section 8: Combinators
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// A complex selector is one or more compounds separated by combinators.
/// `rest` is ordered left to right; each combinator relates the previous compound to its own.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

/// A selector list separated by commas.
/// Selectors-3, Section 4: Groups of selectors
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// True when parsing produced no usable selector.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}
