//! CSS selector parsing.
//! Reference: <https://www.w3.org/TR/selectors-3/>

use crate::{
    AttrOperator, Combinator, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector,
};
use core::mem::take;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
pub enum Tok {
    /// A combinator token like child/adjacent/general sibling.
    Combinator(Combinator),
    /// Whitespace that implies a descendant combinator.
    DescendantWS,
    /// A simple selector token (type, class, id, attribute, universal).
    Simple(SimpleSelector),
    /// Syntax this subset does not understand (pseudo-classes, namespaces, ...).
    Unsupported,
}

/// Tokenizer over a selector string.
pub struct SelectorTokenizer {
    /// Underlying owned bytes for the selector.
    input_bytes: Vec<u8>,
    /// Current cursor index into `input_bytes`.
    index: usize,
    /// Whether we should emit a descendant whitespace token on `next()` call.
    pending_whitespace: bool,
}

impl SelectorTokenizer {
    /// Construct a tokenizer from input.
    #[inline]
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input_bytes: input.trim().as_bytes().to_vec(),
            index: 0,
            pending_whitespace: false,
        }
    }

    /// Return the next selector token, if any.
    #[inline]
    pub(crate) fn next(&mut self) -> Option<Tok> {
        self.skip_whitespace_descendant();
        if self.pending_whitespace {
            self.pending_whitespace = false;
            return Some(Tok::DescendantWS);
        }
        let &current = self.input_bytes.get(self.index)?;
        let token = match current {
            b'*' => {
                self.bump();
                Tok::Simple(SimpleSelector::Universal)
            }
            b'.' => self.consume_class(),
            b'#' => self.consume_id(),
            b'[' => self.consume_attr(),
            b'>' => {
                self.bump();
                self.skip_spaces();
                Tok::Combinator(Combinator::Child)
            }
            b'+' => {
                self.bump();
                self.skip_spaces();
                Tok::Combinator(Combinator::AdjacentSibling)
            }
            b'~' => {
                self.bump();
                self.skip_spaces();
                Tok::Combinator(Combinator::GeneralSibling)
            }
            byte if is_ident_byte(byte) => self.consume_type(),
            _ => {
                self.bump();
                Tok::Unsupported
            }
        };
        Some(token)
    }

    #[inline]
    fn bump(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    /// Skip whitespace and mark that a descendant combinator should be emitted next,
    /// unless an explicit combinator follows.
    #[inline]
    fn skip_whitespace_descendant(&mut self) {
        let mut saw = false;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_whitespace() {
                saw = true;
                self.bump();
            } else {
                break;
            }
        }
        let explicit = matches!(self.input_bytes.get(self.index), Some(b'>' | b'+' | b'~'));
        if saw && !explicit && self.index > 0 {
            self.pending_whitespace = true;
        }
    }

    /// Consume an identifier consisting of ASCII alphanumerics, '-' and '_'.
    #[inline]
    fn consume_ident(&mut self) -> String {
        let start = self.index;
        while self
            .input_bytes
            .get(self.index)
            .is_some_and(|&byte| is_ident_byte(byte))
        {
            self.bump();
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    /// Parse a type selector identifier into a `SimpleSelector::Type` (lowercased).
    #[inline]
    fn consume_type(&mut self) -> Tok {
        let ident = self.consume_ident();
        Tok::Simple(SimpleSelector::Type(ident.to_ascii_lowercase()))
    }

    /// Parse a class selector following '.' into `SimpleSelector::Class`.
    #[inline]
    fn consume_class(&mut self) -> Tok {
        self.bump();
        let ident = self.consume_ident();
        if ident.is_empty() {
            return Tok::Unsupported;
        }
        Tok::Simple(SimpleSelector::Class(ident))
    }

    /// Parse an id selector following '#' into `SimpleSelector::IdSelector`.
    #[inline]
    fn consume_id(&mut self) -> Tok {
        self.bump();
        let ident = self.consume_ident();
        if ident.is_empty() {
            return Tok::Unsupported;
        }
        Tok::Simple(SimpleSelector::IdSelector(ident))
    }

    /// Parse an attribute selector, supporting presence, `=`, `^=`, `$=` and `*=`
    /// with quoted or unquoted values.
    #[inline]
    fn consume_attr(&mut self) -> Tok {
        self.bump();
        self.skip_spaces();
        let name = self.consume_ident().to_ascii_lowercase();
        if name.is_empty() {
            return Tok::Unsupported;
        }
        self.skip_spaces();
        let operator = match self.input_bytes.get(self.index).copied() {
            Some(b']') => AttrOperator::Exists,
            Some(b'=') => AttrOperator::Equals,
            Some(b'^') => AttrOperator::Prefix,
            Some(b'$') => AttrOperator::Suffix,
            Some(b'*') => AttrOperator::Contains,
            _ => return Tok::Unsupported,
        };
        let mut value = String::new();
        if operator != AttrOperator::Exists {
            if operator != AttrOperator::Equals {
                self.bump();
            }
            if self.input_bytes.get(self.index) != Some(&b'=') {
                return Tok::Unsupported;
            }
            self.bump();
            self.skip_spaces();
            value = match self.input_bytes.get(self.index).copied() {
                Some(quote @ (b'"' | b'\'')) => {
                    self.bump();
                    self.consume_quoted_attr_value(quote)
                }
                _ => self.consume_unquoted_attr_value(),
            };
            self.skip_spaces();
        }
        if self.input_bytes.get(self.index) != Some(&b']') {
            return Tok::Unsupported;
        }
        self.bump();
        Tok::Simple(SimpleSelector::Attribute {
            name,
            operator,
            value,
        })
    }

    /// Consume an unquoted attribute value until whitespace or a closing bracket.
    #[inline]
    fn consume_unquoted_attr_value(&mut self) -> String {
        let start = self.index;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_whitespace() || byte == b']' {
                break;
            }
            self.bump();
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    /// Consume a quoted attribute value until the matching quote byte.
    #[inline]
    fn consume_quoted_attr_value(&mut self, quote: u8) -> String {
        let start = self.index;
        while matches!(self.input_bytes.get(self.index), Some(&byte) if byte != quote) {
            self.bump();
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        let out = String::from_utf8_lossy(slice).into_owned();
        if self.input_bytes.get(self.index).is_some() {
            self.bump();
        }
        out
    }

    /// Skip ASCII whitespace.
    #[inline]
    fn skip_spaces(&mut self) {
        while matches!(self.input_bytes.get(self.index), Some(byte) if byte.is_ascii_whitespace()) {
            self.bump();
        }
    }
}

#[inline]
const fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Parse a selector list from CSS text. Selectors using unsupported syntax are dropped.
/// Selectors-3, Section 4: Groups of selectors
pub fn parse_selector_list(input: &str) -> SelectorList {
    let selectors = split_top_level_commas(input)
        .into_iter()
        .filter_map(parse_complex_selector)
        .collect();
    SelectorList { selectors }
}

/// Split on commas outside attribute brackets and quoted strings.
fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut bracket_depth = 0usize;
    let mut quote: Option<u8> = None;
    for (index, byte) in input.bytes().enumerate() {
        match (quote, byte) {
            (Some(open), _) if byte == open => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(byte),
            (None, b'[') => bracket_depth += 1,
            (None, b']') => bracket_depth = bracket_depth.saturating_sub(1),
            (None, b',') if bracket_depth == 0 => {
                parts.push(&input[start..index]);
                start = index + 1;
            }
            (None, _) => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Parse one complex selector. Returns `None` for empty input or unsupported syntax.
/// Selectors-3, Section 8: Combinators; Section 5–6: simple selectors
pub fn parse_complex_selector(input: &str) -> Option<ComplexSelector> {
    let mut tokens = SelectorTokenizer::new(input);
    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current = CompoundSelector::default();

    while let Some(token) = tokens.next() {
        match token {
            Tok::Unsupported => return None,
            Tok::Combinator(comb) if !current.simples.is_empty() => {
                compounds.push(take(&mut current));
                combinators.push(comb);
            }
            Tok::DescendantWS if !current.simples.is_empty() => {
                compounds.push(take(&mut current));
                combinators.push(Combinator::Descendant);
            }
            // A combinator with no left-hand compound is a syntax error.
            Tok::Combinator(_) | Tok::DescendantWS => return None,
            Tok::Simple(simple) => current.simples.push(simple),
        }
    }
    // A trailing combinator without a right-hand compound is a syntax error.
    if current.simples.is_empty() {
        return None;
    }
    compounds.push(current);

    let mut compounds = compounds.into_iter();
    let first = compounds.next()?;
    let rest = combinators.into_iter().zip(compounds).collect();
    Some(ComplexSelector { first, rest })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_descendant_and_attribute_operators() {
        let parsed = parse_complex_selector(".nav-links a[href^=\"#\"]");
        let Some(selector) = parsed else {
            panic!("selector should parse");
        };
        assert_eq!(
            selector.first.simples,
            vec![SimpleSelector::Class("nav-links".to_owned())]
        );
        assert_eq!(selector.rest.len(), 1);
        let (comb, compound) = &selector.rest[0];
        assert_eq!(*comb, Combinator::Descendant);
        assert_eq!(
            compound.simples,
            vec![
                SimpleSelector::Type("a".to_owned()),
                SimpleSelector::Attribute {
                    name: "href".to_owned(),
                    operator: AttrOperator::Prefix,
                    value: "#".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn child_combinator_with_spaces_is_not_descendant() {
        let Some(selector) = parse_complex_selector("ul > li") else {
            panic!("selector should parse");
        };
        assert_eq!(selector.rest.len(), 1);
        assert_eq!(selector.rest[0].0, Combinator::Child);
    }

    #[test]
    fn unsupported_syntax_drops_only_that_selector() {
        let list = parse_selector_list("a:hover, .reveal, [data-count]");
        assert_eq!(list.selectors.len(), 2);
        assert!(parse_complex_selector("> a").is_none());
        assert!(parse_complex_selector("").is_none());
    }

    #[test]
    fn commas_inside_quoted_values_do_not_split_the_list() {
        let list = parse_selector_list("a[title=\"a,b\"], img[alt='x, y'] , .cta");
        assert_eq!(list.selectors.len(), 3);
        assert_eq!(
            list.selectors[0].first.simples[1],
            SimpleSelector::Attribute {
                name: "title".to_owned(),
                operator: AttrOperator::Equals,
                value: "a,b".to_owned(),
            }
        );
        assert_eq!(parse_selector_list("a[title=\"a,b\"]").selectors.len(), 1);
    }

    #[test]
    fn class_and_id_keep_their_case() {
        let Some(selector) = parse_complex_selector("DIV#backToTop.isOpen") else {
            panic!("selector should parse");
        };
        assert_eq!(
            selector.first.simples,
            vec![
                SimpleSelector::Type("div".to_owned()),
                SimpleSelector::IdSelector("backToTop".to_owned()),
                SimpleSelector::Class("isOpen".to_owned()),
            ]
        );
    }
}
