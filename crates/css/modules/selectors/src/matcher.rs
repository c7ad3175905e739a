//! CSS selector matching engine.
//! Reference: <https://www.w3.org/TR/selectors-3/>

use crate::{
    Combinator, ComplexSelector, CompoundSelector, ElementAdapter, SelectorList, SimpleSelector,
};

/// Match a selector list against an element.
/// Selectors-3, Section 4
pub fn matches_selector_list<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    list: &SelectorList,
) -> bool {
    list.selectors
        .iter()
        .any(|selector_item| matches_complex(adapter, element, selector_item))
}

/// Match a complex selector against an element.
/// Selectors-3, Section 8: right-to-left matching with backtracking over ancestors/siblings.
pub fn matches_complex<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
) -> bool {
    match_from(adapter, element, sel, sel.rest.len())
}

/// Match the compound at `depth` (0 = `sel.first`, n = `sel.rest[n - 1]`) against `element`,
/// then relate it to the compounds on its left.
fn match_from<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
    depth: usize,
) -> bool {
    let Some(previous_depth) = depth.checked_sub(1) else {
        return matches_compound(adapter, element, &sel.first);
    };
    let Some((combinator, compound)) = sel.rest.get(previous_depth) else {
        return false;
    };
    if !matches_compound(adapter, element, compound) {
        return false;
    }
    match combinator {
        Combinator::Descendant => {
            let mut current_parent = adapter.parent(element);
            while let Some(ancestor) = current_parent {
                if match_from(adapter, ancestor, sel, previous_depth) {
                    return true;
                }
                current_parent = adapter.parent(ancestor);
            }
            false
        }
        Combinator::Child => adapter
            .parent(element)
            .is_some_and(|parent| match_from(adapter, parent, sel, previous_depth)),
        Combinator::AdjacentSibling => adapter
            .previous_sibling_element(element)
            .is_some_and(|sibling| match_from(adapter, sibling, sel, previous_depth)),
        Combinator::GeneralSibling => {
            let mut current_sibling = adapter.previous_sibling_element(element);
            while let Some(sibling) = current_sibling {
                if match_from(adapter, sibling, sel, previous_depth) {
                    return true;
                }
                current_sibling = adapter.previous_sibling_element(sibling);
            }
            false
        }
    }
}

/// Match a compound selector against a single element.
/// Selectors-3, Section 5–6
pub fn matches_compound<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    compound: &CompoundSelector,
) -> bool {
    let Some(tag) = adapter.tag_name(element) else {
        return false;
    };
    compound.simples.iter().all(|simple| match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(type_name) => tag == type_name.as_str(),
        SimpleSelector::Class(class_name) => adapter.has_class(element, class_name),
        SimpleSelector::IdSelector(id_value) => adapter
            .attr(element, "id")
            .is_some_and(|value| value == id_value.as_str()),
        SimpleSelector::Attribute {
            name,
            operator,
            value,
        } => adapter
            .attr(element, name)
            .is_some_and(|actual| operator.matches(actual, value)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_selector_list;

    /// A flat test tree: index-addressed nodes with a parent link.
    struct Tree {
        nodes: Vec<TestNode>,
    }

    struct TestNode {
        tag: &'static str,
        parent: Option<usize>,
        attrs: Vec<(&'static str, &'static str)>,
    }

    impl ElementAdapter for Tree {
        type Handle = usize;

        fn parent(&self, element: usize) -> Option<usize> {
            self.nodes.get(element).and_then(|node| node.parent)
        }

        fn previous_sibling_element(&self, element: usize) -> Option<usize> {
            let parent = self.parent(element);
            (0..element)
                .rev()
                .find(|&candidate| self.nodes[candidate].parent == parent)
        }

        fn tag_name(&self, element: usize) -> Option<&str> {
            self.nodes.get(element).map(|node| node.tag)
        }

        fn has_class(&self, element: usize, class: &str) -> bool {
            self.attr(element, "class")
                .is_some_and(|classes| classes.split_whitespace().any(|token| token == class))
        }

        fn attr(&self, element: usize, name: &str) -> Option<&str> {
            self.nodes.get(element).and_then(|node| {
                node.attrs
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
            })
        }
    }

    fn sample_tree() -> Tree {
        Tree {
            nodes: vec![
                TestNode { tag: "nav", parent: None, attrs: vec![("class", "navbar")] },
                TestNode { tag: "ul", parent: Some(0), attrs: vec![("class", "nav-links")] },
                TestNode { tag: "li", parent: Some(1), attrs: vec![] },
                TestNode { tag: "a", parent: Some(2), attrs: vec![("href", "#pricing")] },
                TestNode { tag: "a", parent: Some(2), attrs: vec![("href", "https://t.me/examplebot")] },
            ],
        }
    }

    #[test]
    fn descendant_chain_of_three_compounds() {
        let tree = sample_tree();
        let list = parse_selector_list(".navbar .nav-links a");
        assert!(matches_selector_list(&tree, 3, &list));
        assert!(!matches_selector_list(&tree, 2, &list));
    }

    #[test]
    fn attribute_operators_match_href_values() {
        let tree = sample_tree();
        let anchors = parse_selector_list("a[href^='#']");
        let invites = parse_selector_list("a[href*=\"t.me/\"]");
        assert!(matches_selector_list(&tree, 3, &anchors));
        assert!(!matches_selector_list(&tree, 4, &anchors));
        assert!(matches_selector_list(&tree, 4, &invites));
    }

    #[test]
    fn child_and_sibling_combinators() {
        let tree = sample_tree();
        assert!(matches_selector_list(&tree, 2, &parse_selector_list("ul > li")));
        assert!(!matches_selector_list(&tree, 3, &parse_selector_list("ul > a")));
        assert!(matches_selector_list(&tree, 4, &parse_selector_list("a + a")));
        assert!(matches_selector_list(&tree, 4, &parse_selector_list("a[href^='#'] ~ a")));
    }
}
