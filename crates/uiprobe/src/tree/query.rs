//! Lazy enumeration and filtering over parsed trees.
//!
//! Enumeration walks each window with an explicit stack: a parent is yielded
//! before its children, and siblings come out last-to-first. Callers that
//! need document order should sort by position themselves.

use super::model::{Element, Tree};

/// Iterator over the elements of a tree or subtree
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Elements<'a> {
    fn from_roots(roots: impl IntoIterator<Item = &'a Element>) -> Self {
        // reversed so the first root is popped first
        let mut stack: Vec<_> = roots.into_iter().collect();
        stack.reverse();
        Self { stack }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter());
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.stack.len(), None)
    }
}

impl std::iter::FusedIterator for Elements<'_> {}

/// Every element of every window, in window order.
#[must_use]
pub fn enumerate(tree: &Tree) -> Elements<'_> {
    Elements::from_roots(tree.windows.iter().map(|window| &window.root))
}

/// Lazily keep the elements accepted by `predicate`
pub fn filter<'a, I, P>(elements: I, predicate: P) -> impl Iterator<Item = &'a Element>
where
    I: IntoIterator<Item = &'a Element>,
    P: Fn(&Element) -> bool,
{
    elements.into_iter().filter(move |element| predicate(element))
}

/// All elements of `tree` accepted by `predicate`
#[must_use]
pub fn find<P>(tree: &Tree, predicate: P) -> Vec<&Element>
where
    P: Fn(&Element) -> bool,
{
    filter(enumerate(tree), predicate).collect()
}

impl Tree {
    /// Iterate over every element of every window
    #[must_use]
    pub fn elements(&self) -> Elements<'_> {
        enumerate(self)
    }

    /// Collect the elements accepted by `predicate`
    #[must_use]
    pub fn find<P>(&self, predicate: P) -> Vec<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        find(self, predicate)
    }
}

impl Element {
    /// Iterate over this element and all of its descendants
    #[must_use]
    pub fn descendants(&self) -> Elements<'_> {
        Elements::from_roots(std::iter::once(self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::tree::model::WindowKind;
    use crate::tree::parser::parse_tree;

    const ANDROID_NOTES: &str = include_str!("../../fixtures/android_notes.xml");
    const IOS_LOGIN: &str = include_str!("../../fixtures/ios_login.xml");
    const EMPTY_TREE: &str = include_str!("../../fixtures/empty_tree.xml");

    fn notes() -> Tree {
        parse_tree(ANDROID_NOTES).unwrap()
    }

    mod enumerate_tests {
        use super::*;

        #[test]
        fn test_counts_every_element() {
            let tree = notes();
            assert_eq!(enumerate(&tree).count(), 21);
            assert_eq!(tree.element_count(), 21);
            assert_eq!(parse_tree(IOS_LOGIN).unwrap().element_count(), 7);
        }

        #[test]
        fn test_empty_tree_yields_nothing() {
            let tree = parse_tree(EMPTY_TREE).unwrap();
            assert_eq!(enumerate(&tree).next(), None);
        }

        #[test]
        fn test_windows_are_visited_in_order() {
            let tree = notes();
            let main_len = tree.window(WindowKind::Main).unwrap().root.subtree_len();
            let first_status = enumerate(&tree).nth(main_len).unwrap();
            assert_eq!(first_status, &tree.windows[1].root);
        }

        #[test]
        fn test_parent_before_children_last_to_first() {
            let tree = parse_tree(IOS_LOGIN).unwrap();
            let main = &tree.windows[0].root;
            let types: Vec<_> = main
                .descendants()
                .map(|e| e.element_type.as_str())
                .collect();
            assert_eq!(types, vec!["view", "button", "secureTextField", "textField"]);
        }

        #[test]
        fn test_restartable() {
            let tree = notes();
            let first: Vec<_> = tree.elements().collect();
            let second: Vec<_> = tree.elements().collect();
            assert_eq!(first, second);
        }

        #[test]
        fn test_fused_after_exhaustion() {
            let tree = parse_tree(IOS_LOGIN).unwrap();
            let mut elements = tree.elements();
            for _ in 0..7 {
                assert!(elements.next().is_some());
            }
            assert!(elements.next().is_none());
            assert!(elements.next().is_none());
        }
    }

    mod find_tests {
        use super::*;

        #[test]
        fn test_find_clickable() {
            let tree = notes();
            let clickable = find(&tree, |e| e.clickable);
            assert_eq!(clickable.len(), 4);
            assert!(clickable.iter().all(|e| e.clickable));
        }

        #[test]
        fn test_find_by_id() {
            let tree = notes();
            let titles = tree.find(|e| e.id.as_deref() == Some("com.example.notes:id/note_title"));
            let mut texts: Vec<_> = titles.iter().filter_map(|e| e.text.as_deref()).collect();
            texts.sort_unstable();
            assert_eq!(texts, vec!["Groceries", "Reading list", "Trip plan"]);
        }

        #[test]
        fn test_find_nothing_is_empty() {
            let tree = notes();
            assert!(find(&tree, |e| e.has_text("Nope")).is_empty());
        }

        #[test]
        fn test_filter_is_lazy_and_composable() {
            let tree = notes();
            let visible_clickable: Vec<_> =
                filter(filter(tree.elements(), |e| e.clickable), |e| {
                    e.visibility == crate::tree::model::Visibility::Visible
                })
                .collect();
            assert_eq!(visible_clickable.len(), 2);
        }

        #[test]
        fn test_filter_over_subtree() {
            let tree = notes();
            let status = &tree.window(WindowKind::Status).unwrap().root;
            let icons: Vec<_> = filter(status.descendants(), |e| {
                e.element_type == "android.widget.ImageView"
            })
            .collect();
            assert_eq!(icons.len(), 3);
        }
    }
}
