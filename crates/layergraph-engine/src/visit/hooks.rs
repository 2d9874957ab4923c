use std::fmt;

use crate::graph::Node;

type Predicate = Box<dyn Fn(&Node) -> bool>;
type Action = Box<dyn FnMut(&Node)>;

/// Ordered registry of `(predicate, action)` pairs.
///
/// Every action whose predicate matches a visited node runs with that node,
/// in registration order. Actions cannot stop a walk.
#[derive(Default)]
pub struct CustomHooks {
    hooks: Vec<(Predicate, Action)>,
}

impl CustomHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_custom_hook<P, A>(&mut self, predicate: P, action: A)
    where
        P: Fn(&Node) -> bool + 'static,
        A: FnMut(&Node) + 'static,
    {
        self.hooks.push((Box::new(predicate), Box::new(action)));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) fn run(&mut self, node: &Node) {
        for (predicate, action) in &mut self.hooks {
            if predicate(node) {
                action(node);
            }
        }
    }
}

impl fmt::Debug for CustomHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomHooks")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_hooks_run_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = CustomHooks::new();

        let first = Rc::clone(&seen);
        hooks.register_custom_hook(
            |n| n.id().starts_with('a'),
            move |n| first.borrow_mut().push(format!("1:{}", n.id())),
        );
        let second = Rc::clone(&seen);
        hooks.register_custom_hook(|_| true, move |n| second.borrow_mut().push(format!("2:{}", n.id())));

        hooks.run(&Node::new("abc"));
        hooks.run(&Node::new("xyz"));

        assert_eq!(hooks.len(), 2);
        assert_eq!(*seen.borrow(), vec!["1:abc", "2:abc", "2:xyz"]);
    }
}
