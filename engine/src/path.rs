//! Item stack and path rendering.
//!
//! The stack is never mutated in place: descending into a child produces a
//! new stack, so a caller's view of its own position cannot be disturbed by
//! the recursion below it.

use std::fmt::Write as _;

use serde_json::Value;
use syncguard_schema::{ItemFrame, Segment};

/// The frames from the document root to the item being examined.
#[derive(Debug, Clone)]
pub struct ItemStack<'a> {
    frames: Vec<ItemFrame<'a>>,
}

impl<'a> ItemStack<'a> {
    /// A stack holding only the document root.
    #[must_use]
    pub fn root(doc: &'a Value, old_doc: Option<&'a Value>) -> Self {
        Self {
            frames: vec![ItemFrame {
                value: Some(doc),
                old_value: old_doc,
                segment: Segment::Root,
            }],
        }
    }

    /// Returns a new stack with `frame` on top.
    #[must_use]
    pub fn push(&self, frame: ItemFrame<'a>) -> Self {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.extend(self.frames.iter().cloned());
        frames.push(frame);
        Self { frames }
    }

    /// Returns a new stack with a child item on top.
    #[must_use]
    pub fn child(
        &self,
        segment: Segment,
        value: Option<&'a Value>,
        old_value: Option<&'a Value>,
    ) -> Self {
        self.push(ItemFrame {
            value,
            old_value,
            segment,
        })
    }

    /// The item being examined.
    #[must_use]
    pub fn top(&self) -> &ItemFrame<'a> {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    /// Every frame below the top, root first.
    #[must_use]
    pub fn ancestors(&self) -> &[ItemFrame<'a>] {
        &self.frames[..self.frames.len() - 1]
    }

    /// Number of frames above the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Renders the location of the top item.
    #[must_use]
    pub fn path(&self) -> String {
        render(&self.frames)
    }

    /// Renders the location of a child of the top item without pushing it.
    #[must_use]
    pub fn path_with(&self, segment: &Segment) -> String {
        let mut path = self.path();
        append(&mut path, segment);
        path
    }
}

/// Renders frames as `a.b[0][key]`. The root contributes nothing.
#[must_use]
pub fn render(frames: &[ItemFrame<'_>]) -> String {
    let mut path = String::new();
    for frame in frames {
        append(&mut path, &frame.segment);
    }
    path
}

fn append(path: &mut String, segment: &Segment) {
    match segment {
        Segment::Root => {}
        Segment::Property(name) if path.is_empty() => path.push_str(name),
        Segment::Property(name) => {
            path.push('.');
            path.push_str(name);
        }
        Segment::Index(index) => {
            let _ = write!(path, "[{index}]");
        }
        Segment::Key(key) => {
            let _ = write!(path, "[{key}]");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_properties_indexes_and_keys() {
        let doc = json!({});
        let stack = ItemStack::root(&doc, None)
            .child(Segment::Property("orders".into()), None, None)
            .child(Segment::Index(2), None, None)
            .child(Segment::Property("lines".into()), None, None)
            .child(Segment::Key("sku-1".into()), None, None);
        assert_eq!(stack.path(), "orders[2].lines[sku-1]");
        assert_eq!(stack.depth(), 4);
        assert_eq!(stack.ancestors().len(), 4);
    }

    #[test]
    fn root_renders_empty() {
        let doc = json!({});
        let stack = ItemStack::root(&doc, None);
        assert_eq!(stack.path(), "");
        assert_eq!(stack.path_with(&Segment::Property("type".into())), "type");
        assert!(stack.ancestors().is_empty());
    }

    #[test]
    fn child_does_not_disturb_parent() {
        let doc = json!({ "a": 1 });
        let parent =
            ItemStack::root(&doc, None).child(Segment::Property("a".into()), doc.get("a"), None);
        let _child = parent.child(Segment::Index(0), None, None);
        assert_eq!(parent.path(), "a");
        assert_eq!(parent.top().value, Some(&json!(1)));
    }
}
