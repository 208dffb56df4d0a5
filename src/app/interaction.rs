use tuirealm::ratatui::layout::Rect;

use super::messages::Message;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InteractionLayer {
    Base,
    Dialog,
}

impl InteractionLayer {
    fn priority(self) -> u8 {
        match self {
            Self::Base => 0,
            Self::Dialog => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InteractionKind {
    LeftClick,
    RightClick,
    /// Resolving what a dragged item is hovering.
    Drop,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InteractionNode {
    pub rect: Rect,
    pub message: Message,
    pub layer: InteractionLayer,
    pub left_clickable: bool,
    pub right_clickable: bool,
    pub droppable: bool,
}

impl InteractionNode {
    pub fn click(layer: InteractionLayer, rect: Rect, message: Message) -> Self {
        Self {
            rect,
            message,
            layer,
            left_clickable: true,
            right_clickable: false,
            droppable: false,
        }
    }

    /// Cards: clickable, context-clickable and a drop target.
    pub fn task(layer: InteractionLayer, rect: Rect, message: Message) -> Self {
        Self {
            rect,
            message,
            layer,
            left_clickable: true,
            right_clickable: true,
            droppable: true,
        }
    }

    pub fn drop_zone(layer: InteractionLayer, rect: Rect, message: Message) -> Self {
        Self {
            rect,
            message,
            layer,
            left_clickable: true,
            right_clickable: false,
            droppable: true,
        }
    }

    fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.rect.x
            && col < self.rect.x.saturating_add(self.rect.width)
            && row >= self.rect.y
            && row < self.rect.y.saturating_add(self.rect.height)
    }

    fn supports(&self, kind: InteractionKind) -> bool {
        match kind {
            InteractionKind::LeftClick => self.left_clickable,
            InteractionKind::RightClick => self.right_clickable,
            InteractionKind::Drop => self.droppable,
        }
    }
}

/// Hit-test regions registered while rendering a frame.
#[derive(Debug, Default, Clone)]
pub struct InteractionMap {
    nodes: Vec<InteractionNode>,
}

impl InteractionMap {
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn register(&mut self, node: InteractionNode) {
        self.nodes.push(node);
    }

    pub fn register_click(&mut self, layer: InteractionLayer, rect: Rect, message: Message) {
        self.register(InteractionNode::click(layer, rect, message));
    }

    pub fn register_task(&mut self, layer: InteractionLayer, rect: Rect, message: Message) {
        self.register(InteractionNode::task(layer, rect, message));
    }

    pub fn register_drop_zone(&mut self, layer: InteractionLayer, rect: Rect, message: Message) {
        self.register(InteractionNode::drop_zone(layer, rect, message));
    }

    pub fn has_layer(&self, layer: InteractionLayer) -> bool {
        self.nodes.iter().any(|node| node.layer == layer)
    }

    pub fn resolve_message(&self, col: u16, row: u16, kind: InteractionKind) -> Option<Message> {
        self.resolve_node(col, row, kind)
            .map(|node| node.message.clone())
    }

    /// Higher layers win; within a layer the latest registration wins.
    pub fn resolve_node(
        &self,
        col: u16,
        row: u16,
        kind: InteractionKind,
    ) -> Option<&InteractionNode> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.contains(col, row) && node.supports(kind))
            .max_by_key(|(idx, node)| (node.layer.priority(), *idx))
            .map(|(_, node)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::{InteractionKind, InteractionLayer, InteractionMap};
    use crate::app::Message;
    use tuirealm::ratatui::layout::Rect;

    #[test]
    fn resolve_prefers_dialog_layer() {
        let mut map = InteractionMap::default();
        let rect = Rect::new(10, 10, 5, 2);

        map.register_click(InteractionLayer::Dialog, rect, Message::DismissDialog);
        map.register_click(InteractionLayer::Base, rect, Message::FocusColumn(0));

        let message = map.resolve_message(11, 10, InteractionKind::LeftClick);
        assert_eq!(message, Some(Message::DismissDialog));
    }

    #[test]
    fn resolve_prefers_latest_within_same_layer() {
        let mut map = InteractionMap::default();
        let column = Rect::new(0, 0, 20, 20);
        let card = Rect::new(1, 2, 18, 3);

        map.register_drop_zone(InteractionLayer::Base, column, Message::FocusColumn(1));
        map.register_task(InteractionLayer::Base, card, Message::SelectTask(1, 0));

        assert_eq!(
            map.resolve_message(5, 3, InteractionKind::Drop),
            Some(Message::SelectTask(1, 0))
        );
        assert_eq!(
            map.resolve_message(5, 10, InteractionKind::Drop),
            Some(Message::FocusColumn(1))
        );
    }

    #[test]
    fn click_nodes_are_not_drop_targets() {
        let mut map = InteractionMap::default();
        let rect = Rect::new(0, 0, 10, 1);
        map.register_click(InteractionLayer::Base, rect, Message::OpenAddColumn);

        assert_eq!(map.resolve_message(2, 0, InteractionKind::Drop), None);
        assert_eq!(
            map.resolve_message(2, 0, InteractionKind::LeftClick),
            Some(Message::OpenAddColumn)
        );
    }

    #[test]
    fn right_click_only_hits_cards() {
        let mut map = InteractionMap::default();
        map.register_drop_zone(InteractionLayer::Base, Rect::new(0, 0, 10, 10), Message::FocusColumn(0));
        assert_eq!(map.resolve_message(1, 1, InteractionKind::RightClick), None);
    }
}
