//! Game tree storage and path-guided traversal.
//!
//! Nodes live in an arena owned by [`GameTree`] and refer to each other by
//! [`NodeId`]. Every node caches the position reached after its move, so
//! rendering and analysis never replay the game from the start.

use shakmaty::{Chess, Color, Move, Position, san::SanPlus, uci::UciMove};

use crate::error::{Result, ViewerError};
use crate::variation_path::VariationPath;

/// Handle to a node in a [`GameTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One position in the game tree.
#[derive(Debug, Clone)]
pub struct PositionNode {
    /// Move leading here; `None` for the root
    mv: Option<Move>,
    /// SAN of `mv` in the parent position
    san: Option<String>,
    parent: Option<NodeId>,
    /// Children, mainline first
    variations: Vec<NodeId>,
    /// Position after `mv`
    position: Chess,
    /// Half-moves from the root
    ply: u32,
}

impl PositionNode {
    pub fn mv(&self) -> Option<&Move> {
        self.mv.as_ref()
    }

    pub fn san(&self) -> Option<&str> {
        self.san.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn variations(&self) -> &[NodeId] {
        &self.variations
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn is_leaf(&self) -> bool {
        self.variations.is_empty()
    }
}

/// A game with all of its variations.
#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<PositionNode>,
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new(Chess::default())
    }
}

impl GameTree {
    /// Creates a tree holding only the starting position.
    pub fn new(start: Chess) -> Self {
        Self {
            nodes: vec![PositionNode {
                mv: None,
                san: None,
                parent: None,
                variations: Vec::new(),
                position: start,
                ply: 0,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &PositionNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&PositionNode> {
        self.nodes.get(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn variations(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).variations
    }

    pub fn position(&self, id: NodeId) -> &Chess {
        &self.node(id).position
    }

    /// SAN of the move leading to `id`, or an empty string for the root.
    pub fn san(&self, id: NodeId) -> &str {
        self.node(id).san.as_deref().unwrap_or("")
    }

    pub fn ply(&self, id: NodeId) -> u32 {
        self.node(id).ply
    }

    /// Appends `mv` as a new variation of `parent` and returns the child.
    ///
    /// If `parent` already has a child for the same move, that child is
    /// returned instead. The move must be legal in the parent position.
    pub fn add_variation(&mut self, parent: NodeId, mv: Move) -> NodeId {
        if let Some(&existing) = self
            .variations(parent)
            .iter()
            .find(|&&child| self.node(child).mv.as_ref() == Some(&mv))
        {
            return existing;
        }

        let mut position = self.position(parent).clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut position, &mv).to_string();
        let id = NodeId(self.nodes.len());
        let ply = self.ply(parent) + 1;
        self.nodes.push(PositionNode {
            mv: Some(mv),
            san: Some(san),
            parent: Some(parent),
            variations: Vec::new(),
            position,
            ply,
        });
        self.nodes[parent.0].variations.push(id);
        id
    }

    /// Parses `san` in the position at `parent` and adds it as a variation.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Position`] if the text is not a legal move.
    pub fn add_san(&mut self, parent: NodeId, san: &str) -> Result<NodeId> {
        let parsed: SanPlus = san
            .parse()
            .map_err(|_| ViewerError::Position(format!("invalid SAN: {san}")))?;
        let mv = parsed
            .san
            .to_move(self.position(parent))
            .map_err(|_| ViewerError::Position(format!("illegal move: {san}")))?;
        Ok(self.add_variation(parent, mv))
    }

    /// Parses `uci` in the position at `parent` and adds it as a variation.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Position`] if the text is not a legal move.
    pub fn add_uci(&mut self, parent: NodeId, uci: &str) -> Result<NodeId> {
        let parsed: UciMove = uci
            .parse()
            .map_err(|_| ViewerError::Position(format!("invalid UCI move: {uci}")))?;
        let mv = parsed
            .to_move(self.position(parent))
            .map_err(|_| ViewerError::Position(format!("illegal move: {uci}")))?;
        Ok(self.add_variation(parent, mv))
    }

    /// Label for the move leading to `id`, numbered from the parent position.
    ///
    /// White moves read `"12. Nf3"`, black moves `"12... Nf6"`. The root has
    /// no move and yields an empty string.
    pub fn variation_label(&self, id: NodeId) -> String {
        let node = self.node(id);
        let (Some(parent), Some(san)) = (node.parent, node.san.as_deref()) else {
            return String::new();
        };
        let before = self.position(parent);
        let number = before.fullmoves().get();
        match before.turn() {
            Color::White => format!("{number}. {san}"),
            Color::Black => format!("{number}... {san}"),
        }
    }

    /// Iterates the visible line selected by `path`, starting at the root's
    /// mainline move.
    ///
    /// At each node the next entry of `path` is consumed. A valid index picks
    /// that variation; a missing or out-of-range index picks the mainline.
    /// The sequence ends at the first leaf.
    pub fn visible_nodes<'a>(&'a self, path: &'a VariationPath) -> VisibleNodes<'a> {
        VisibleNodes {
            tree: self,
            choices: path.iter(),
            next: self.variations(self.root()).first().copied(),
        }
    }

    /// Next node after `id` on the line selected by `path`.
    pub fn next_on_path(&self, id: NodeId, path: &VariationPath) -> Option<NodeId> {
        let variations = self.variations(id);
        let choice = (self.ply(id) as usize)
            .checked_sub(1)
            .and_then(|k| path.get(k))
            .filter(|&index| index < variations.len())
            .unwrap_or(0);
        variations.get(choice).copied()
    }

    /// Last node of the line through `id` selected by `path`.
    pub fn line_end(&self, id: NodeId, path: &VariationPath) -> NodeId {
        let mut current = id;
        while let Some(next) = self.next_on_path(current, path) {
            current = next;
        }
        current
    }

    /// Last node of the mainline.
    pub fn mainline_end(&self) -> NodeId {
        self.line_end(self.root(), &VariationPath::new())
    }

    /// Path whose visible line passes through `id`.
    ///
    /// Only branch choices below the first move are recorded, so a node under
    /// a sideline of the very first move is reached through the mainline's
    /// first move instead.
    pub fn path_to(&self, id: NodeId) -> VariationPath {
        let mut indices = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if self.ply(current) >= 2 {
                let index = self
                    .variations(parent)
                    .iter()
                    .position(|&child| child == current)
                    .unwrap_or(0);
                indices.push(index);
            }
            current = parent;
        }
        indices.reverse();
        VariationPath::from(indices)
    }
}

/// Iterator over the visible line of a [`GameTree`].
#[derive(Debug, Clone)]
pub struct VisibleNodes<'a> {
    tree: &'a GameTree,
    choices: std::slice::Iter<'a, usize>,
    next: Option<NodeId>,
}

impl Iterator for VisibleNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        let variations = self.tree.variations(current);
        self.next = if variations.is_empty() {
            None
        } else {
            let index = self
                .choices
                .next()
                .copied()
                .filter(|&index| index < variations.len())
                .unwrap_or(0);
            Some(variations[index])
        };
        Some(current)
    }
}
