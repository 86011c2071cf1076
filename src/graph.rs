//! Motion graphs: an arena of clip and blend nodes referencing each other by
//! index. The compiler only needs to know which clips a graph can reach.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Blend1DChild {
    pub node: NodeIndex,
    #[serde(default)]
    pub threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Blend2DChild {
    pub node: NodeIndex,
    #[serde(default)]
    pub position: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum MotionNode {
    /// Plays one clip of the manifest
    Clip { clip: u32 },
    Blend1D {
        #[serde(default)]
        parameter: String,
        children: Vec<Blend1DChild>,
    },
    Blend2D {
        #[serde(default)]
        parameters: [String; 2],
        children: Vec<Blend2DChild>,
    },
}

impl MotionNode {
    pub fn children(&self) -> Vec<NodeIndex> {
        match self {
            MotionNode::Clip { .. } => Vec::new(),
            MotionNode::Blend1D { children, .. } => children.iter().map(|c| c.node).collect(),
            MotionNode::Blend2D { children, .. } => children.iter().map(|c| c.node).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Open,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MotionGraph {
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<MotionNode>,
    #[serde(default)]
    pub root: NodeIndex,
}

impl MotionGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a node; the first node added becomes the root
    pub fn add(&mut self, node: MotionNode) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(node);
        index
    }

    pub fn node(&self, index: NodeIndex) -> Option<&MotionNode> {
        self.nodes.get(index.index())
    }

    /// Clip indices reachable from the root, in first-reached order.
    ///
    /// Node indices outside the arena and clip indices `>= clip_count` are
    /// reported and skipped. A back edge is reported as a cycle and not
    /// followed.
    pub fn collect_clips(&self, clip_count: usize, diagnostics: &mut Diagnostics) -> Vec<u32> {
        let mut state = vec![Visit::New; self.nodes.len()];
        let mut clips = Vec::new();
        self.visit(self.root, None, clip_count, &mut state, &mut clips, diagnostics);
        clips
    }

    fn visit(
        &self,
        index: NodeIndex,
        parent: Option<NodeIndex>,
        clip_count: usize,
        state: &mut [Visit],
        clips: &mut Vec<u32>,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(node) = self.node(index) else {
            diagnostics.warn(
                DiagnosticKind::MissingRigOrIndex,
                match parent {
                    Some(p) => format!(
                        "Graph '{}': node {} references missing node {}",
                        self.name, p.0, index.0
                    ),
                    None => format!("Graph '{}': root node {} does not exist", self.name, index.0),
                },
            );
            return;
        };

        match state[index.index()] {
            Visit::Done => return,
            Visit::Open => {
                diagnostics.warn(
                    DiagnosticKind::GraphCycle,
                    format!(
                        "Graph '{}': cycle back to node {} from node {}",
                        self.name,
                        index.0,
                        parent.map_or(index.0, |p| p.0)
                    ),
                );
                return;
            }
            Visit::New => {}
        }
        state[index.index()] = Visit::Open;

        if let MotionNode::Clip { clip } = node {
            if (*clip as usize) < clip_count {
                if !clips.contains(clip) {
                    clips.push(*clip);
                }
            } else {
                diagnostics.warn(
                    DiagnosticKind::MissingRigOrIndex,
                    format!(
                        "Graph '{}': node {} plays missing clip {}",
                        self.name, index.0, clip
                    ),
                );
            }
        }
        for child in node.children() {
            self.visit(child, Some(index), clip_count, state, clips, diagnostics);
        }

        state[index.index()] = Visit::Done;
    }
}
