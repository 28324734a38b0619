//! Geometry seam between the layout core and whatever surface draws the tree.
//!
//! All boxes are in content-local coordinates: the origin is the top-left
//! corner of the scrollable tree content, not the viewport, so connector paths
//! stay valid while the content scrolls.

use crate::member::MemberId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            bottom: top + height,
            left,
            right: left + width,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn top_center(&self) -> (f32, f32) {
        (self.center_x(), self.top)
    }

    pub fn bottom_center(&self) -> (f32, f32) {
        (self.center_x(), self.bottom)
    }

    pub fn is_finite(&self) -> bool {
        self.top.is_finite() && self.bottom.is_finite() && self.left.is_finite() && self.right.is_finite()
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
            left: self.left.min(other.left),
            right: self.right.max(other.right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBox {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            top: 0.0,
            bottom: height,
            left: 0.0,
            right: width,
            width,
            height,
        }
    }
}

/// Something the caller can ask the surface about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef<'a> {
    Member(&'a MemberId),
    GenerationRow(i64),
}

/// Read-only view of the rendered layout.
///
/// `None` means the node has not been laid out yet; callers skip the work that
/// depends on it and retry on a later pass.
pub trait GeometryProvider {
    fn bounding_box_of(&self, node: NodeRef<'_>) -> Option<BoundingBox>;

    fn viewport_box(&self) -> Option<ViewportBox>;
}

impl<G: GeometryProvider + ?Sized> GeometryProvider for &G {
    fn bounding_box_of(&self, node: NodeRef<'_>) -> Option<BoundingBox> {
        (**self).bounding_box_of(node)
    }

    fn viewport_box(&self) -> Option<ViewportBox> {
        (**self).viewport_box()
    }
}

/// A frozen set of measurements, e.g. captured from a browser and handed to
/// the CLI, or built by hand in tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometrySnapshot {
    #[serde(default)]
    pub nodes: HashMap<MemberId, BoundingBox>,
    #[serde(default)]
    pub rows: HashMap<i64, BoundingBox>,
    #[serde(default)]
    pub viewport: Option<ViewportBox>,
}

impl GeometrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(mut self, viewport: ViewportBox) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn insert_node(&mut self, id: impl Into<MemberId>, bbox: BoundingBox) {
        self.nodes.insert(id.into(), bbox);
    }

    pub fn insert_row(&mut self, generation: i64, bbox: BoundingBox) {
        self.rows.insert(generation, bbox);
    }

    pub fn remove_node(&mut self, id: &MemberId) -> Option<BoundingBox> {
        self.nodes.remove(id)
    }

    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

impl GeometryProvider for GeometrySnapshot {
    fn bounding_box_of(&self, node: NodeRef<'_>) -> Option<BoundingBox> {
        let bbox = match node {
            NodeRef::Member(id) => self.nodes.get(id),
            NodeRef::GenerationRow(generation) => self.rows.get(&generation),
        };
        bbox.copied().filter(BoundingBox::is_finite)
    }

    fn viewport_box(&self) -> Option<ViewportBox> {
        self.viewport
    }
}
