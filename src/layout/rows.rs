use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::geometry::{BoundingBox, GeometryProvider, NodeRef, ViewportBox};
use crate::member::MemberId;

use super::Generations;

/// Fixed-size card placement: one centred row per generation, oldest on top.
///
/// Stands in for a live rendering surface when none is available (the CLI,
/// tests, benches).
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    nodes: HashMap<MemberId, BoundingBox>,
    rows: BTreeMap<i64, BoundingBox>,
    /// Row order as laid out, top to bottom.
    order: Vec<i64>,
    width: f32,
    height: f32,
    viewport: ViewportBox,
}

impl RowLayout {
    pub fn compute(generations: &Generations, config: &LayoutConfig, viewport: ViewportBox) -> Self {
        let pad = config.content_padding.max(0.0);
        let card_w = config.card_width.max(1.0);
        let card_h = config.card_height.max(1.0);
        let card_gap = config.card_gap.max(0.0);
        let row_gap = config.row_gap.max(0.0);

        let row_width = |count: usize| -> f32 {
            if count == 0 {
                0.0
            } else {
                count as f32 * card_w + (count - 1) as f32 * card_gap
            }
        };
        let widest = generations
            .iter()
            .map(|(_, members)| row_width(members.len()))
            .fold(0.0f32, f32::max);
        let width = (widest + pad * 2.0).max(viewport.width);

        let mut nodes = HashMap::new();
        let mut rows = BTreeMap::new();
        let mut order = Vec::with_capacity(generations.len());
        let mut y = pad;
        for (generation, members) in generations.iter() {
            let left = (width - row_width(members.len())) / 2.0;
            for (idx, member) in members.iter().enumerate() {
                let x = left + idx as f32 * (card_w + card_gap);
                nodes.insert(member.id.clone(), BoundingBox::new(x, y, card_w, card_h));
            }
            rows.insert(
                generation,
                BoundingBox::new(left, y, row_width(members.len()), card_h),
            );
            order.push(generation);
            y += card_h + row_gap;
        }
        let height = if order.is_empty() {
            pad * 2.0
        } else {
            y - row_gap + pad
        };

        Self {
            nodes,
            rows,
            order,
            width,
            height,
            viewport,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn node(&self, id: &MemberId) -> Option<&BoundingBox> {
        self.nodes.get(id)
    }

    pub fn row(&self, generation: i64) -> Option<&BoundingBox> {
        self.rows.get(&generation)
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = (i64, &BoundingBox)> + '_ {
        self.order
            .iter()
            .filter_map(|generation| self.rows.get(generation).map(|bbox| (*generation, bbox)))
    }
}

impl GeometryProvider for RowLayout {
    fn bounding_box_of(&self, node: NodeRef<'_>) -> Option<BoundingBox> {
        match node {
            NodeRef::Member(id) => self.nodes.get(id).copied(),
            NodeRef::GenerationRow(generation) => self.rows.get(&generation).copied(),
        }
    }

    fn viewport_box(&self) -> Option<ViewportBox> {
        Some(self.viewport)
    }
}
