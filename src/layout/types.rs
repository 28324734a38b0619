use std::collections::BTreeMap;

use serde::Serialize;

use crate::member::{Member, MemberId};

/// Members bucketed by generation, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Generations {
    /// Distinct generation values, strictly descending.
    pub keys: Vec<i64>,
    pub rows: BTreeMap<i64, Vec<Member>>,
}

impl Generations {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn row(&self, generation: i64) -> &[Member] {
        self.rows.get(&generation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows in display order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &[Member])> + '_ {
        self.keys.iter().map(|key| (*key, self.row(*key)))
    }

    pub fn index_of(&self, generation: i64) -> Option<usize> {
        self.keys.iter().position(|key| *key == generation)
    }
}

/// Children sharing one exact parent set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyGroup {
    /// Sorted parent ids joined with `-`, e.g. `"3-7"`. A `-` or `\` inside
    /// an id is escaped with `\`, so distinct parent sets never share a key.
    pub key: String,
    /// Parent ids in sorted order.
    pub parents: Vec<MemberId>,
    /// Children in the order they appeared in the member list.
    pub children: Vec<MemberId>,
}

impl FamilyGroup {
    pub fn key_for(parents: &[MemberId]) -> (String, Vec<MemberId>) {
        let mut sorted = parents.to_vec();
        sorted.sort();
        sorted.dedup();
        let key = sorted
            .iter()
            .map(|id| escape_key_part(id.as_str()))
            .collect::<Vec<_>>()
            .join("-");
        (key, sorted)
    }
}

fn escape_key_part(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        if ch == '-' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorKind {
    ParentChild,
    Spouse,
    Sibling,
}

impl ConnectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::ParentChild => "parent-child",
            ConnectorKind::Spouse => "spouse",
            ConnectorKind::Sibling => "sibling",
        }
    }
}

/// One absolute path command in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PathCommand {
    MoveTo {
        x: f32,
        y: f32,
    },
    LineTo {
        x: f32,
        y: f32,
    },
    QuadTo {
        cx: f32,
        cy: f32,
        x: f32,
        y: f32,
    },
    CubicTo {
        c1x: f32,
        c1y: f32,
        c2x: f32,
        c2y: f32,
        x: f32,
        y: f32,
    },
}

impl PathCommand {
    pub fn end_point(&self) -> (f32, f32) {
        match *self {
            PathCommand::MoveTo { x, y }
            | PathCommand::LineTo { x, y }
            | PathCommand::QuadTo { x, y, .. }
            | PathCommand::CubicTo { x, y, .. } => (x, y),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathCommand>);

impl Path {
    pub fn start(x: f32, y: f32) -> Self {
        Self(vec![PathCommand::MoveTo { x, y }])
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.0.push(PathCommand::LineTo { x, y });
        self
    }

    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.0.push(PathCommand::QuadTo { cx, cy, x, y });
        self
    }

    pub fn cubic_to(mut self, c1: (f32, f32), c2: (f32, f32), x: f32, y: f32) -> Self {
        self.0.push(PathCommand::CubicTo {
            c1x: c1.0,
            c1y: c1.1,
            c2x: c2.0,
            c2y: c2.1,
            x,
            y,
        });
        self
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.0
    }

    pub fn first_point(&self) -> Option<(f32, f32)> {
        self.0.first().map(PathCommand::end_point)
    }

    pub fn last_point(&self) -> Option<(f32, f32)> {
        self.0.last().map(PathCommand::end_point)
    }

    /// SVG `d` attribute.
    pub fn to_svg_d(&self) -> String {
        let mut d = String::new();
        for command in &self.0 {
            if !d.is_empty() {
                d.push(' ');
            }
            match *command {
                PathCommand::MoveTo { x, y } => d.push_str(&format!("M {x:.2} {y:.2}")),
                PathCommand::LineTo { x, y } => d.push_str(&format!("L {x:.2} {y:.2}")),
                PathCommand::QuadTo { cx, cy, x, y } => {
                    d.push_str(&format!("Q {cx:.2} {cy:.2}, {x:.2} {y:.2}"))
                }
                PathCommand::CubicTo {
                    c1x,
                    c1y,
                    c2x,
                    c2y,
                    x,
                    y,
                } => d.push_str(&format!(
                    "C {c1x:.2} {c1y:.2}, {c2x:.2} {c2y:.2}, {x:.2} {y:.2}"
                )),
            }
        }
        d
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorDescriptor {
    /// Stable across passes: derived from the family key and endpoint id.
    pub id: String,
    pub path: Path,
    #[serde(rename = "type")]
    pub kind: ConnectorKind,
}
