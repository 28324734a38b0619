use crate::config::RouterConfig;
use crate::geometry::{BoundingBox, GeometryProvider, NodeRef};
use crate::member::MemberId;

use super::{ConnectorDescriptor, ConnectorKind, FamilyGroup, Path};

/// Horizontal offsets below this are treated as "no shift" when building trunks.
const SHIFT_EPSILON: f32 = 0.01;

/// Where a family's lines leave the parent row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    x: f32,
    y: f32,
}

/// Builds every drawable connector for one layout pass.
///
/// Groups whose parents or children have no geometry yet are left out; the
/// next stabilization pass is expected to pick them up. The output depends
/// only on `groups`, the geometry and `config`, so repeated calls with the
/// same inputs yield identical descriptors.
pub fn route_connectors(
    groups: &[FamilyGroup],
    geometry: &dyn GeometryProvider,
    config: &RouterConfig,
) -> Vec<ConnectorDescriptor> {
    let mut router = Router::new(config);
    for group in groups {
        router.route_group(group, geometry);
    }
    tracing::trace!(
        groups = groups.len(),
        connectors = router.out.len(),
        "routed connectors"
    );
    router.out
}

struct Router<'a> {
    config: &'a RouterConfig,
    /// Trunk x positions claimed by earlier groups in this pass.
    claimed_drops: Vec<f32>,
    out: Vec<ConnectorDescriptor>,
}

impl<'a> Router<'a> {
    fn new(config: &'a RouterConfig) -> Self {
        Self {
            config,
            claimed_drops: Vec::new(),
            out: Vec::new(),
        }
    }

    fn route_group(&mut self, group: &FamilyGroup, geometry: &dyn GeometryProvider) {
        let parents: Vec<(&MemberId, BoundingBox)> = group
            .parents
            .iter()
            .filter_map(|id| geometry.bounding_box_of(NodeRef::Member(id)).map(|bbox| (id, bbox)))
            .collect();
        if parents.is_empty() {
            tracing::debug!(family = %group.key, "no parent geometry yet, skipping family");
            return;
        }

        let mut children: Vec<(&MemberId, BoundingBox)> = group
            .children
            .iter()
            .filter_map(|id| geometry.bounding_box_of(NodeRef::Member(id)).map(|bbox| (id, bbox)))
            .collect();
        if children.is_empty() {
            tracing::debug!(family = %group.key, "no child geometry yet, skipping family");
            return;
        }
        children.sort_by(|a, b| {
            a.1.center_x()
                .total_cmp(&b.1.center_x())
                .then_with(|| a.0.cmp(b.0))
        });

        let anchor = self.parent_anchor(group, &parents);
        let drop_x = self.claim_drop_x(anchor.x);
        let child_top = children
            .iter()
            .map(|(_, bbox)| bbox.top)
            .fold(f32::INFINITY, f32::min);
        let ratio = self.config.junction_ratio.clamp(0.0, 1.0);
        let junction_y = anchor.y + (child_top - anchor.y) * ratio;

        // The id scheme follows the group's size, not how many children have
        // geometry yet, so ids stay put while the surface settles.
        if let ([(child_id, child)], 1) = (children.as_slice(), group.children.len()) {
            let (end_x, end_y) = child.top_center();
            let path = trunk_start(anchor, drop_x).cubic_to(
                (drop_x, junction_y),
                (end_x, junction_y),
                end_x,
                end_y,
            );
            self.push(format!("{}:child:{}", group.key, child_id), path, ConnectorKind::ParentChild);
            return;
        }

        let bar_left = children[0].1.center_x();
        let bar_right = children[children.len() - 1].1.center_x();

        let mut trunk = trunk_start(anchor, drop_x).line_to(drop_x, junction_y);
        let joined_x = drop_x.clamp(bar_left, bar_right);
        if (joined_x - drop_x).abs() > SHIFT_EPSILON {
            trunk = trunk.line_to(joined_x, junction_y);
        }
        self.push(format!("{}:trunk", group.key), trunk, ConnectorKind::ParentChild);

        let bar = Path::start(bar_left, junction_y).line_to(bar_right, junction_y);
        self.push(format!("{}:bar", group.key), bar, ConnectorKind::Sibling);

        for (child_id, child) in &children {
            let (x, top) = child.top_center();
            let drop = Path::start(x, junction_y).line_to(x, top);
            self.push(format!("{}:drop:{}", group.key, child_id), drop, ConnectorKind::ParentChild);
        }
    }

    /// Emits the spouse arc when two parents resolve and returns the point
    /// the family's trunk hangs from.
    fn parent_anchor(&mut self, group: &FamilyGroup, parents: &[(&MemberId, BoundingBox)]) -> Anchor {
        let [first, second] = parents else {
            let (x, y) = parents[0].1.bottom_center();
            return Anchor { x, y };
        };
        let (left, right) = if second.1.center_x() < first.1.center_x() {
            (second.1, first.1)
        } else {
            (first.1, second.1)
        };
        let (x0, y0) = left.bottom_center();
        let (x1, y1) = right.bottom_center();
        let mid_x = (x0 + x1) / 2.0;
        let shared_bottom = y0.max(y1);
        let control_y = shared_bottom + self.config.spouse_arc_depth;
        let arc = Path::start(x0, y0).quad_to(mid_x, control_y, x1, y1);
        self.push(format!("{}:spouse", group.key), arc, ConnectorKind::Spouse);

        // Midpoint of the quadratic arc, so the trunk starts on the curve.
        Anchor {
            x: mid_x,
            y: 0.25 * y0 + 0.5 * control_y + 0.25 * y1,
        }
    }

    /// Picks a trunk x at or right of `preferred` that keeps at least
    /// `min_drop_gap` from every trunk already placed in this pass.
    fn claim_drop_x(&mut self, preferred: f32) -> f32 {
        let gap = self.config.min_drop_gap;
        let mut x = preferred;
        if gap > 0.0 {
            // Each claimed trunk can block at most two gap-sized steps.
            let max_steps = self.claimed_drops.len() * 2 + 1;
            for _ in 0..max_steps {
                if !self.claimed_drops.iter().any(|used| (used - x).abs() < gap) {
                    break;
                }
                x += gap;
            }
        }
        self.claimed_drops.push(x);
        x
    }

    fn push(&mut self, id: String, path: Path, kind: ConnectorKind) {
        self.out.push(ConnectorDescriptor { id, path, kind });
    }
}

fn trunk_start(anchor: Anchor, drop_x: f32) -> Path {
    let path = Path::start(anchor.x, anchor.y);
    if (drop_x - anchor.x).abs() > SHIFT_EPSILON {
        path.line_to(drop_x, anchor.y)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometrySnapshot;
    use crate::layout::{PathCommand, group_families};
    use crate::member::Member;

    fn card(snapshot: &mut GeometrySnapshot, id: i64, left: f32, top: f32) {
        snapshot.insert_node(id, BoundingBox::new(left, top, 100.0, 80.0));
    }

    fn by_kind(connectors: &[ConnectorDescriptor], kind: ConnectorKind) -> Vec<&ConnectorDescriptor> {
        connectors.iter().filter(|c| c.kind == kind).collect()
    }

    #[test]
    fn two_parents_one_child() {
        let members = vec![
            Member::new(1, "a", 1),
            Member::new(2, "b", 1),
            Member::new(3, "c", 0).with_parents([1, 2]),
        ];
        let mut geometry = GeometrySnapshot::new();
        card(&mut geometry, 1, 0.0, 0.0);
        card(&mut geometry, 2, 200.0, 0.0);
        card(&mut geometry, 3, 100.0, 200.0);

        let connectors = route_connectors(&group_families(&members), &geometry, &RouterConfig::default());
        let spouse = by_kind(&connectors, ConnectorKind::Spouse);
        assert_eq!(spouse.len(), 1);
        assert_eq!(spouse[0].id, "1-2:spouse");
        assert_eq!(spouse[0].path.first_point(), Some((50.0, 80.0)));
        assert_eq!(spouse[0].path.last_point(), Some((250.0, 80.0)));

        let links = by_kind(&connectors, ConnectorKind::ParentChild);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id, "1-2:child:3");
        assert_eq!(links[0].path.last_point(), Some((150.0, 200.0)));
        assert!(by_kind(&connectors, ConnectorKind::Sibling).is_empty());
    }

    #[test]
    fn single_child_curve_passes_through_junction() {
        let members = vec![Member::new(1, "a", 1), Member::new(2, "b", 0).with_parents([1])];
        let mut geometry = GeometrySnapshot::new();
        card(&mut geometry, 1, 0.0, 0.0);
        card(&mut geometry, 2, 300.0, 280.0);
        let config = RouterConfig::default();
        let connectors = route_connectors(&group_families(&members), &geometry, &config);
        assert_eq!(connectors.len(), 1);
        let junction = 80.0 + (280.0 - 80.0) * config.junction_ratio;
        match connectors[0].path.commands() {
            [PathCommand::MoveTo { x, y }, PathCommand::CubicTo { c1x, c1y, c2x, c2y, x: ex, y: ey }] => {
                assert_eq!((*x, *y), (50.0, 80.0));
                assert_eq!((*c1x, *c1y), (50.0, junction));
                assert_eq!((*c2x, *c2y), (350.0, junction));
                assert_eq!((*ex, *ey), (350.0, 280.0));
            }
            other => panic!("unexpected path {other:?}"),
        }
        assert!(junction > 80.0 + (280.0 - 80.0) / 2.0, "junction should sit closer to the children");
    }

    #[test]
    fn several_children_get_bar_and_drops() {
        let members = vec![
            Member::new(1, "a", 1),
            Member::new(2, "b", 1),
            Member::new(5, "late", 0).with_parents([2, 1]),
            Member::new(3, "c", 0).with_parents([1, 2]),
            Member::new(4, "d", 0).with_parents([1, 2]),
        ];
        let mut geometry = GeometrySnapshot::new();
        card(&mut geometry, 1, 0.0, 0.0);
        card(&mut geometry, 2, 200.0, 0.0);
        card(&mut geometry, 3, 0.0, 200.0);
        card(&mut geometry, 4, 150.0, 200.0);
        card(&mut geometry, 5, 300.0, 200.0);

        let connectors = route_connectors(&group_families(&members), &geometry, &RouterConfig::default());
        let bars = by_kind(&connectors, ConnectorKind::Sibling);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].path.first_point().map(|p| p.0), Some(50.0));
        assert_eq!(bars[0].path.last_point().map(|p| p.0), Some(350.0));

        let ids: Vec<&str> = connectors.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["1-2:spouse", "1-2:trunk", "1-2:bar", "1-2:drop:3", "1-2:drop:4", "1-2:drop:5"]
        );
        for (id, x) in [(3, 50.0), (4, 200.0), (5, 350.0)] {
            let drops: Vec<_> = connectors
                .iter()
                .filter(|c| c.kind == ConnectorKind::ParentChild && c.path.last_point() == Some((x, 200.0)))
                .collect();
            assert_eq!(drops.len(), 1, "child {id} should have one drop");
        }
    }

    #[test]
    fn unresolved_family_is_skipped() {
        let members = vec![
            Member::new(1, "a", 1),
            Member::new(2, "b", 0).with_parents([1]),
            Member::new(3, "c", 0).with_parents([9]),
        ];
        let mut geometry = GeometrySnapshot::new();
        card(&mut geometry, 1, 0.0, 0.0);
        card(&mut geometry, 3, 200.0, 200.0);
        let connectors = route_connectors(&group_families(&members), &geometry, &RouterConfig::default());
        assert!(connectors.is_empty());
    }

    #[test]
    fn partially_measured_siblings_keep_their_ids() {
        let members = vec![
            Member::new(1, "a", 1),
            Member::new(2, "b", 0).with_parents([1]),
            Member::new(3, "c", 0).with_parents([1]),
        ];
        let mut geometry = GeometrySnapshot::new();
        card(&mut geometry, 1, 0.0, 0.0);
        card(&mut geometry, 2, 0.0, 200.0);
        let groups = group_families(&members);
        let config = RouterConfig::default();

        let early = route_connectors(&groups, &geometry, &config);
        let ids: Vec<&str> = early.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1:trunk", "1:bar", "1:drop:2"]);

        card(&mut geometry, 3, 200.0, 200.0);
        let settled = route_connectors(&groups, &geometry, &config);
        let ids: Vec<&str> = settled.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1:trunk", "1:bar", "1:drop:2", "1:drop:3"]);
    }

    #[test]
    fn one_missing_parent_falls_back_to_the_other() {
        let members = vec![Member::new(1, "a", 1), Member::new(3, "c", 0).with_parents([1, 2])];
        let mut geometry = GeometrySnapshot::new();
        card(&mut geometry, 1, 0.0, 0.0);
        card(&mut geometry, 3, 0.0, 200.0);
        let connectors = route_connectors(&group_families(&members), &geometry, &RouterConfig::default());
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].kind, ConnectorKind::ParentChild);
        assert_eq!(connectors[0].path.first_point(), Some((50.0, 80.0)));
    }

    #[test]
    fn coinciding_trunks_are_pushed_apart() {
        // Two single parents stacked in the same column.
        let members = vec![
            Member::new(1, "a", 2),
            Member::new(2, "b", 1),
            Member::new(3, "c", 1).with_parents([1]),
            Member::new(4, "d", 0).with_parents([2]),
        ];
        let mut geometry = GeometrySnapshot::new();
        card(&mut geometry, 1, 0.0, 0.0);
        card(&mut geometry, 2, 0.0, 100.0);
        card(&mut geometry, 3, 300.0, 200.0);
        card(&mut geometry, 4, 300.0, 300.0);
        let config = RouterConfig::default();
        let connectors = route_connectors(&group_families(&members), &geometry, &config);
        assert_eq!(connectors.len(), 2);
        let trunk_x = |c: &ConnectorDescriptor| match c.path.commands().last() {
            Some(PathCommand::CubicTo { c1x, .. }) => *c1x,
            other => panic!("unexpected {other:?}"),
        };
        let gap = (trunk_x(&connectors[0]) - trunk_x(&connectors[1])).abs();
        assert!(gap >= config.min_drop_gap, "gap {gap}");
    }

    #[test]
    fn recomputing_is_stable() {
        let members = crate::demo::demo_members();
        let groups = group_families(&members);
        let generations = crate::layout::group_by_generation(&members);
        let rows = crate::layout::RowLayout::compute(
            &generations,
            &crate::config::LayoutConfig::default(),
            crate::geometry::ViewportBox::new(1200.0, 800.0),
        );
        let config = RouterConfig::default();
        let first = route_connectors(&groups, &rows, &config);
        let second = route_connectors(&groups, &rows, &config);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
