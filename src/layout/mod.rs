mod family;
mod generation;
mod routing;
mod rows;
pub(crate) mod types;
pub use family::*;
pub use generation::*;
pub use routing::*;
pub use rows::*;
pub use types::*;

use crate::config::{LayoutConfig, RouterConfig};
use crate::geometry::{GeometryProvider, ViewportBox};
use crate::member::Member;

/// Output of one full layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    pub generations: Generations,
    pub families: Vec<FamilyGroup>,
    pub connectors: Vec<ConnectorDescriptor>,
}

/// Groups members and routes connectors against `geometry`.
pub fn compute_tree(members: &[Member], geometry: &dyn GeometryProvider, config: &RouterConfig) -> TreeLayout {
    let generations = group_by_generation(members);
    let families = group_families(members);
    let connectors = route_connectors(&families, geometry, config);
    TreeLayout {
        generations,
        families,
        connectors,
    }
}

/// Places rows with [`RowLayout`] and routes against that placement.
pub fn compute_static_tree(
    members: &[Member],
    layout: &LayoutConfig,
    router: &RouterConfig,
    viewport: ViewportBox,
) -> (TreeLayout, RowLayout) {
    let generations = group_by_generation(members);
    let rows = RowLayout::compute(&generations, layout, viewport);
    let families = group_families(members);
    let connectors = route_connectors(&families, &rows, router);
    (
        TreeLayout {
            generations,
            families,
            connectors,
        },
        rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberId;

    #[test]
    fn nuclear_family_scenario() {
        let members = vec![
            Member::new(1, "a", 1),
            Member::new(2, "b", 1),
            Member::new(3, "c", 0).with_parents([1, 2]),
        ];
        let (tree, _) = compute_static_tree(
            &members,
            &LayoutConfig::default(),
            &RouterConfig::default(),
            ViewportBox::new(1200.0, 800.0),
        );
        assert_eq!(tree.generations.keys, vec![1, 0]);
        let spouses: Vec<_> = tree
            .connectors
            .iter()
            .filter(|c| c.kind == ConnectorKind::Spouse)
            .collect();
        assert_eq!(spouses.len(), 1);
        let links: Vec<_> = tree
            .connectors
            .iter()
            .filter(|c| c.kind == ConnectorKind::ParentChild)
            .collect();
        assert_eq!(links.len(), 1);
        assert!(links[0].id.ends_with(&format!(":{}", MemberId::from(3))));
    }

    #[test]
    fn orphans_are_never_children() {
        let members = crate::demo::demo_members();
        let (tree, _) = compute_static_tree(
            &members,
            &LayoutConfig::default(),
            &RouterConfig::default(),
            ViewportBox::new(1200.0, 800.0),
        );
        for member in members.iter().filter(|m| !m.has_parents()) {
            let suffix = format!(":{}", member.id);
            assert!(
                !tree
                    .connectors
                    .iter()
                    .any(|c| c.kind == ConnectorKind::ParentChild && c.id.ends_with(&suffix)),
                "{} has no parents but appears as a child",
                member.name
            );
        }
    }
}
