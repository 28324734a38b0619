use std::collections::HashMap;

use crate::member::{Member, MemberId};

use super::FamilyGroup;

/// Groups children by their exact parent set, in first-encounter order.
///
/// Members without parents belong to no group.
pub fn group_families(members: &[Member]) -> Vec<FamilyGroup> {
    let mut groups: Vec<FamilyGroup> = Vec::new();
    let mut index: HashMap<Vec<MemberId>, usize> = HashMap::new();
    for member in members.iter().filter(|member| member.has_parents()) {
        let (key, parents) = FamilyGroup::key_for(&member.parents);
        let slot = *index.entry(parents.clone()).or_insert_with(|| {
            groups.push(FamilyGroup {
                key,
                parents,
                children: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].children.push(member.id.clone());
    }
    groups
}
