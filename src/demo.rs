//! Built-in sample family, four generations deep.

use crate::member::{Member, MemberId};

const DEMO_MEMBERS: [(&str, &str, i64); 8] = [
    ("William Johnson", "Great Grandfather", 3),
    ("Eleanor Johnson", "Great Grandmother", 3),
    ("Robert Smith", "Grandfather", 2),
    ("Margaret Smith", "Grandmother", 2),
    ("James Smith", "Father", 1),
    ("Sarah Smith", "Mother", 1),
    ("Michael Smith", "Self", 0),
    ("Emily Smith", "Sister", 0),
];

/// Child name → parent names.
const DEMO_RELATIONSHIPS: [(&str, [&str; 2]); 4] = [
    ("Robert Smith", ["William Johnson", "Eleanor Johnson"]),
    ("James Smith", ["Robert Smith", "Margaret Smith"]),
    ("Michael Smith", ["James Smith", "Sarah Smith"]),
    ("Emily Smith", ["James Smith", "Sarah Smith"]),
];

const DEMO_AVATARS: [u8; 8] = [70, 47, 12, 49, 33, 45, 68, 5];

/// Demo members with ids `1..=8` and parents resolved by name.
pub fn demo_members() -> Vec<Member> {
    let mut members: Vec<Member> = DEMO_MEMBERS
        .iter()
        .zip(DEMO_AVATARS)
        .enumerate()
        .map(|(idx, ((name, relation, generation), avatar))| {
            let mut member = Member::new(idx as i64 + 1, *name, *generation).with_relation(*relation);
            member.image_url = Some(format!("https://i.pravatar.cc/150?img={avatar}"));
            member
        })
        .collect();

    for (child, parent_names) in DEMO_RELATIONSHIPS {
        let parents: Vec<MemberId> = parent_names
            .iter()
            .filter_map(|name| find_by_name(&members, name))
            .collect();
        if let Some(slot) = members.iter().position(|m| m.name == child) {
            let member = members[slot].clone();
            members[slot] = member.with_parents(parents);
        }
    }
    members
}

fn find_by_name(members: &[Member], name: &str) -> Option<MemberId> {
    members.iter().find(|m| m.name == name).map(|m| m.id.clone())
}
