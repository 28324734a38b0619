use std::collections::BTreeMap;

use crate::member::Member;

use super::Generations;

/// Buckets members into generation rows. Keys come out oldest first.
pub fn group_by_generation(members: &[Member]) -> Generations {
    let mut rows: BTreeMap<i64, Vec<Member>> = BTreeMap::new();
    for member in members {
        rows.entry(member.generation).or_default().push(member.clone());
    }
    let keys = rows.keys().rev().copied().collect();
    Generations { keys, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_descending_and_unique() {
        let members = vec![
            Member::new(1, "a", 0),
            Member::new(2, "b", 2),
            Member::new(3, "c", -1),
            Member::new(4, "d", 2),
        ];
        let generations = group_by_generation(&members);
        assert_eq!(generations.keys, vec![2, 0, -1]);
        assert_eq!(generations.row(2).len(), 2);
        assert_eq!(generations.index_of(-1), Some(2));
    }

    #[test]
    fn empty_input_is_empty() {
        let generations = group_by_generation(&[]);
        assert!(generations.is_empty());
        assert!(generations.row(0).is_empty());
    }
}
