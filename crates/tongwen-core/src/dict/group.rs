use super::{DictRef, Dictionary, Match};

/// A priority-ordered union of dictionaries queried as one.
///
/// `longest_match` returns the longest match across all members; on a length
/// tie the member earliest in the list wins. Members are shared handles, so
/// a group never copies trie data and groups may nest.
pub struct DictGroup {
    members: Vec<DictRef>,
    max_key_length: usize,
}

impl DictGroup {
    pub fn new(members: Vec<DictRef>) -> Self {
        let max_key_length = members.iter().map(|d| d.max_key_length()).max().unwrap_or(0);
        Self {
            members,
            max_key_length,
        }
    }

    pub fn members(&self) -> &[DictRef] {
        &self.members
    }
}

impl Dictionary for DictGroup {
    fn longest_match(&self, text: &str) -> Option<Match<'_>> {
        let mut best: Option<Match<'_>> = None;
        for member in &self.members {
            let floor = best.map_or(0, |m| m.char_len);
            // A member whose keys are all no longer than the current best
            // can only tie, and ties go to the earlier member.
            if floor > 0 && member.max_key_length() <= floor {
                continue;
            }
            if let Some(m) = member.longest_match(text) {
                if m.char_len > floor {
                    best = Some(m);
                }
            }
        }
        best
    }

    fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    fn len(&self) -> usize {
        self.members.iter().map(|d| d.len()).sum()
    }
}
