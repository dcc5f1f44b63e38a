use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
/// Reasons a group configuration is rejected.
pub enum GroupConfigError {
    #[error("mutually exclusive group #{0} must name at least two commands")]
    TooSmall(usize),
    #[error("mutually exclusive group #{0} contains an empty command name")]
    EmptyMember(usize),
    #[error("mutually exclusive group #{index} lists '{name}' more than once")]
    DuplicateMember { index: usize, name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Configured sets of commands of which at most one may be force-enabled.
pub struct MutuallyExclusiveGroups {
    groups: Vec<Vec<String>>,
    by_member: BTreeMap<String, Vec<usize>>,
}

impl MutuallyExclusiveGroups {
    pub fn new(groups: Vec<Vec<String>>) -> Result<Self, GroupConfigError> {
        let mut by_member: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut normalized = Vec::with_capacity(groups.len());
        for (index, group) in groups.into_iter().enumerate() {
            if group.len() < 2 {
                return Err(GroupConfigError::TooSmall(index));
            }
            let mut seen = BTreeSet::new();
            let mut members = Vec::with_capacity(group.len());
            for member in group {
                let member = member.trim().to_string();
                if member.is_empty() {
                    return Err(GroupConfigError::EmptyMember(index));
                }
                if !seen.insert(member.clone()) {
                    return Err(GroupConfigError::DuplicateMember {
                        index,
                        name: member,
                    });
                }
                by_member.entry(member.clone()).or_default().push(index);
                members.push(member);
            }
            normalized.push(members);
        }
        Ok(Self {
            groups: normalized,
            by_member,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    /// Members sharing any group with `name`, in configuration order, without `name` itself.
    pub fn rivals_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.by_member
            .get(name)
            .into_iter()
            .flatten()
            .flat_map(move |index| self.groups[*index].iter())
            .map(String::as_str)
            .filter(move |member| *member != name)
    }
}
