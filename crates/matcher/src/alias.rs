use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One configured group of interchangeable brand or sub-brand spellings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasGroupConfig {
    /// Canonical spelling; always a member of its own group.
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// The set of names a brand resolves to. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasGroup(Arc<BTreeSet<String>>);

impl AliasGroup {
    fn singleton(name: String) -> Self {
        AliasGroup(Arc::new(BTreeSet::from([name])))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Name -> equivalence-set lookup, built once and read-only afterwards.
///
/// A name listed in more than one group resolves to the group that lists it last.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    lookup: HashMap<String, AliasGroup>,
    groups: usize,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the table from `(canonical, aliases)` pairs in configuration order.
    pub fn from_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for (name, members) in groups {
            let set: BTreeSet<String> = std::iter::once(name.as_ref())
                .chain(members.iter().map(|m| m.as_ref()))
                .map(normalize_name)
                .filter(|n| !n.is_empty())
                .collect();
            if set.is_empty() {
                continue;
            }
            let group = AliasGroup(Arc::new(set));
            for member in group.iter() {
                table.lookup.insert(member.to_string(), group.clone());
            }
            table.groups += 1;
        }
        table
    }

    pub fn from_config(groups: &[AliasGroupConfig]) -> Self {
        Self::from_groups(
            groups
                .iter()
                .map(|g| (g.name.as_str(), g.members.iter().map(String::as_str).collect())),
        )
    }

    /// The group `name` belongs to, or `{name}` when it is not configured.
    pub fn resolve_group(&self, name: &str) -> AliasGroup {
        let key = normalize_name(name);
        match self.lookup.get(&key) {
            Some(group) => group.clone(),
            None => AliasGroup::singleton(key),
        }
    }

    pub fn same_group(&self, a: &str, b: &str) -> bool {
        self.resolve_group(a).contains(&normalize_name(b))
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.lookup.contains_key(&normalize_name(name))
    }

    /// Number of configured groups (including ones partly overridden by later groups).
    pub fn group_count(&self) -> usize {
        self.groups
    }

    /// Number of distinct names with a configured group.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
