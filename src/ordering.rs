use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use crate::{GroupIdentity, GroupKey, OrderingPolicy, SummaryRow};

/// A destination PoP reachable from a source city, with the location key
/// `/boxplot` expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub server_pop: String,
    pub key: String,
}

/// A client city where a distinguished operator has summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCity {
    pub label: String,
    pub city: String,
    pub country: String,
    pub destinations: Vec<Destination>,
}

impl OrderingPolicy {
    pub fn is_distinguished(&self, group: &GroupIdentity) -> bool {
        self.distinguished.contains(&group.asn)
    }

    /// Display order: distinguished operators in encounter order, then the
    /// rest sorted by name (byte order, ASN as tie-break). Repeated
    /// identities keep their first position only.
    pub fn order<I>(&self, groups: I) -> Vec<GroupIdentity>
    where
        I: IntoIterator<Item = GroupIdentity>,
    {
        let mut seen = HashSet::new();
        let mut distinguished = Vec::new();
        let mut others = Vec::new();

        for group in groups {
            if !seen.insert(group.clone()) {
                continue;
            }
            if self.is_distinguished(&group) {
                distinguished.push(group);
            } else {
                others.push(group);
            }
        }

        others.sort_by(|a, b| a.name.cmp(&b.name).then(a.asn.cmp(&b.asn)));
        distinguished.extend(others);
        distinguished
    }

    /// Operators present in `keys`, in display order.
    pub fn order_keys<'a, I>(&self, keys: I) -> Vec<GroupIdentity>
    where
        I: IntoIterator<Item = &'a GroupKey>,
    {
        self.order(keys.into_iter().map(|key| key.group.clone()))
    }

    /// Groups kept in a single-location view: every distinguished group,
    /// then the others with the most measurements until
    /// `max_location_groups` is reached. Ties go to name, then ASN.
    pub fn top_groups<'a, I>(&self, rows: I) -> HashSet<GroupIdentity>
    where
        I: IntoIterator<Item = &'a SummaryRow>,
    {
        let mut totals: HashMap<&GroupIdentity, u64> = HashMap::new();
        for row in rows {
            *totals.entry(&row.group).or_default() += row.measurements();
        }

        let (distinguished, mut others): (Vec<_>, Vec<_>) = totals
            .into_iter()
            .partition(|(group, _)| self.is_distinguished(group));

        others.sort_by(|(a, a_count), (b, b_count)| {
            b_count
                .cmp(a_count)
                .then_with(|| a.name.cmp(&b.name))
                .then(a.asn.cmp(&b.asn))
        });

        let room = self.max_location_groups.saturating_sub(distinguished.len());
        distinguished
            .into_iter()
            .chain(others.into_iter().take(room))
            .map(|(group, _)| group.clone())
            .collect()
    }

    /// Source cities with distinguished-operator rows, sorted by label, each
    /// with its sorted destination PoPs.
    pub fn source_cities<'a, I>(&self, rows: I) -> Vec<SourceCity>
    where
        I: IntoIterator<Item = &'a SummaryRow>,
    {
        let mut cities: BTreeMap<String, SourceCity> = BTreeMap::new();
        let mut pops: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

        for row in rows.into_iter().filter(|row| self.is_distinguished(&row.group)) {
            let location = &row.location;
            let label = format!("{}, {}", location.city, location.country);
            pops.entry(label.clone())
                .or_default()
                .insert(location.server_pop.clone(), row.key.clone());
            cities.entry(label.clone()).or_insert_with(|| SourceCity {
                label,
                city: location.city.clone(),
                country: location.country.clone(),
                destinations: Vec::new(),
            });
        }

        cities
            .into_iter()
            .map(|(label, mut source)| {
                source.destinations = pops
                    .remove(&label)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(server_pop, key)| Destination { server_pop, key })
                    .collect();
                source
            })
            .collect()
    }
}
