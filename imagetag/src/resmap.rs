use core::fmt;

use indexmap::{IndexMap, map::Entry};

use crate::resource::{ResId, Resource};

/// Resources keyed by their id, in insertion order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResourceMap {
    resources: IndexMap<ResId, Resource>,
}

impl fmt::Debug for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resources.values()).finish()
    }
}

impl ResourceMap {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn insert(&mut self, resource: Resource) -> Result<(), Conflict> {
        match self.resources.entry(resource.id().clone()) {
            Entry::Occupied(_) => Err(Conflict { resource }),
            Entry::Vacant(entry) => {
                entry.insert(resource);
                Ok(())
            }
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Resource> + DoubleEndedIterator {
        self.resources.values()
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl ExactSizeIterator<Item = &mut Resource> + DoubleEndedIterator {
        self.resources.values_mut()
    }

    /// Iterates in `ResId` order, regardless of insertion order.
    pub fn iter_sorted(&self) -> impl ExactSizeIterator<Item = &Resource> {
        let mut resources = self.resources.values().collect::<Vec<_>>();
        resources.sort_by(|a, b| a.id().cmp(b.id()));
        resources.into_iter()
    }

    /// In-place merge of two `ResourceMap`s, any conflicting resources will be an error
    pub fn merge(&mut self, other: ResourceMap) -> Result<(), Conflict> {
        for (_, resource) in other.resources {
            self.insert(resource)?;
        }
        Ok(())
    }
}

impl FromIterator<Resource> for ResourceMap {
    /// Later resources with an already seen id are dropped, use [`ResourceMap::insert`] to detect
    /// conflicts.
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut map = ResourceMap::default();
        for resource in iter {
            let _ = map.insert(resource);
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub resource: Resource,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "may not add resource with an already registered id `{}`",
            self.resource.id()
        )
    }
}

impl std::error::Error for Conflict {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ResourceMap;
    use crate::resource::Resource;

    fn resource(kind: &str, name: &str) -> Resource {
        Resource::new(json!({
            "apiVersion": "v1",
            "kind": kind,
            "metadata": { "name": name },
        }))
        .unwrap()
    }

    #[test]
    fn duplicate_ids_conflict() {
        let mut resources = ResourceMap::default();
        resources.insert(resource("Pod", "a")).unwrap();
        let err = resources.insert(resource("Pod", "a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "may not add resource with an already registered id `Pod.v1/a`"
        );
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn sorted_iteration_ignores_insertion_order() {
        let resources = [
            resource("Service", "b"),
            resource("Pod", "b"),
            resource("Pod", "a"),
        ]
        .into_iter()
        .collect::<ResourceMap>();

        let insertion = resources
            .iter()
            .map(|r| r.id().to_string())
            .collect::<Vec<_>>();
        assert_eq!(insertion, ["Service.v1/b", "Pod.v1/b", "Pod.v1/a"]);

        let sorted = resources
            .iter_sorted()
            .map(|r| r.id().to_string())
            .collect::<Vec<_>>();
        assert_eq!(sorted, ["Pod.v1/a", "Pod.v1/b", "Service.v1/b"]);
    }

    #[test]
    fn merge_appends_in_order() {
        let mut base = [resource("Pod", "a")].into_iter().collect::<ResourceMap>();
        let other = [resource("Pod", "b")].into_iter().collect::<ResourceMap>();
        base.merge(other).unwrap();
        assert_eq!(base.len(), 2);
        assert!(base.merge([resource("Pod", "a")].into_iter().collect()).is_err());
    }
}
