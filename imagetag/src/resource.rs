use std::{fmt, ops::Deref, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::manifest::Str;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Gvk {
    pub group: Str,
    pub version: Str,
    pub kind: Str,
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.kind, self.version)
        } else {
            write!(f, "{}.{}.{}", self.kind, self.version, self.group)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub struct GvkMatcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Str>,
}

impl fmt::Display for GvkMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = &self.kind {
            write!(f, "{kind}.")?;
        }

        if let Some(version) = &self.version {
            write!(f, "{version}.")?;
        }

        if let Some(group) = &self.group {
            write!(f, "{group}")
        } else {
            write!(f, "*")
        }
    }
}

impl GvkMatcher {
    pub fn matches(&self, gvk: &Gvk) -> bool {
        (self.group.is_none() || self.group.as_ref() == Some(&gvk.group))
            && (self.version.is_none() || self.version.as_ref() == Some(&gvk.version))
            && (self.kind.is_none() || self.kind.as_ref() == Some(&gvk.kind))
    }
}

/// Identity of a resource. The derived ordering (group, version, kind, name, namespace) is the
/// order in which image discovery visits resources.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResId {
    #[serde(flatten)]
    pub gvk: Gvk,
    pub name: Str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Str>,
}

impl Deref for ResId {
    type Target = Gvk;

    fn deref(&self) -> &Self::Target {
        &self.gvk
    }
}

impl fmt::Debug for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}/{}.{namespace}", self.gvk, self.name)?;
        } else {
            write!(f, "{}/{}", self.gvk, self.name)?;
        }
        Ok(())
    }
}

impl ResId {
    fn of(root: &Object) -> anyhow::Result<Self> {
        let field = |obj: &Object, key: &str| -> anyhow::Result<Str> {
            obj.get(key)
                .and_then(Value::as_str)
                .map(Str::from)
                .with_context(|| format!("missing string field `{key}`"))
        };

        let api_version = field(root, "apiVersion")?;
        let kind = field(root, "kind")?;
        let metadata = root
            .get("metadata")
            .and_then(Value::as_object)
            .context("missing object field `metadata`")?;
        let name = field(metadata, "name").context("reading metadata")?;
        let namespace = metadata
            .get("namespace")
            .and_then(Value::as_str)
            .map(Str::from);

        let (group, version) = api_version
            .split_once('/')
            .map_or(("".into(), api_version.clone()), |(g, v)| {
                (g.into(), v.into())
            });

        Ok(ResId {
            gvk: Gvk {
                group,
                version,
                kind,
            },
            name,
            namespace,
        })
    }
}

pub type Object = serde_json::Map<String, Value>;

/// A single resource document. The root is always an object and is serialized unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResId,
    root: Value,
}

impl Resource {
    pub fn new(root: Value) -> anyhow::Result<Self> {
        let Value::Object(obj) = &root else {
            anyhow::bail!("resource must be an object");
        };

        let id = ResId::of(obj)?;
        Ok(Resource { id, root })
    }

    /// Loads every document in a (possibly multi-document) YAML file, skipping empty documents.
    pub fn load_all(path: impl AsRef<Path>) -> anyhow::Result<Vec<Self>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading resource file {}", path.display()))?;

        let mut resources = vec![];
        for (i, document) in serde_yaml::Deserializer::from_str(&contents).enumerate() {
            let root = Value::deserialize(document)
                .with_context(|| format!("parsing document {i} of {}", path.display()))?;
            if root.is_null() {
                continue;
            }

            let resource = Resource::new(root)
                .with_context(|| format!("loading document {i} of {}", path.display()))?;
            resources.push(resource);
        }

        Ok(resources)
    }

    pub fn id(&self) -> &ResId {
        &self.id
    }

    pub fn name(&self) -> &Str {
        &self.id.name
    }

    pub fn namespace(&self) -> Option<&Str> {
        self.id.namespace.as_ref()
    }

    pub fn gvk(&self) -> &Gvk {
        &self.id.gvk
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let root = Value::deserialize(deserializer)?;
        Resource::new(root)
            .map_err(|err| serde::de::Error::custom(format!("parsing resource: {err:#}")))
    }
}

/// Name and namespace of a builtin transformer's own config object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub name: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Str>,
}
