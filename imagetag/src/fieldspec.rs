mod builtin;

use core::fmt;
use std::{ops::Deref, str::FromStr};

pub use self::builtin::Builtin;

use crate::{
    manifest::Str,
    resource::{GvkMatcher, Resource},
};
use anyhow::{Context as _, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// See kustomize/api/konfig/builtinpluginconsts

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub matcher: GvkMatcher,
    #[serde(with = "crate::serde_ex::string")]
    pub path: FieldPath,
}

#[derive(Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Box<[FieldPathSegment]>,
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#""{self}""#)
    }
}

impl Deref for FieldPath {
    type Target = [FieldPathSegment];

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

pub type PathRef<'a> = &'a [FieldPathSegment];

impl FromStr for FieldPath {
    type Err = anyhow::Error;

    // TODO Need to handle escaping of '/' by '\'
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('/')
            .map(|segment| segment.parse::<FieldPathSegment>())
            .collect::<Result<Box<_>, _>>()?;

        Ok(FieldPath { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.segments
                .iter()
                .map(|segment| segment.to_string())
                .collect::<Vec<_>>()
                .join("/")
        )
    }
}

/// `name` selects a field of an object, `name[]` selects every item of the sequence at `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPathSegment {
    Field(Str),
    Array(Str),
}

impl FieldPathSegment {
    pub fn field(&self) -> &str {
        match self {
            FieldPathSegment::Field(field) | FieldPathSegment::Array(field) => field,
        }
    }
}

impl fmt::Display for FieldPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPathSegment::Field(field) => write!(f, "{field}"),
            FieldPathSegment::Array(field) => write!(f, "{field}[]"),
        }
    }
}

impl FromStr for FieldPathSegment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (segment, field) = match s.strip_suffix("[]") {
            Some(field) => (FieldPathSegment::Array(field.into()), field),
            None => (FieldPathSegment::Field(s.into()), s),
        };

        if field.is_empty() {
            bail!("field path segment cannot be empty");
        }

        Ok(segment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSpecs {
    specs: Vec<FieldSpec>,
}

impl Deref for FieldSpecs {
    type Target = [FieldSpec];

    fn deref(&self) -> &Self::Target {
        &self.specs
    }
}

impl FieldSpecs {
    /// Calls `f` with every value the specs select in `resource`, in spec order.
    pub fn visit(&self, resource: &Resource, mut f: impl FnMut(&Value)) {
        for spec in &self.specs {
            spec.visit(resource, &mut f);
        }
    }

    pub fn apply(
        &self,
        resource: &mut Resource,
        mut f: impl FnMut(&mut Value) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        for spec in &self.specs {
            spec.apply(resource, &mut f)?;
        }

        Ok(())
    }
}

impl FieldSpec {
    /// Calls `f` with every value at this spec's path in `resource`.
    ///
    /// A path the resource does not have selects nothing. That covers missing fields and nulls,
    /// a non-object where the path continues into an object, a non-sequence at a `name[]`
    /// segment, and sequence items that are not objects when the path continues past them.
    pub fn visit(&self, resource: &Resource, f: &mut impl FnMut(&Value)) {
        if !self.matcher.matches(resource.id()) {
            return;
        }

        fn go(curr: &Value, path: PathRef<'_>, f: &mut impl FnMut(&Value)) {
            let Some((segment, rest)) = path.split_first() else {
                f(curr);
                return;
            };

            match (segment, curr.get(segment.field())) {
                (_, None | Some(Value::Null)) => {}
                (FieldPathSegment::Field(_), Some(next)) => go(next, rest, f),
                (FieldPathSegment::Array(_), Some(Value::Array(items))) => {
                    for item in items.iter().filter(|item| rest.is_empty() || item.is_object()) {
                        go(item, rest, f);
                    }
                }
                (FieldPathSegment::Array(field), Some(_)) => {
                    tracing::debug!("skipping `{field}`, it is not a sequence");
                }
            }
        }

        go(resource.root(), &self.path, f)
    }

    /// Like [`FieldSpec::visit`], but `f` may modify the selected values. Only errors from `f`
    /// are returned.
    pub fn apply(
        &self,
        resource: &mut Resource,
        f: &mut impl FnMut(&mut Value) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        if !self.matcher.matches(resource.id()) {
            return Ok(());
        }

        fn go(
            curr: &mut Value,
            path: PathRef<'_>,
            f: &mut impl FnMut(&mut Value) -> anyhow::Result<()>,
        ) -> anyhow::Result<()> {
            let Some((segment, rest)) = path.split_first() else {
                return f(curr);
            };

            match (segment, curr.get_mut(segment.field())) {
                (_, None | Some(Value::Null)) => Ok(()),
                (FieldPathSegment::Field(_), Some(next)) => go(next, rest, f),
                (FieldPathSegment::Array(_), Some(Value::Array(items))) => {
                    for item in items
                        .iter_mut()
                        .filter(|item| rest.is_empty() || item.is_object())
                    {
                        go(item, rest, f)?;
                    }
                    Ok(())
                }
                (FieldPathSegment::Array(field), Some(_)) => {
                    tracing::debug!("skipping `{field}`, it is not a sequence");
                    Ok(())
                }
            }
        }

        go(resource.root_mut(), &self.path, f).with_context(|| {
            format!(
                "applying field spec `{}` `{}` to resource {}",
                self.matcher,
                self.path,
                resource.id()
            )
        })
    }
}
