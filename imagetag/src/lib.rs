use std::{
    collections::HashSet,
    io::Write,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Context;

use self::{manifest::Kustomization, resource::Resource};

pub mod fieldspec;
pub mod image;
pub mod manifest;
pub mod resmap;
pub mod resource;
mod serde_ex;
pub mod transform;

pub use self::resmap::ResourceMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    pub value: T,
    pub path: PathBuf,
}

impl<T> Deref for Located<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// Loads the kustomization at `path`, which is either the file itself or its directory.
pub fn load_kustomization(path: impl AsRef<Path>) -> anyhow::Result<Located<Kustomization>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "load kustomization: path does not exist: {}",
            path.display()
        ));
    }

    let mut path = path.canonicalize()?;
    if path.is_dir() {
        path.push("kustomization.yaml");
    }

    let file = std::fs::File::open(&path)
        .with_context(|| format!("opening kustomization {}", path.display()))?;
    let value = serde_yaml::from_reader(file)
        .with_context(|| format!("parsing kustomization {}", path.display()))?;
    Ok(Located { value, path })
}

/// Loads the resources of a kustomization, descending into directories that hold nested
/// kustomizations. Each path is loaded at most once.
pub fn load_resources(kustomization: &Located<Kustomization>) -> anyhow::Result<ResourceMap> {
    let mut visited = HashSet::new();
    if let Some(dir) = kustomization.path.parent() {
        visited.insert(dir.to_path_buf());
    }

    gather_resources(kustomization, &mut visited)
}

#[tracing::instrument(skip_all, level = "debug", fields(path = %kustomization.path.display()))]
fn gather_resources(
    kustomization: &Located<Kustomization>,
    visited: &mut HashSet<PathBuf>,
) -> anyhow::Result<ResourceMap> {
    let base_path = kustomization
        .path
        .parent()
        .context("kustomization path has no parent directory")?;

    let mut resources = ResourceMap::default();
    for path in kustomization.resources.iter() {
        let path = base_path.join(path);
        let path = path
            .canonicalize()
            .with_context(|| format!("canonicalizing resource path {}", path.display()))?;

        if !visited.insert(path.clone()) {
            continue;
        }

        if path.is_dir() {
            let nested = load_kustomization(&path).with_context(|| {
                format!("loading kustomization resource {}", path.display())
            })?;
            resources
                .merge(gather_resources(&nested, visited)?)
                .with_context(|| format!("merging resources of {}", path.display()))?;
        } else {
            for resource in Resource::load_all(&path)? {
                resources
                    .insert(resource)
                    .with_context(|| format!("loading resource {}", path.display()))?;
            }
        }
    }

    tracing::debug!(count = resources.len(), "gathered resources");
    Ok(resources)
}

/// Records the images used by the kustomization's resources in its `images` field and writes
/// the updated kustomization to `out`.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn discover(path: impl AsRef<Path>, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut kustomization = load_kustomization(path)?;
    let resources = load_resources(&kustomization)?;
    transform::discover_images(&resources, &mut kustomization.value)?;
    serde_yaml::to_writer(&mut *out, &kustomization.value)?;
    Ok(())
}

/// Writes the kustomization's resources to `out` with its `images` applied.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn build(path: impl AsRef<Path>, out: &mut dyn Write) -> anyhow::Result<()> {
    let kustomization = load_kustomization(path)?;
    let mut resources = load_resources(&kustomization)?;
    transform::apply_images(&kustomization.images, &mut resources)?;

    for resource in resources.iter() {
        if resources.len() > 1 {
            writeln!(out, "---")?;
        }
        serde_yaml::to_writer(&mut *out, resource)?;
    }

    Ok(())
}
