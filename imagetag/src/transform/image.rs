
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    fieldspec,
    image::ImageRef,
    manifest::{ImageTag, Kustomization, TypeMeta, apiversion, kind},
    resource::Metadata,
};

use super::{ResourceMap, Transformer};

/// Appends an `images` entry to `kustomization` for every distinct image name used by a
/// container in `resources`. The resources are not modified.
///
/// Resources are visited in id order and containers in builtin field spec order, so which tag
/// or digest is recorded for a name used more than once is deterministic: the first one wins.
/// Names are only deduplicated against what this call discovers, entries already in
/// `kustomization.images` are not consulted. Resources without container positions, or with
/// positions of an unexpected shape, contribute nothing.
#[tracing::instrument(skip_all, name = "discover_images", fields(resources = resources.len()))]
pub fn discover_images(
    resources: &ResourceMap,
    kustomization: &mut Kustomization,
) -> anyhow::Result<()> {
    let field_specs = &fieldspec::Builtin::get().images;
    let mut seen = HashSet::new();
    let mut discovered = vec![];

    for resource in resources.iter_sorted() {
        field_specs.visit(resource, |value| {
            let Some(image_ref) = value.as_str() else {
                tracing::debug!(resource = %resource.id(), "skipping non-string image `{value}`");
                return;
            };

            let image = ImageRef::parse(image_ref);
            if image.name.is_empty() {
                tracing::debug!(resource = %resource.id(), "skipping empty image");
                return;
            }

            if seen.insert(image.name.clone()) {
                discovered.push(ImageTag::from(image));
            }
        });
    }

    for image_tag in &discovered {
        if kustomization.images.iter().any(|existing| existing.name == image_tag.name) {
            tracing::debug!(image = %image_tag.name, "image already has an entry, appending another");
        }
    }

    tracing::debug!(count = discovered.len(), "discovered images");
    kustomization.images.extend(discovered);
    Ok(())
}

/// Applies each of `images` to `resources`, in order.
pub fn apply_images(images: &[ImageTag], resources: &mut ResourceMap) -> anyhow::Result<()> {
    for image_tag in images {
        ImageTagTransformer::from(image_tag.clone()).transform(resources)?;
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTagTransformer {
    #[serde(flatten)]
    type_meta: TypeMeta<apiversion::Builtin, kind::ImageTagTransformer>,
    #[serde(default)]
    metadata: Metadata,
    image_tag: ImageTag,
}

impl From<ImageTag> for ImageTagTransformer {
    fn from(image_tag: ImageTag) -> Self {
        Self {
            type_meta: TypeMeta::default(),
            metadata: Metadata::default(),
            image_tag,
        }
    }
}

impl ImageTagTransformer {
    /// The replacement for `image`, if the image is one this transformer targets.
    fn rewrite(&self, image: ImageRef) -> Option<ImageRef> {
        if image.name != self.image_tag.name {
            return None;
        }

        let name = if self.image_tag.new_name.is_empty() {
            image.name
        } else {
            self.image_tag.new_name.clone()
        };

        // `digest` takes precedence over `new_tag`
        let (tag, digest) = if !self.image_tag.digest.is_empty() {
            (None, Some(self.image_tag.digest.clone()))
        } else if !self.image_tag.new_tag.is_empty() {
            (Some(self.image_tag.new_tag.clone()), None)
        } else {
            (image.tag, image.digest)
        };

        Some(ImageRef { name, tag, digest })
    }
}

impl Transformer for ImageTagTransformer {
    #[tracing::instrument(
        skip_all,
        name = "imagetag_transform",
        fields(
            image_tag = %self.image_tag.name,
            new_tag = %self.image_tag.new_tag,
            new_name = %self.image_tag.new_name,
            digest = %self.image_tag.digest,
        )
    )]
    fn transform(&mut self, resources: &mut ResourceMap) -> anyhow::Result<()> {
        let field_specs = &fieldspec::Builtin::get().images;

        for resource in resources.iter_mut() {
            field_specs.apply(resource, |value| {
                let serde_json::Value::String(image_ref) = value else {
                    return Ok(());
                };

                if let Some(image) = self.rewrite(ImageRef::parse(image_ref)) {
                    *image_ref = image.to_string();
                }

                Ok(())
            })?;
        }

        Ok(())
    }
}
