mod image;

pub use self::image::{ImageTagTransformer, apply_images, discover_images};

use crate::resmap::ResourceMap;

pub trait Transformer {
    fn transform(&mut self, resources: &mut ResourceMap) -> anyhow::Result<()>;
}
