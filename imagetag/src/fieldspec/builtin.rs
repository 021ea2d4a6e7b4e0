use std::sync::OnceLock;

use super::FieldSpecs;

const IMAGES: &[u8] = include_bytes!("images.yaml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtin {
    /// Container image fields. Pod templates come before bare pod specs and, within a pod spec,
    /// `containers` before `initContainers`.
    pub images: FieldSpecs,
}

impl Builtin {
    pub fn get() -> &'static Self {
        static INSTANCE: OnceLock<Builtin> = OnceLock::new();
        INSTANCE.get_or_init(|| Builtin {
            images: serde_yaml::from_slice::<FieldSpecs>(IMAGES).expect("images"),
        })
    }
}

#[cfg(test)]
#[test]
fn ensure_builtin_fieldspecs_valid() {
    let images = &Builtin::get().images;
    assert_eq!(images.len(), 6);
    assert_eq!(
        images[0].path.to_string(),
        "spec/template/spec/containers[]/image"
    );
}
