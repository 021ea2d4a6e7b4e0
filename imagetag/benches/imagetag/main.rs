use imagetag::{
    ResourceMap,
    manifest::Kustomization,
    resource::Resource,
    transform::{apply_images, discover_images},
};
use serde_json::json;

fn main() {
    divan::main();
}

fn deployments(n: usize) -> ResourceMap {
    (0..n)
        .map(|i| {
            Resource::new(json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": { "name": format!("deploy-{i}") },
                "spec": { "template": { "spec": {
                    "initContainers": [{ "name": "init", "image": "busybox" }],
                    "containers": [
                        { "name": "app", "image": format!("registry.local:5000/app-{}:v{i}", i % 16) },
                        { "name": "proxy", "image": "nginx:1.7.9" },
                    ],
                } } },
            }))
            .unwrap()
        })
        .collect()
}

#[divan::bench(args = [10, 100, 1000])]
fn discover(bencher: divan::Bencher, n: usize) {
    let resources = deployments(n);
    bencher.bench_local(|| {
        let mut kustomization = Kustomization::default();
        discover_images(&resources, &mut kustomization).unwrap();
        kustomization
    });
}

#[divan::bench(args = [10, 100, 1000])]
fn write_back(bencher: divan::Bencher, n: usize) {
    let resources = deployments(n);
    let mut kustomization = Kustomization::default();
    discover_images(&resources, &mut kustomization).unwrap();

    bencher
        .with_inputs(|| resources.clone())
        .bench_local_values(|mut resources| {
            apply_images(&kustomization.images, &mut resources).unwrap();
            resources
        });
}
