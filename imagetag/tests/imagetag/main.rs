use std::path::Path;

use anyhow::Context;

datatest_stable::harness! {
    { test = discover, root = "tests/imagetag/testdata/discover", pattern = r".*/kustomization.yaml" },
    { test = build, root = "tests/imagetag/testdata/build", pattern = r".*/kustomization.yaml" },
}

fn discover(path: &Path) -> datatest_stable::Result<()> {
    check(path, |path, out| imagetag::discover(path, out))
}

fn build(path: &Path) -> datatest_stable::Result<()> {
    check(path, |path, out| imagetag::build(path, out))
}

fn check(
    path: &Path,
    run: fn(&Path, &mut dyn std::io::Write) -> anyhow::Result<()>,
) -> datatest_stable::Result<()> {
    let mut out = std::io::Cursor::new(Vec::new());
    let dir = path.parent().unwrap();

    match run(path, &mut out) {
        Ok(()) => {
            let actual = String::from_utf8(out.into_inner())?;
            snapshot(&dir.join("expected.yaml"), &actual)?;
        }
        Err(err) => {
            eprintln!("Error running {}: {}", path.display(), err);
            snapshot(&dir.join("expected.stderr"), &format!("{err:#}"))?;
        }
    }
    Ok(())
}

fn snapshot(path: &Path, actual: &str) -> datatest_stable::Result<()> {
    if !path.exists() || std::env::var("UPDATE_SNAPSHOTS").is_ok() {
        std::fs::write(path, actual).context("writing snapshot")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(path).context("reading snapshot")?;
    if expected == actual {
        return Ok(());
    }

    let chunks = dissimilar::diff(&expected, actual);
    eprintln!(
        "Snapshot mismatch for {}:\n{}",
        path.display(),
        format_chunks(chunks)
    );

    Err(format!("Snapshot mismatch for {}", path.display()).into())
}

fn format_chunks(chunks: Vec<dissimilar::Chunk<'_>>) -> String {
    let mut buf = String::new();
    for chunk in chunks {
        let formatted = match chunk {
            dissimilar::Chunk::Equal(text) => text.into(),
            dissimilar::Chunk::Delete(text) => format!("\x1b[4m\x1b[31m{}\x1b[0m", text),
            dissimilar::Chunk::Insert(text) => format!("\x1b[4m\x1b[32m{}\x1b[0m", text),
        };
        buf.push_str(&formatted);
    }
    buf
}
