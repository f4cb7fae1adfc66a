use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};

use snapviz::cli::{cmd_diff, cmd_metrics_json, cmd_pic, cmd_series, list_dumps, OutputOpts};
use snapviz::{MemSnapshot, Snapshot, Taxonomy, VizError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("snapviz-cli-{prefix}-{pid}-{t}-{id}"))
}

fn opts(out_dir: &Path) -> OutputOpts {
    OutputOpts {
        out_dir: Some(out_dir.to_path_buf()),
        no_render: true,
        ..OutputOpts::default()
    }
}

#[test]
fn jsonl_dump_write_then_load() -> Result<()> {
    let root = unique_root("dump");
    fs::create_dir_all(&root)?;
    let path = root.join("s.jsonl");

    let snap = MemSnapshot::from_pairs([
        (&b"h\x00\xff"[..], &b"v1"[..]),
        (&b"LastBlock"[..], &b""[..]),
    ]);
    snap.write_jsonl(&path)?;

    let text = fs::read_to_string(&path)?;
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains(r#""key_hex":"6800ff""#));

    let back = MemSnapshot::load_jsonl(&path)?;
    assert_eq!(back, snap);
    assert_eq!(back.get(b"LastBlock")?, Some(Vec::new()));
    Ok(())
}

#[test]
fn dump_with_bad_line_names_the_line() -> Result<()> {
    let root = unique_root("baddump");
    fs::create_dir_all(&root)?;
    let path = root.join("bad.jsonl");
    fs::write(
        &path,
        "{\"key_hex\":\"61\",\"value_hex\":\"01\"}\n\n{\"key_hex\":\"6\",\"value_hex\":\"01\"}\n",
    )?;

    let err = match MemSnapshot::load_jsonl(&path) {
        Ok(_) => return Err(anyhow!("odd hex must be rejected")),
        Err(e) => e,
    };
    match err.downcast_ref::<VizError>() {
        Some(VizError::Dump { line, reason, .. }) => {
            assert_eq!(*line, 3);
            assert!(reason.starts_with("key_hex"), "{reason}");
        }
        other => return Err(anyhow!("unexpected error: {:?}", other)),
    }
    Ok(())
}

#[test]
fn taxonomy_file_overrides_builtin_table() -> Result<()> {
    let root = unique_root("tax");
    fs::create_dir_all(&root)?;
    let tax_path = root.join("tax.json");
    fs::write(
        &tax_path,
        r#"[{"prefix": "acct", "label": "Accounts"}, {"prefix": "a", "label": "Anything a"}]"#,
    )?;
    let tax = Taxonomy::from_json_file(&tax_path)?;
    assert_eq!(tax.len(), 2);
    assert_eq!(tax.label(tax.classify(b"acct1").category), "Accounts");
    assert_eq!(tax.label(tax.classify(b"a1").category), "Anything a");

    fs::write(&tax_path, r#"[{"prefix": "", "label": "Empty"}]"#)?;
    assert!(Taxonomy::from_json_file(&tax_path).is_err());
    Ok(())
}

#[test]
fn diff_command_writes_diagrams() -> Result<()> {
    let root = unique_root("diff");
    fs::create_dir_all(&root)?;
    let before = root.join("before.jsonl");
    let after = root.join("after.jsonl");
    MemSnapshot::from_pairs([(&b"h1"[..], &b"a"[..])]).write_jsonl(&before)?;
    MemSnapshot::from_pairs([(&b"h1"[..], &b"b"[..]), (&b"zz"[..], &b"c"[..])])
        .write_jsonl(&after)?;

    let out = root.join("out");
    let o = OutputOpts {
        json: true,
        ..opts(&out)
    };
    cmd_diff(&before, &after, 7, &o)?;

    assert!(out.join("changes_7.dot").exists());
    assert!(out.join("changes_7_h_0.dot").exists());
    assert!(out.join("changes_7_hashes_1.dot").exists());
    Ok(())
}

#[test]
fn series_and_database_map_picture() -> Result<()> {
    let root = unique_root("pic");
    fs::create_dir_all(&root)?;
    MemSnapshot::new().write_jsonl(&root.join("00.jsonl"))?;
    MemSnapshot::from_pairs([(&b"h1"[..], &b"a"[..])]).write_jsonl(&root.join("01.jsonl"))?;
    MemSnapshot::from_pairs([(&b"h1"[..], &b"a"[..]), (&b"r1"[..], &b"b"[..])])
        .write_jsonl(&root.join("02.jsonl"))?;
    fs::write(root.join("notes.txt"), "not a dump")?;

    let dumps = list_dumps(&root)?;
    assert_eq!(dumps.len(), 3);
    assert!(dumps[0].ends_with("00.jsonl"));

    // одного дампа мало
    let out = root.join("series");
    assert!(cmd_series(&dumps[..1], &opts(&out)).is_err());

    let out = root.join("pic");
    cmd_pic("database_map", &root, &opts(&out))?;
    assert!(out.join("changes_0_h_0.dot").exists());
    assert!(out.join("changes_1_r_0.dot").exists());
    Ok(())
}

#[test]
fn unknown_picture_prints_usage_and_succeeds() -> Result<()> {
    let root = unique_root("unknown");
    let out = root.join("out");
    cmd_pic("no_such_picture", &root, &opts(&out))?;
    assert!(!out.exists());
    cmd_metrics_json()?;
    Ok(())
}
