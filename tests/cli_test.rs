/*!
 * End-to-end tests for the orbit-snapshot binary against a fake zfs script
 */

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FAKE_ZFS: &str = r#"#!/bin/sh
case "$1" in
  list)
    if [ "$3" = "filesystem" ]; then
      printf 'tank\t-\t1G\t9G\t96K\t/tank\n'
      printf 'tank/data\t-\t1G\t9G\t96K\t/tank/data\n'
    else
      printf 'tank/data@auto_daily_20000101\t-\t0B\t-\t96K\t-\n'
      printf 'tank/data@auto_daily_20000102\t-\t0B\t-\t96K\t-\n'
      printf 'tank/data@before-upgrade\t-\t0B\t-\t96K\t-\n'
    fi
    exit 0
    ;;
esac
echo "unexpected zfs $*" >&2
exit 1
"#;

fn orbit_snapshot(args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_orbit-snapshot"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn write_config(dir: &Path, name: &str, zfs: &Path, volume: &str) -> PathBuf {
    let path = dir.join(name);
    let config = format!(
        "zfs_binary = \"{}\"\ndry_run = true\n\n[[volume]]\nname = \"{}\"\ndaily = 1\n",
        zfs.display(),
        volume
    );
    std::fs::write(&path, config).unwrap();
    path
}

/// Single test so the fake binary is never written while another test forks
#[test]
fn test_cli_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let zfs = dir.path().join("zfs");
    std::fs::write(&zfs, FAKE_ZFS).unwrap();
    std::fs::set_permissions(&zfs, std::fs::Permissions::from_mode(0o755)).unwrap();

    // Unreadable config is fatal
    let output = orbit_snapshot(&[&dir.path().join("missing.toml")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.toml"));

    // Malformed config is fatal
    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[[volume]]\nname = \"tank\"\ndaily = -3\n").unwrap();
    let output = orbit_snapshot(&[&bad]);
    assert_eq!(output.status.code(), Some(2));

    // Dry run plans creation and eviction without calling zfs snapshot/destroy
    let config = write_config(dir.path(), "ok.toml", &zfs, "tank/data");
    let output = orbit_snapshot(&[&config]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let today = chrono::Local::now().date_naive().format("%Y%m%d").to_string();
    assert!(stdout.contains(&format!("would create tank/data@auto_daily_{}", today)));
    assert!(stdout.contains("would destroy tank/data@auto_daily_20000101"));
    assert!(stdout.contains("would destroy tank/data@auto_daily_20000102"));
    assert!(!stdout.contains("before-upgrade"));

    // Unknown volume fails that volume with a non-zero exit
    let config = write_config(dir.path(), "missing-volume.toml", &zfs, "tank/missing");
    let output = orbit_snapshot(&[&config]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tank/missing"));

    // An abort on the second volume still prints the plan for the first
    let config = dir.path().join("abort.toml");
    std::fs::write(
        &config,
        format!(
            "zfs_binary = \"{}\"\ndry_run = true\n\n[[volume]]\nname = \"tank/data\"\ndaily = 1\n\n[[volume]]\nname = \"tank/missing\"\ndaily = 1\n",
            zfs.display()
        ),
    )
    .unwrap();
    let output = orbit_snapshot(&[&config]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("would create tank/data@auto_daily_{}", today)));
    assert!(stdout.contains("would destroy tank/data@auto_daily_20000101"));
}
