//! Integration tests for the `cmsg` invocation, using a stand-in script on PATH.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use serial_test::serial;

use git_bard::error::RewriteError;
use git_bard::rewrite::{Cmsg, RewriteMechanism, check_cmsg_installed};

/// Write an executable `cmsg` that records its arguments and exits with `code`.
fn install_fake_cmsg(dir: &Path, code: i32) {
    let log = dir.join("args.log");
    let script = format!(
        "#!/bin/sh\nfor arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '{}'; done\nexit {}\n",
        log.display(),
        code
    );
    let path = dir.join("cmsg");
    std::fs::write(&path, script).expect("Failed to write fake cmsg");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake cmsg executable");
}

fn reword_with_path(dir: &Path, id: &str, message: &str) -> Result<Option<i32>, RewriteError> {
    temp_env::with_var("PATH", Some(dir), || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime")
            .block_on(Cmsg.reword(id, message))
    })
}

#[test]
#[serial]
fn test_cmsg_receives_commit_and_message() {
    let dir = tempfile::tempdir().unwrap();
    install_fake_cmsg(dir.path(), 0);

    let code = reword_with_path(dir.path(), "abc1234", " -1 urgent fix").unwrap();
    assert_eq!(code, Some(0));

    let args = std::fs::read_to_string(dir.path().join("args.log")).unwrap();
    assert_eq!(args, "-c\nabc1234\n-m\n -1 urgent fix\n");
}

#[test]
#[serial]
fn test_cmsg_nonzero_exit_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    install_fake_cmsg(dir.path(), 3);

    let code = reword_with_path(dir.path(), "abc1234", "fix: x").unwrap();
    assert_eq!(code, Some(3));
}

#[test]
#[serial]
fn test_check_cmsg_installed_uses_path() {
    let dir = tempfile::tempdir().unwrap();

    temp_env::with_var("PATH", Some(dir.path()), || {
        assert!(matches!(
            check_cmsg_installed(),
            Err(RewriteError::NotInstalled)
        ));
    });

    install_fake_cmsg(dir.path(), 0);
    temp_env::with_var("PATH", Some(dir.path()), || {
        assert!(check_cmsg_installed().is_ok());
    });
}

#[test]
#[serial]
fn test_missing_cmsg_is_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let result = reword_with_path(dir.path(), "abc1234", "fix: x");
    assert!(matches!(result, Err(RewriteError::SpawnFailed(_))));
}
