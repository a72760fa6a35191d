//! DLL search path resolution from a runner config.

use malbrose_core::Config;
use malbrose_runner::loader::DllSearchPath;
use tempfile::TempDir;

#[test]
fn test_default_config_searches_ucrt() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("ucrt")).unwrap();
    std::fs::write(dir.path().join("ucrt").join("vcruntime140.dll"), b"").unwrap();

    let config = Config::default();
    let path = DllSearchPath::resolve(
        &dir.path().join("malbrose-runner.exe"),
        &config.loader.search_subdirs,
    )
    .unwrap();

    assert_eq!(path.search_paths(), &[dir.path().join("ucrt")]);
    assert_eq!(
        path.locate("vcruntime140.dll"),
        Some(dir.path().join("ucrt").join("vcruntime140.dll"))
    );
}
