use restlite::logger;

#[test]
fn configure_logging_creates_the_log_file() {
    let dir = tempfile::tempdir().unwrap();
    logger::configure_logging(Some(dir.path()), Some("debug"), Some(2)).unwrap();
    log::info!("logger smoke test");
    assert!(dir.path().join("restlite.log").exists());
}
