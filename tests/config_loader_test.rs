// Integration tests for building a logger from a TOML config file

use anyhow::Result;
use rlbench::{load_config, record, MetricLogger};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_logger_from_config_file() -> Result<()> {
    let dir = tempdir()?;
    let base = dir.path().join("runs");
    let path = dir.path().join("logger.toml");
    fs::write(
        &path,
        format!(
            r#"
mode = "local"
name = "dqn"
bin_size = 2

[local]
base_dir = "{}"

[metrics.train]
step = "step"
metrics = ["loss"]
"#,
            base.display()
        ),
    )?;

    let config = load_config(&path)?;
    let mut logger = MetricLogger::new(config)?;
    logger.log_binned(&record([("step", 1.into()), ("loss", 2.0.into())]), "train")?;
    logger.log_binned(&record([("step", 2.into()), ("loss", 4.0.into())]), "train")?;
    logger.finish()?;

    let csv = fs::read_to_string(base.join("dqn/metrics/train.csv"))?;
    assert_eq!(csv, "step,loss\n2,3.0");
    assert_eq!(fs::read_to_string(base.join("dqn/status.txt"))?, "finished");
    Ok(())
}

#[test]
fn test_invalid_config_file_names_path() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
mode = "local"
name = "x"
reinit = false

[metrics.train]
step = "step"
metrics = ["loss"]
"#,
    )?;

    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("bad.toml"));
    assert!(format!("{:#}", err).contains("reinit"));
    Ok(())
}
