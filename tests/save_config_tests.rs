//! Behavior of `--save-config` through the full application entry point.
//!
//! The config path is redirected into a scratch directory via
//! `XDG_CONFIG_HOME`, which only the Linux config-dir lookup honors. This
//! file holds a single test so the environment change cannot race another
//! thread in the same process.

#![cfg(target_os = "linux")]

use std::fs;

use clap::Parser;
use imgdedup::cli::Cli;
use imgdedup::run_app;
use tempfile::TempDir;

#[test]
fn save_config_persists_only_runnable_defaults() {
    let config_home = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", config_home.path());
    let config_file = config_home.path().join("imgdedup").join("config.json");

    let pics = TempDir::new().unwrap();
    let pics_arg = pics.path().to_str().unwrap();

    // A method the oracle rejects must fail before anything is persisted.
    let cli = Cli::try_parse_from(["imgdedup", pics_arg, "--save-config", "-m", "whash", "-q"])
        .unwrap();
    let err = run_app(cli).unwrap_err();
    assert!(err.to_string().contains("whash"));
    assert!(!config_file.exists());

    // A runnable combination is saved even when the scan finds no images.
    let cli = Cli::try_parse_from([
        "imgdedup",
        pics_arg,
        "--save-config",
        "-m",
        "dhash",
        "-t",
        "7",
        "-q",
    ])
    .unwrap();
    run_app(cli).unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config_file).unwrap()).unwrap();
    assert_eq!(saved["method"], "dhash");
    assert_eq!(saved["threshold"], 7);

    std::env::remove_var("XDG_CONFIG_HOME");
}
