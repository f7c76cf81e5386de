use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg">
<g role="menuitem" aria-label="France"><rect x="1"/></g>
<g role="menuitem" aria-label="Spain"><rect x="2"/></g>
<g role="menuitem" aria-label="France"><rect x="3"/></g>
</svg>
"#;

#[test]
fn splits_map_and_reports_count() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("pixelmap.svg");
    let out = dir.path().join("country_svgs");
    fs::write(&input, MAP)?;

    Command::cargo_bin("mapsplit")?
        .arg(&input)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Created SVG files for 2 countries in "));

    assert!(out.join("france.svg").is_file());
    assert!(out.join("spain.svg").is_file());
    Ok(())
}

#[test]
fn uses_default_paths_in_working_dir() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("pixelmap.svg"), MAP)?;

    Command::cargo_bin("mapsplit")?
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout("Created SVG files for 2 countries in country_svgs\n");

    assert!(dir.path().join("country_svgs").join("spain.svg").is_file());
    Ok(())
}

#[test]
fn json_summary() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("map.svg");
    fs::write(&input, MAP)?;

    let output = Command::cargo_bin("mapsplit")?
        .arg(&input)
        .arg(dir.path().join("out"))
        .arg("--json")
        .output()?;

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(summary["countries"], 2);
    assert_eq!(summary["fragments"], 3);
    assert_eq!(summary["files"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn missing_input_fails() -> TestResult {
    let dir = tempfile::tempdir()?;

    Command::cargo_bin("mapsplit")?
        .arg(dir.path().join("absent.svg"))
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("absent.svg"));
    Ok(())
}

#[test]
fn unlabeled_group_fails_unless_skipped() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("map.svg");
    fs::write(
        &input,
        r#"<svg><g role="menuitem"/><g role="menuitem" aria-label="Peru"/></svg>"#,
    )?;

    Command::cargo_bin("mapsplit")?
        .arg(&input)
        .arg(dir.path().join("strict"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("aria-label"));

    Command::cargo_bin("mapsplit")?
        .arg(&input)
        .arg(dir.path().join("tolerant"))
        .arg("--skip-unlabeled")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 countries"));
    Ok(())
}

#[test]
fn malformed_map_fails() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("broken.svg");
    fs::write(&input, "<svg><g role=\"menuitem\" aria-label=\"France\"></svg>")?;

    Command::cargo_bin("mapsplit")?
        .arg(&input)
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("mismatched closing tag"));
    Ok(())
}
