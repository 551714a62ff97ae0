// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use assert_cmd::Command;
use tempfile::TempDir;

/// Minimal PNG: signature plus an IHDR chunk with the given dimensions.
fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}

fn write_project(source: &TempDir, target: &TempDir) -> std::path::PathBuf {
    let project = serde_json::json!({
        "name": "CLI Project",
        "version": "1.0",
        "sourceConnection": source.path().to_string_lossy(),
        "targetConnection": target.path().to_string_lossy(),
        "tags": [
            {"name": "car", "color": "#FF0000"},
            {"name": "bike", "color": "#00FF00"}
        ],
        "assets": {}
    });
    let path = target.path().join("project.json");
    std::fs::write(&path, serde_json::to_string_pretty(&project).unwrap()).unwrap();
    path
}

#[test]
fn test_label_map() -> Result<(), Box<dyn std::error::Error>> {
    let source = TempDir::new()?;
    let target = TempDir::new()?;
    let project = write_project(&source, &target);

    let mut cmd = Command::cargo_bin("labelkit")?;
    cmd.arg("label-map").arg(&project);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("id: 1"))
        .stdout(predicates::str::contains("name: \"car\""))
        .stdout(predicates::str::contains("name: \"bike\""));
    Ok(())
}

#[test]
fn test_export_and_inspect() -> Result<(), Box<dyn std::error::Error>> {
    let source = TempDir::new()?;
    let target = TempDir::new()?;
    std::fs::write(source.path().join("street.png"), tiny_png(40, 20))?;
    std::fs::write(
        target.path().join("street.png.labels.json"),
        serde_json::json!({
            "version": "1.0",
            "regions": [{
                "id": "r1",
                "type": "rectangle",
                "tags": ["car"],
                "points": [{"x": 4.0, "y": 2.0}, {"x": 20.0, "y": 10.0}]
            }]
        })
        .to_string(),
    )?;
    let project = write_project(&source, &target);

    let mut cmd = Command::cargo_bin("labelkit")?;
    cmd.arg("export").arg(&project);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Exported 1/1 assets"));

    let record = target
        .path()
        .join("CLI-Project-TFRecords-export")
        .join("street.tfrecord");
    assert!(record.exists());
    assert!(
        target
            .path()
            .join("CLI-Project-TFRecords-export")
            .join("tf_label_map.pbtxt")
            .exists()
    );

    let mut cmd = Command::cargo_bin("labelkit")?;
    cmd.arg("inspect").arg(&record);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("1 record(s), outcome: Complete"))
        .stdout(predicates::str::contains("street.png 40x20 with 1 object(s)"));
    Ok(())
}

#[test]
fn test_export_rejects_unknown_asset_state() -> Result<(), Box<dyn std::error::Error>> {
    let source = TempDir::new()?;
    let target = TempDir::new()?;
    let project = write_project(&source, &target);

    let mut cmd = Command::cargo_bin("labelkit")?;
    cmd.arg("export")
        .arg(&project)
        .arg("--asset-state")
        .arg("everything");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn test_inspect_reports_corruption() -> Result<(), Box<dyn std::error::Error>> {
    let target = TempDir::new()?;
    let path = target.path().join("junk.tfrecord");
    std::fs::write(&path, [0u8; 7])?;

    let mut cmd = Command::cargo_bin("labelkit")?;
    cmd.arg("inspect").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("0 record(s)"))
        .stdout(predicates::str::contains("Truncated"));
    Ok(())
}
