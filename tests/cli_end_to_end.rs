use assert_cmd::Command;
use predicates::str::contains;
use std::io::Write;
use tempfile::NamedTempFile;

fn bakehouse() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bakehouse"));
    cmd.env_remove("BAKEHOUSE_CONFIG_FILE").env("RUST_LOG", "info");
    cmd
}

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write json");
    file
}

#[test]
fn seed_catalog_prints_merged_catalog() {
    let assert = bakehouse().arg("seed-catalog").assert().success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let listing: serde_json::Value = serde_json::from_str(&output).expect("stdout is JSON");

    let flavors = listing["flavors"].as_array().expect("flavors");
    let vanilla = flavors
        .iter()
        .find(|flavor| flavor["name"] == "Vainilla")
        .expect("vanilla listed");
    assert_eq!(vanilla["isNormal"], true);
    assert_eq!(vanilla["isTier"], true);

    let fillings = listing["fillings"].as_array().expect("fillings");
    assert_eq!(fillings.len(), 10);
}

#[test]
fn commission_report_requires_a_date() {
    let input = json_file("[]");
    bakehouse()
        .arg("render")
        .arg("--kind")
        .arg("commission_report")
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg("/tmp/bakehouse-never-written.pdf")
        .assert()
        .failure()
        .stderr(contains("--date is required"));
}

#[test]
fn malformed_input_fails_before_rendering() {
    let input = json_file("{\"folioNumber\": 7}");
    bakehouse()
        .arg("render")
        .arg("--kind")
        .arg("single_order")
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg("/tmp/bakehouse-never-written.pdf")
        .assert()
        .failure()
        .stderr(contains("invalid input document"));
}

#[test]
fn unknown_kind_is_rejected_by_the_parser() {
    bakehouse()
        .args(["render", "--kind", "invoice", "--input", "a.json", "--output", "b.pdf"])
        .assert()
        .failure()
        .stderr(contains("unknown document kind"));
}
