//! Command flows over files in a scratch directory

use std::fs;
use std::process::Command;

use lopdf::Document;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use shared_types::SignatureEntry;
use tempfile::TempDir;
use titleform_cli::{assemble_document, describe_fields, overlay, validate, AppConfig};
use titlepdf_core::fixtures::{self, FixtureField};
use titlepdf_core::{title_placements, AssembledDocument, Diagnostic};

fn template() -> Vec<u8> {
    fixtures::template(&[
        FixtureField::text("txtVehicleIdentificationNumber", 0, [72.0, 700.0, 300.0, 718.0]),
        FixtureField::text("VehicleMake", 0, [72.0, 670.0, 300.0, 688.0]),
        FixtureField::checkbox("chkTitleTypeTransfer", 0, [72.0, 640.0, 84.0, 652.0]),
        FixtureField::text("ApplicantPrintedName", 1, [72.0, 500.0, 300.0, 518.0]),
    ])
}

fn complete_values() -> Value {
    json!({
        "vehicleIdentificationNumber": "1HGCM82633A004352",
        "vehicleYear": "2003",
        "vehicleMake": "Honda",
        "vehicleModel": "Accord",
        "titleTypeTransfer": true,
        "applicantFirstName": "Pat",
        "applicantLastName": "Doe",
        "applicantStreetAddress": "1 Main St",
        "applicantCity": "Miami",
        "applicantState": "FL",
        "applicantZip": "33101",
        "applicantPrintedName": "Pat Doe",
        "applicantSignature": fixtures::png_data_url(100, 50)
    })
}

fn assemble(values: &Value, extra: Vec<SignatureEntry>, allow_invalid: bool) -> anyhow::Result<AssembledDocument> {
    assemble_document(
        &template(),
        values,
        extra,
        title_placements(),
        &AppConfig::default(),
        allow_invalid,
    )
}

#[test]
fn test_validate_complete_application() {
    let report = validate(&complete_values(), &AppConfig::default()).unwrap();
    assert!(report.is_valid, "{:?}", report.errors);
    assert!(report.errors.is_empty());
}

#[test]
fn test_fields_report_resolves_registry_keys() {
    let report = describe_fields(&template()).unwrap();
    assert_eq!(report.page_count, 2);
    assert_eq!(report.fields.len(), 4);

    let vin = report
        .keys
        .iter()
        .find(|k| k.key == "vehicleIdentificationNumber")
        .unwrap();
    assert_eq!(vin.field.as_deref(), Some("txtVehicleIdentificationNumber"));
    assert_eq!(vin.kind.as_deref(), Some("text"));

    let transfer = report.keys.iter().find(|k| k.key == "titleTypeTransfer").unwrap();
    assert_eq!(transfer.kind.as_deref(), Some("checkbox"));

    // signature keys are placed, not resolved
    assert!(report.keys.iter().all(|k| k.key != "applicantSignature"));
}

#[test]
fn test_assemble_writes_flattened_pdf_with_signature() {
    let dir = TempDir::new().unwrap();
    let out_path = dir.path().join("title.pdf");

    let assembled = assemble(&complete_values(), Vec::new(), false).unwrap();
    fs::write(&out_path, &assembled.bytes).unwrap();

    // fields absent from the template are reported, not fatal
    assert!(assembled
        .diagnostics
        .iter()
        .any(|d| *d == Diagnostic::FieldUnresolved {
            key: "vehicleModel".to_string()
        }));
    assert!(assembled
        .diagnostics
        .iter()
        .all(|d| !matches!(d, Diagnostic::ImageDecode { .. } | Diagnostic::PageOutOfRange { .. })));

    let doc = Document::load_mem(&fs::read(&out_path).unwrap()).unwrap();
    let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    assert!(!doc.get_object(root).unwrap().as_dict().unwrap().has(b"AcroForm"));
    let images = doc
        .objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| s.dict.has(b"SMask"))
        .count();
    assert_eq!(images, 1);
}

#[test]
fn test_assemble_refuses_invalid_form_unless_allowed() {
    let values = json!({"vehicleIdentificationNumber": "TOO-SHORT"});
    let err = assemble(&values, Vec::new(), false).unwrap_err();
    assert!(err.to_string().contains("vehicleIdentificationNumber"));

    let assembled = assemble(&values, Vec::new(), true).unwrap();
    assert!(assembled.bytes.starts_with(b"%PDF-"));
}

#[test]
fn test_explicit_signature_without_placement_is_reported() {
    let extra = vec![SignatureEntry::new("witnessSignature", fixtures::png_data_url(10, 5))];
    let assembled = assemble(&complete_values(), extra, false).unwrap();
    assert!(assembled.diagnostics.contains(&Diagnostic::MissingPlacement {
        key: "witnessSignature".to_string()
    }));
}

#[tokio::test]
async fn test_overlay_report() {
    let report = overlay(&template(), 0, 2.0, None).await.unwrap();
    assert_eq!(report.fields.len(), 3);
    assert_eq!(report.values.len(), 3);
    let vin = &report.fields[0];
    assert_eq!((vin.x, vin.y, vin.width, vin.height), (144.0, 148.0, 456.0, 36.0));

    assert!(overlay(&template(), 7, 1.0, None).await.is_err());
}

#[test]
fn test_binary_validate_exit_codes() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");
    fs::write(&good, serde_json::to_vec(&complete_values()).unwrap()).unwrap();
    fs::write(&bad, br#"{"vehicleIdentificationNumber": "SHORT"}"#).unwrap();

    let run = |path: &std::path::Path| {
        Command::new(env!("CARGO_BIN_EXE_titleform"))
            .arg("validate")
            .arg("--values")
            .arg(path)
            .env_remove("TITLEFORM_HIDDEN_FIELDS")
            .current_dir(dir.path())
            .output()
            .unwrap()
    };

    let ok = run(&good);
    assert!(ok.status.success());
    let report: Value = serde_json::from_slice(&ok.stdout).unwrap();
    assert_eq!(report["isValid"], json!(true));

    let failed = run(&bad);
    assert_eq!(failed.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&failed.stdout).unwrap();
    assert!(report["errors"]["vehicleIdentificationNumber"].is_string());
}

#[test]
fn test_binary_hidden_fields_choices_checked_by_clap() {
    let dir = TempDir::new().unwrap();
    let values = dir.path().join("values.json");
    fs::write(&values, serde_json::to_vec(&complete_values()).unwrap()).unwrap();

    let run = |policy: &str| {
        Command::new(env!("CARGO_BIN_EXE_titleform"))
            .args(["validate", "--hidden-fields", policy, "--values"])
            .arg(&values)
            .current_dir(dir.path())
            .output()
            .unwrap()
    };

    assert!(run("retain").status.success());
    let rejected = run("sometimes");
    assert_eq!(rejected.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&rejected.stderr);
    assert!(stderr.contains("clear") && stderr.contains("retain"), "{}", stderr);
}

#[test]
fn test_binary_assemble_writes_output() {
    let dir = TempDir::new().unwrap();
    let template_path = dir.path().join("template.pdf");
    let values_path = dir.path().join("values.json");
    let signatures_path = dir.path().join("signatures.json");
    let out_path = dir.path().join("out.pdf");
    fs::write(&template_path, template()).unwrap();
    fs::write(&values_path, serde_json::to_vec(&complete_values()).unwrap()).unwrap();
    fs::write(
        &signatures_path,
        serde_json::to_vec(&json!([{"key": "sellerSignature", "dataUrl": fixtures::png_data_url(40, 20)}])).unwrap(),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_titleform"))
        .args(["assemble", "--debug-outline", "--template"])
        .arg(&template_path)
        .arg("--values")
        .arg(&values_path)
        .arg("--signatures")
        .arg(&signatures_path)
        .arg("--out")
        .arg(&out_path)
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let diagnostics: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(diagnostics.iter().all(|d| d["type"] != json!("image_decode")));
    let doc = Document::load_mem(&fs::read(&out_path).unwrap()).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn test_binary_assemble_with_custom_placements() {
    let dir = TempDir::new().unwrap();
    let template_path = dir.path().join("template.pdf");
    let values_path = dir.path().join("values.json");
    let placements_path = dir.path().join("placements.json");
    let out_path = dir.path().join("out.pdf");
    fs::write(&template_path, template()).unwrap();
    fs::write(&values_path, serde_json::to_vec(&complete_values()).unwrap()).unwrap();
    fs::write(
        &placements_path,
        br#"[{"key": "applicantSignature", "page_index": 5, "x": 10, "y": 10, "width": 100, "height": 20}]"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_titleform"))
        .arg("assemble")
        .arg("--template")
        .arg(&template_path)
        .arg("--values")
        .arg(&values_path)
        .arg("--placements")
        .arg(&placements_path)
        .arg("--out")
        .arg(&out_path)
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let diagnostics: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    let out_of_range: Vec<&Value> = diagnostics
        .iter()
        .filter(|d| d["type"] == json!("page_out_of_range"))
        .collect();
    assert_eq!(out_of_range.len(), 1);
    assert_eq!(out_of_range[0]["key"], json!("applicantSignature"));
}
