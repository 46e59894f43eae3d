//! End-to-end behavior of the title registry driven through the controller

use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use shared_types::{ErrorMap, FieldValue};
use titleform_core::title::{SIGNATURE_PAIR_MESSAGE, TITLE_TYPE_MESSAGE, VIN_MESSAGE};
use titleform_core::{
    title_registry, Clock, FieldRegistry, FixedClock, FormConfig, FormController, HiddenFieldPolicy,
};

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()))
}

fn registry() -> Arc<FieldRegistry> {
    Arc::new(title_registry().unwrap())
}

fn complete_application() -> serde_json::Value {
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
        "applicantPrintedName": "Pat Doe"
    })
}

#[test]
fn complete_application_is_valid() {
    let ctl = FormController::initialize(registry(), &complete_application(), FormConfig::default(), clock());
    let failing: ErrorMap = ctl
        .errors()
        .iter()
        .filter(|(_, e)| !e.is_empty())
        .map(|(k, e)| (k.clone(), e.clone()))
        .collect();
    assert_eq!(failing, ErrorMap::new());
    assert!(ctl.is_valid());
    // Signature date seeded from the clock
    assert_eq!(
        ctl.state()["applicantSignatureDate"],
        FieldValue::Text("10-19-2026".to_string())
    );
}

#[test]
fn state_has_one_entry_per_field() {
    let registry = registry();
    let ctl = FormController::initialize(registry.clone(), &json!({"bogus": 1}), FormConfig::default(), clock());
    assert_eq!(ctl.state().len(), registry.len());
    assert_eq!(ctl.errors().len(), registry.len());
    for field in registry.fields() {
        assert!(ctl.state().contains_key(&field.id), "missing {}", field.id);
    }
}

#[test]
fn toggling_lien_adds_and_removes_errors() {
    let mut ctl = FormController::initialize(registry(), &complete_application(), FormConfig::default(), clock());
    let outcome = ctl.update("hasLien", true).unwrap();
    assert!(!outcome.is_valid);
    assert_eq!(outcome.errors["lienholderName"], "Enter the lienholder name");

    let outcome = ctl.update("hasLien", false).unwrap();
    assert!(outcome.is_valid);
    assert_eq!(outcome.errors["lienholderName"], "");
}

#[test]
fn retain_policy_keeps_error_while_hidden() {
    let config = FormConfig::default().with_hidden_fields(HiddenFieldPolicy::Retain);
    let mut ctl = FormController::initialize(registry(), &complete_application(), config, clock());
    ctl.update("hasLien", true).unwrap();
    let outcome = ctl.update("hasLien", false).unwrap();
    assert_eq!(outcome.errors["lienholderName"], "Enter the lienholder name");
    assert!(!outcome.is_valid);
}

#[test]
fn title_type_group_error_clears_when_any_checked() {
    let mut values = complete_application();
    values["titleTypeTransfer"] = json!(false);
    let mut ctl = FormController::initialize(registry(), &values, FormConfig::default(), clock());
    assert_eq!(ctl.errors()["titleTypeOriginal"], TITLE_TYPE_MESSAGE);
    ctl.update("titleTypeCorrected", true).unwrap();
    assert_eq!(ctl.errors()["titleTypeOriginal"], "");
    // Corrected title now needs the previous title number
    assert_eq!(
        ctl.errors()["previousTitleNumber"],
        "Enter the title number being replaced"
    );
}

#[test]
fn clearing_signature_date_reports_pair_on_both() {
    let mut ctl = FormController::initialize(registry(), &complete_application(), FormConfig::default(), clock());
    let outcome = ctl.update("applicantSignatureDate", "").unwrap();
    assert_eq!(outcome.errors["applicantPrintedName"], SIGNATURE_PAIR_MESSAGE);
    assert_eq!(outcome.errors["applicantSignatureDate"], SIGNATURE_PAIR_MESSAGE);
}

#[test]
fn non_ascii_digits_in_dates_are_rejected_not_fatal() {
    let mut ctl = FormController::initialize(registry(), &complete_application(), FormConfig::default(), clock());
    let outcome = ctl.update("vehiclePurchaseDate", "1\u{0660}-01-2020").unwrap();
    assert_eq!(outcome.errors["vehiclePurchaseDate"], "Use the format MM-DD-YYYY");
    assert!(!outcome.is_valid);

    let outcome = ctl.update("applicantZip", "\u{0661}\u{0662}\u{0663}\u{0664}\u{0665}").unwrap();
    assert_eq!(outcome.errors["applicantZip"], "ZIP code must be 5 digits");
}

proptest! {
    /// Validation is a pure function of (state, prior, today)
    #[test]
    fn validate_all_is_idempotent(
        vin in "[A-Za-z0-9]{0,20}",
        year in "[0-9a-z]{0,5}",
        lien in any::<bool>(),
        zip in "[0-9]{0,6}",
    ) {
        let registry = title_registry().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut ctl = FormController::initialize(Arc::new(registry.clone()), &json!({}), FormConfig::default(), clock());
        ctl.update("vehicleIdentificationNumber", vin.as_str()).unwrap();
        ctl.update("vehicleYear", year.as_str()).unwrap();
        ctl.update("hasLien", lien).unwrap();
        ctl.update("lienholderZip", zip.as_str()).unwrap();

        let once = registry.validate_all(ctl.state(), ctl.errors(), today, HiddenFieldPolicy::Clear);
        let twice = registry.validate_all(ctl.state(), &once, today, HiddenFieldPolicy::Clear);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(&once, ctl.errors());
    }

    /// Any 17-character alphanumeric VIN passes regardless of case
    #[test]
    fn seventeen_alphanumerics_pass(vin in "[A-Za-z0-9]{17}") {
        let mut ctl = FormController::initialize(registry(), &json!({}), FormConfig::default(), clock());
        let outcome = ctl.update("vehicleIdentificationNumber", vin.as_str()).unwrap();
        prop_assert_eq!(outcome.errors["vehicleIdentificationNumber"].as_str(), "");
    }

    /// Wrong-length VINs always fail with the VIN message
    #[test]
    fn wrong_length_vin_fails(vin in "[A-Z0-9]{1,16}|[A-Z0-9]{18,24}") {
        let mut ctl = FormController::initialize(registry(), &json!({}), FormConfig::default(), clock());
        let outcome = ctl.update("vehicleIdentificationNumber", vin.as_str()).unwrap();
        prop_assert_eq!(outcome.errors["vehicleIdentificationNumber"].as_str(), VIN_MESSAGE);
    }

    /// No text value makes a date rule panic
    #[test]
    fn any_text_in_date_field_is_handled(value in "\\PC{0,12}") {
        let mut ctl = FormController::initialize(registry(), &json!({}), FormConfig::default(), clock());
        let outcome = ctl.update("vehiclePurchaseDate", value.as_str()).unwrap();
        prop_assert!(outcome.errors.contains_key("vehiclePurchaseDate"));
    }

    /// is_valid agrees with the error map after every update
    #[test]
    fn is_valid_matches_error_map(flags in proptest::collection::vec(any::<bool>(), 4)) {
        let mut ctl = FormController::initialize(registry(), &complete_application(), FormConfig::default(), clock());
        for (id, flag) in ["hasLien", "hasTradeIn", "isBusiness", "taxExempt"].iter().zip(flags) {
            let outcome = ctl.update(id, flag).unwrap();
            prop_assert_eq!(outcome.is_valid, outcome.errors.values().all(|e| e.is_empty()));
        }
    }
}
