//! Vehicle title application registry
//!
//! Field ids double as logical keys for PDF filling, so they stay stable
//! camelCase names rather than template widget names.

use crate::error::RegistryError;
use crate::patterns;
use crate::registry::{DefaultValue, FieldDefinition as F, FieldRegistry, SectionSpec};
use crate::rules::{Bound, Condition, Rule};

/// Earliest model year accepted (first production automobile)
pub const FIRST_MODEL_YEAR: i64 = 1886;

pub const VIN_MESSAGE: &str = "VIN must be exactly 17 letters or digits";
pub const YEAR_MESSAGE: &str = "Enter a valid model year";
pub const ZIP_MESSAGE: &str = "ZIP code must be 5 digits";
pub const PHONE_MESSAGE: &str = "Phone number must be 10 digits";
pub const STATE_MESSAGE: &str = "Use the two-letter state code";
pub const MONEY_MESSAGE: &str = "Enter an amount such as 1500 or 1500.00";
pub const EMAIL_MESSAGE: &str = "Enter a valid email address";
pub const EMAIL_REQUIRED_MESSAGE: &str = "Email is required to receive notifications";
pub const TITLE_TYPE_MESSAGE: &str = "Select at least one title type";
pub const SIGNATURE_PAIR_MESSAGE: &str = "Printed name and signature date must be provided together";

/// Title-type checkbox group; the first member anchors the group rule
pub const TITLE_TYPE_GROUP: [&str; 4] = [
    "titleTypeOriginal",
    "titleTypeDuplicate",
    "titleTypeTransfer",
    "titleTypeCorrected",
];

/// Signature-kind field ids, which are also placement keys
pub const SIGNATURE_KEYS: [&str; 3] = ["applicantSignature", "coApplicantSignature", "sellerSignature"];

fn vin() -> Rule {
    Rule::all(vec![Rule::required(), Rule::regex_ci(patterns::VIN, VIN_MESSAGE)])
}

fn model_year() -> Rule {
    Rule::all(vec![
        Rule::required(),
        Rule::range(
            Bound::Fixed(FIRST_MODEL_YEAR),
            Bound::CurrentYearOffset(1),
            YEAR_MESSAGE,
        ),
    ])
}

fn zip() -> Rule {
    Rule::all(vec![Rule::required(), Rule::regex(patterns::ZIP5, ZIP_MESSAGE)])
}

fn phone() -> Rule {
    Rule::optional(Rule::regex(patterns::PHONE10, PHONE_MESSAGE))
}

fn optional_date() -> Rule {
    Rule::optional(Rule::date())
}

/// Required while `flag` is checked
fn required_with(flag: &str, message: &str) -> Rule {
    Rule::required_if(Condition::is_true(flag), message)
}

fn zip_with(flag: &str, message: &str) -> Rule {
    Rule::all(vec![
        required_with(flag, message),
        Rule::optional(Rule::regex(patterns::ZIP5, ZIP_MESSAGE)),
    ])
}

/// Printed name half of a signature block
fn printed_name(partner_date: &str) -> Rule {
    Rule::paired_with(partner_date, SIGNATURE_PAIR_MESSAGE)
}

/// Date half of a signature block: pairing error first, then date shape
fn signature_date(partner_name: &str) -> Rule {
    Rule::all(vec![
        Rule::paired_with(partner_name, SIGNATURE_PAIR_MESSAGE),
        optional_date(),
    ])
}

fn optional_state() -> Rule {
    Rule::optional(Rule::regex(patterns::STATE_CODE, STATE_MESSAGE))
}

fn optional_zip() -> Rule {
    Rule::optional(Rule::regex(patterns::ZIP5, ZIP_MESSAGE))
}

fn optional_money() -> Rule {
    Rule::optional(Rule::regex(patterns::MONEY, MONEY_MESSAGE))
}

fn vehicle() -> (SectionSpec, Vec<F>) {
    (
        SectionSpec::new("Vehicle Information").overall_required(),
        vec![
            F::text("vehicleIdentificationNumber", "Vehicle identification number").rule(vin()),
            F::text("vehicleYear", "Year").rule(model_year()),
            F::text("vehicleMake", "Make").required(),
            F::text("vehicleModel", "Model").required(),
            F::dropdown(
                "vehicleBodyType",
                "Body type",
                &["Sedan", "Coupe", "SUV", "Truck", "Van", "Motorcycle", "Trailer", "Other"],
            ),
            F::text("vehicleColor", "Primary color"),
            F::text("vehicleSecondaryColor", "Secondary color"),
            F::dropdown(
                "vehicleFuelType",
                "Fuel",
                &["Gasoline", "Diesel", "Electric", "Hybrid", "Other"],
            ),
            F::text("vehicleCylinders", "Cylinders").rule(Rule::optional(Rule::regex(
                r"^[0-9]{1,2}$",
                "Cylinders must be a whole number",
            ))),
            F::text("vehicleWeight", "Empty weight (lbs)")
                .rule(Rule::optional(Rule::regex(patterns::WHOLE_NUMBER, "Weight must be a whole number"))),
            F::dropdown("vehicleCondition", "New or used", &["New", "Used"]),
            F::text("vehiclePlateNumber", "Current plate number"),
            F::text("odometerReading", "Odometer reading").rule(Rule::optional(Rule::regex(
                patterns::WHOLE_NUMBER,
                "Odometer must be a whole number",
            ))),
            F::checkbox("odometerExempt", "Odometer exempt"),
            F::checkbox("odometerActualMileage", "Reading is the actual mileage"),
            F::checkbox("odometerExceedsLimits", "Reading exceeds mechanical limits"),
            F::checkbox("odometerNotActual", "Reading is not the actual mileage"),
            F::text("vehiclePurchaseDate", "Purchase date").rule(optional_date()),
            F::text("vehiclePurchasePrice", "Purchase price").rule(optional_money()),
        ],
    )
}

fn title_type() -> (SectionSpec, Vec<F>) {
    let replacing = || {
        Condition::any(vec![
            Condition::is_true("titleTypeDuplicate"),
            Condition::is_true("titleTypeCorrected"),
        ])
    };
    (
        SectionSpec::new("Title Type").overall_required(),
        vec![
            F::checkbox(TITLE_TYPE_GROUP[0], "Original title")
                .rule(Rule::at_least_one_of(&TITLE_TYPE_GROUP, TITLE_TYPE_MESSAGE)),
            F::checkbox(TITLE_TYPE_GROUP[1], "Duplicate title"),
            F::checkbox(TITLE_TYPE_GROUP[2], "Transfer of ownership"),
            F::checkbox(TITLE_TYPE_GROUP[3], "Corrected title"),
            F::text("previousTitleNumber", "Previous title number")
                .rule(Rule::required_if(replacing(), "Enter the title number being replaced"))
                .visible_when(replacing()),
            F::text("previousTitleState", "Previous title state").rule(optional_state()),
            F::dropdown(
                "duplicateReason",
                "Reason for duplicate",
                &["Lost", "Stolen", "Damaged", "Not received"],
            )
            .rule(required_with("titleTypeDuplicate", "Select why a duplicate is needed"))
            .visible_when(Condition::is_true("titleTypeDuplicate")),
        ],
    )
}

fn history() -> (SectionSpec, Vec<F>) {
    (
        SectionSpec::new("Vehicle History").collapsible(),
        vec![
            F::checkbox("brandSalvage", "Previously branded salvage"),
            F::checkbox("brandRebuilt", "Rebuilt"),
            F::checkbox("brandFlood", "Flood damage"),
            F::checkbox("brandManufacturerBuyback", "Manufacturer buyback"),
            F::checkbox("vehicleWasStolen", "Vehicle was reported stolen"),
            F::text("stolenRecoveryDate", "Recovery date")
                .rule(Rule::all(vec![
                    required_with("vehicleWasStolen", "Enter the date the vehicle was recovered"),
                    optional_date(),
                ]))
                .visible_when(Condition::is_true("vehicleWasStolen")),
        ],
    )
}

fn applicant() -> (SectionSpec, Vec<F>) {
    let mailing = || Condition::is_true("mailingAddressDiffers");
    (
        SectionSpec::new("Applicant").overall_required(),
        vec![
            F::text("applicantFirstName", "First name").required(),
            F::text("applicantMiddleName", "Middle name"),
            F::text("applicantLastName", "Last name").required(),
            F::dropdown("applicantSuffix", "Suffix", &["Jr", "Sr", "II", "III", "IV"]),
            F::text("applicantDateOfBirth", "Date of birth").rule(optional_date()),
            F::text("applicantStreetAddress", "Street address").required(),
            F::text("applicantCity", "City").required(),
            F::text("applicantCounty", "County"),
            F::text("applicantState", "State")
                .rule(Rule::all(vec![Rule::required(), optional_state()])),
            F::text("applicantZip", "ZIP code").rule(zip()),
            F::checkbox("mailingAddressDiffers", "Mailing address is different"),
            F::text("mailingStreetAddress", "Mailing street address")
                .rule(required_with("mailingAddressDiffers", "Enter the mailing street address"))
                .visible_when(mailing()),
            F::text("mailingCity", "Mailing city")
                .rule(required_with("mailingAddressDiffers", "Enter the mailing city"))
                .visible_when(mailing()),
            F::text("mailingState", "Mailing state")
                .rule(Rule::all(vec![
                    required_with("mailingAddressDiffers", "Enter the mailing state"),
                    optional_state(),
                ]))
                .visible_when(mailing()),
            F::text("mailingZip", "Mailing ZIP")
                .rule(zip_with("mailingAddressDiffers", "Enter the mailing ZIP code"))
                .visible_when(mailing()),
            F::text("applicantPhone", "Phone").rule(phone()),
            F::checkbox("emailConsent", "Send me notifications by email"),
            F::text("applicantEmail", "Email").rule(Rule::all(vec![
                required_with("emailConsent", EMAIL_REQUIRED_MESSAGE),
                Rule::optional(Rule::regex(patterns::EMAIL, EMAIL_MESSAGE)),
            ])),
            F::text("driverLicenseNumber", "Driver license number"),
            F::checkbox("idTypePassport", "Identified by passport"),
            F::text("passportIssuingCountry", "Passport issuing country")
                .rule(required_with("idTypePassport", "Enter the country that issued the passport"))
                .visible_when(Condition::is_true("idTypePassport")),
        ],
    )
}

fn business() -> (SectionSpec, Vec<F>) {
    let shown = || Condition::is_true("isBusiness");
    (
        SectionSpec::new("Business Ownership").collapsible(),
        vec![
            F::checkbox("isBusiness", "Titled to a business"),
            F::text("businessName", "Business name")
                .rule(required_with("isBusiness", "Enter the business name"))
                .visible_when(shown()),
            F::text("businessFein", "Federal employer identification number")
                .rule(Rule::all(vec![
                    required_with("isBusiness", "Enter the business FEIN"),
                    Rule::optional(Rule::regex(patterns::FEIN, "FEIN must be 9 digits")),
                ]))
                .visible_when(shown()),
            F::text("businessContactName", "Contact person").visible_when(shown()),
            F::text("businessStreetAddress", "Business street address")
                .rule(required_with("isBusiness", "Enter the business address"))
                .visible_when(shown()),
            F::text("businessCity", "Business city")
                .rule(required_with("isBusiness", "Enter the business city"))
                .visible_when(shown()),
            F::text("businessState", "Business state").rule(optional_state()).visible_when(shown()),
            F::text("businessZip", "Business ZIP")
                .rule(zip_with("isBusiness", "Enter the business ZIP code"))
                .visible_when(shown()),
            F::text("businessPhone", "Business phone").rule(phone()).visible_when(shown()),
        ],
    )
}

fn co_owner() -> (SectionSpec, Vec<F>) {
    let shown = || Condition::is_true("hasCoOwner");
    (
        SectionSpec::new("Co-Owner").collapsible(),
        vec![
            F::checkbox("hasCoOwner", "Vehicle has a co-owner"),
            F::text("coOwnerFirstName", "Co-owner first name")
                .rule(required_with("hasCoOwner", "Enter the co-owner's first name"))
                .visible_when(shown()),
            F::text("coOwnerMiddleName", "Co-owner middle name").visible_when(shown()),
            F::text("coOwnerLastName", "Co-owner last name")
                .rule(required_with("hasCoOwner", "Enter the co-owner's last name"))
                .visible_when(shown()),
            F::dropdown("coOwnershipType", "Ownership", &["AND", "OR"]).visible_when(shown()),
            F::text("coOwnerDateOfBirth", "Co-owner date of birth")
                .rule(optional_date())
                .visible_when(shown()),
            F::text("coOwnerDriverLicenseNumber", "Co-owner driver license number").visible_when(shown()),
            F::checkbox("coOwnerSameAddress", "Co-owner lives at the applicant's address").visible_when(shown()),
            F::text("coOwnerStreetAddress", "Co-owner street address")
                .rule(Rule::required_if(
                    Condition::all(vec![shown(), Condition::is_false("coOwnerSameAddress")]),
                    "Enter the co-owner's street address",
                ))
                .visible_when(Condition::all(vec![shown(), Condition::is_false("coOwnerSameAddress")])),
            F::text("coOwnerCity", "Co-owner city")
                .visible_when(Condition::all(vec![shown(), Condition::is_false("coOwnerSameAddress")])),
            F::text("coOwnerState", "Co-owner state")
                .rule(optional_state())
                .visible_when(Condition::all(vec![shown(), Condition::is_false("coOwnerSameAddress")])),
            F::text("coOwnerZip", "Co-owner ZIP")
                .rule(optional_zip())
                .visible_when(Condition::all(vec![shown(), Condition::is_false("coOwnerSameAddress")])),
            F::text("coOwnerPhone", "Co-owner phone").rule(phone()).visible_when(shown()),
        ],
    )
}

fn lien() -> (SectionSpec, Vec<F>) {
    let shown = || Condition::is_true("hasLien");
    let second = || Condition::all(vec![shown(), Condition::is_true("hasSecondLien")]);
    (
        SectionSpec::new("Lienholder").collapsible(),
        vec![
            F::checkbox("hasLien", "Vehicle has a lien"),
            F::text("lienholderName", "Lienholder name")
                .rule(required_with("hasLien", "Enter the lienholder name"))
                .visible_when(shown()),
            F::text("lienholderAddress", "Lienholder address")
                .rule(required_with("hasLien", "Enter the lienholder address"))
                .visible_when(shown()),
            F::text("lienholderCity", "Lienholder city")
                .rule(required_with("hasLien", "Enter the lienholder city"))
                .visible_when(shown()),
            F::text("lienholderState", "Lienholder state").rule(optional_state()).visible_when(shown()),
            F::text("lienholderZip", "Lienholder ZIP")
                .rule(zip_with("hasLien", "Enter the lienholder ZIP code"))
                .visible_when(shown()),
            F::text("lienholderElectronicId", "Electronic lien ID").visible_when(shown()),
            F::text("lienDate", "Lien date").rule(optional_date()).visible_when(shown()),
            F::checkbox("hasSecondLien", "There is a second lien").visible_when(shown()),
            F::text("secondLienholderName", "Second lienholder name")
                .rule(Rule::required_if(second(), "Enter the second lienholder name"))
                .visible_when(second()),
            F::text("secondLienholderAddress", "Second lienholder address")
                .rule(Rule::required_if(second(), "Enter the second lienholder address"))
                .visible_when(second()),
            F::text("secondLienholderCity", "Second lienholder city")
                .rule(Rule::required_if(second(), "Enter the second lienholder city"))
                .visible_when(second()),
            F::text("secondLienholderState", "Second lienholder state")
                .rule(optional_state())
                .visible_when(second()),
            F::text("secondLienholderZip", "Second lienholder ZIP")
                .rule(Rule::all(vec![
                    Rule::required_if(second(), "Enter the second lienholder ZIP code"),
                    optional_zip(),
                ]))
                .visible_when(second()),
            F::text("secondLienDate", "Second lien date").rule(optional_date()).visible_when(second()),
        ],
    )
}

fn trade_in() -> (SectionSpec, Vec<F>) {
    let shown = || Condition::is_true("hasTradeIn");
    (
        SectionSpec::new("Trade-In").collapsible(),
        vec![
            F::checkbox("hasTradeIn", "Vehicle traded in"),
            F::text("tradeInVin", "Trade-in VIN")
                .rule(Rule::all(vec![
                    required_with("hasTradeIn", "Enter the trade-in VIN"),
                    Rule::optional(Rule::regex_ci(patterns::VIN, VIN_MESSAGE)),
                ]))
                .visible_when(shown()),
            F::text("tradeInYear", "Trade-in year")
                .rule(Rule::all(vec![
                    required_with("hasTradeIn", "Enter the trade-in year"),
                    Rule::optional(Rule::range(
                        Bound::Fixed(FIRST_MODEL_YEAR),
                        Bound::CurrentYearOffset(1),
                        YEAR_MESSAGE,
                    )),
                ]))
                .visible_when(shown()),
            F::text("tradeInMake", "Trade-in make")
                .rule(required_with("hasTradeIn", "Enter the trade-in make"))
                .visible_when(shown()),
            F::text("tradeInModel", "Trade-in model").visible_when(shown()),
            F::text("tradeInOdometer", "Trade-in odometer")
                .rule(Rule::optional(Rule::regex(
                    patterns::WHOLE_NUMBER,
                    "Odometer must be a whole number",
                )))
                .visible_when(shown()),
            F::text("tradeInAllowance", "Trade-in allowance")
                .rule(optional_money())
                .visible_when(shown()),
        ],
    )
}

fn tax() -> (SectionSpec, Vec<F>) {
    let other_reason = || {
        Condition::all(vec![
            Condition::is_true("taxExempt"),
            Condition::equals("taxExemptionReason", "Other"),
        ])
    };
    (
        SectionSpec::new("Sales Tax").collapsible(),
        vec![
            F::text("taxCountyOfResidence", "County of residence"),
            F::text("taxAmountPaid", "Sales tax paid").rule(optional_money()),
            F::text("taxPaidToState", "Tax paid to state").rule(optional_state()),
            F::checkbox("taxExempt", "Exempt from sales tax"),
            F::dropdown(
                "taxExemptionReason",
                "Exemption reason",
                &["Gift", "Inheritance", "Even trade", "Government", "Other"],
            )
            .rule(required_with("taxExempt", "Select the tax exemption reason"))
            .visible_when(Condition::is_true("taxExempt")),
            F::text("taxExemptionExplanation", "Explain the exemption")
                .rule(Rule::required_if(other_reason(), "Describe the exemption"))
                .visible_when(other_reason()),
        ],
    )
}

fn insurance() -> (SectionSpec, Vec<F>) {
    (
        SectionSpec::new("Insurance").collapsible(),
        vec![
            F::text("insuranceCompany", "Insurance company"),
            F::text("insurancePolicyNumber", "Policy number")
                .rule(Rule::required_if(
                    Condition::not_empty("insuranceCompany"),
                    "Enter the policy number",
                )),
            F::text("insuranceEffectiveDate", "Policy effective date").rule(optional_date()),
            F::text("insuranceAgentPhone", "Agent phone").rule(phone()),
        ],
    )
}

fn seller() -> (SectionSpec, Vec<F>) {
    (
        SectionSpec::new("Seller").collapsible(),
        vec![
            F::text("sellerName", "Seller name"),
            F::checkbox("sellerIsDealer", "Seller is a licensed dealer"),
            F::text("sellerDealerLicense", "Dealer license number")
                .rule(required_with("sellerIsDealer", "Enter the dealer license number"))
                .visible_when(Condition::is_true("sellerIsDealer")),
            F::text("sellerStreetAddress", "Seller street address"),
            F::text("sellerCity", "Seller city"),
            F::text("sellerState", "Seller state").rule(optional_state()),
            F::text("sellerZip", "Seller ZIP").rule(optional_zip()),
            F::text("sellerPhone", "Seller phone").rule(phone()),
            F::text("sellerSaleDate", "Date of sale").rule(optional_date()),
            F::text("sellerSalePrice", "Sale price").rule(optional_money()),
        ],
    )
}

fn power_of_attorney() -> (SectionSpec, Vec<F>) {
    let shown = || Condition::is_true("hasPowerOfAttorney");
    (
        SectionSpec::new("Power of Attorney").collapsible(),
        vec![
            F::checkbox("hasPowerOfAttorney", "An agent is signing for the owner"),
            F::text("agentName", "Agent name")
                .rule(required_with("hasPowerOfAttorney", "Enter the agent's name"))
                .visible_when(shown()),
            F::text("agentStreetAddress", "Agent street address")
                .rule(required_with("hasPowerOfAttorney", "Enter the agent's address"))
                .visible_when(shown()),
            F::text("agentCity", "Agent city").visible_when(shown()),
            F::text("agentState", "Agent state").rule(optional_state()).visible_when(shown()),
            F::text("agentZip", "Agent ZIP").rule(optional_zip()).visible_when(shown()),
            F::text("agentAppointmentDate", "Date appointed")
                .rule(Rule::all(vec![
                    required_with("hasPowerOfAttorney", "Enter the date the agent was appointed"),
                    optional_date(),
                ]))
                .visible_when(shown()),
        ],
    )
}

fn signatures() -> (SectionSpec, Vec<F>) {
    let co_applicant = || Condition::is_true("hasCoOwner");
    (
        SectionSpec::new("Signatures").overall_required(),
        vec![
            F::text("applicantPrintedName", "Applicant printed name")
                .rule(printed_name("applicantSignatureDate")),
            F::text("applicantSignatureDate", "Applicant signature date")
                .rule(signature_date("applicantPrintedName"))
                .default_value(DefaultValue::Today),
            F::signature(SIGNATURE_KEYS[0], "Applicant signature"),
            F::text("coApplicantPrintedName", "Co-applicant printed name")
                .rule(printed_name("coApplicantSignatureDate"))
                .visible_when(co_applicant()),
            F::text("coApplicantSignatureDate", "Co-applicant signature date")
                .rule(signature_date("coApplicantPrintedName"))
                .visible_when(co_applicant()),
            F::signature(SIGNATURE_KEYS[1], "Co-applicant signature").visible_when(co_applicant()),
            F::text("sellerPrintedName", "Seller printed name").rule(printed_name("sellerSignatureDate")),
            F::text("sellerSignatureDate", "Seller signature date").rule(signature_date("sellerPrintedName")),
            F::signature(SIGNATURE_KEYS[2], "Seller signature"),
        ],
    )
}

/// Build the vehicle title application registry
pub fn title_registry() -> Result<FieldRegistry, RegistryError> {
    FieldRegistry::from_groups(vec![
        vehicle(),
        title_type(),
        history(),
        applicant(),
        business(),
        co_owner(),
        lien(),
        trade_in(),
        tax(),
        insurance(),
        seller(),
        power_of_attorney(),
        signatures(),
    ])
}
