//! The Opportunity record and its controlled vocabularies.
//!
//! Two shapes exist on purpose:
//!
//! - [`ExtractedOpportunity`] is what a backend must fill. Its schema is
//!   derived once with `schemars` and translated per provider.
//! - [`Opportunity`] is the validated, normalized record that gets persisted.
//!
//! [`Opportunity::from_extracted`] is the only way from one to the other.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{ExtractionError, ExtractionResult};
use crate::normalize;

/// Sentinel for "no reliable information".
pub const NOT_AVAILABLE: &str = "N/A";

/// Maximum number of tags on one record.
pub const MAX_TAGS: usize = 3;

// =============================================================================
// Vocabularies
// =============================================================================

/// Mission category. Exactly the nine values below are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "environment")]
    Environment,
    #[serde(rename = "food security")]
    FoodSecurity,
    #[serde(rename = "education")]
    Education,
    #[serde(rename = "community")]
    Community,
    #[serde(rename = "healthcare")]
    Healthcare,
    #[serde(rename = "animal welfare")]
    AnimalWelfare,
    #[serde(rename = "disaster relief")]
    DisasterRelief,
    #[serde(rename = "homeless support")]
    HomelessSupport,
    #[serde(rename = "advocacy")]
    Advocacy,
}

impl Tag {
    pub const ALL: [Tag; 9] = [
        Tag::Environment,
        Tag::FoodSecurity,
        Tag::Education,
        Tag::Community,
        Tag::Healthcare,
        Tag::AnimalWelfare,
        Tag::DisasterRelief,
        Tag::HomelessSupport,
        Tag::Advocacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Environment => "environment",
            Tag::FoodSecurity => "food security",
            Tag::Education => "education",
            Tag::Community => "community",
            Tag::Healthcare => "healthcare",
            Tag::AnimalWelfare => "animal welfare",
            Tag::DisasterRelief => "disaster relief",
            Tag::HomelessSupport => "homeless support",
            Tag::Advocacy => "advocacy",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = String;

    /// Case-insensitive; `_` and `-` count as spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize::vocabulary_key(s);
        Tag::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| s.trim().to_string())
    }
}

/// Who may sign up, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotAvailability {
    #[serde(rename = "individual drop-in welcome")]
    IndividualDropIn,
    #[serde(rename = "individual application required")]
    IndividualApplication,
    #[serde(rename = "corporate group application required")]
    CorporateApplication,
    #[serde(rename = "corporate group drop-in welcome")]
    CorporateDropIn,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl SlotAvailability {
    pub const KNOWN: [SlotAvailability; 4] = [
        SlotAvailability::IndividualDropIn,
        SlotAvailability::IndividualApplication,
        SlotAvailability::CorporateApplication,
        SlotAvailability::CorporateDropIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotAvailability::IndividualDropIn => "individual drop-in welcome",
            SlotAvailability::IndividualApplication => "individual application required",
            SlotAvailability::CorporateApplication => "corporate group application required",
            SlotAvailability::CorporateDropIn => "corporate group drop-in welcome",
            SlotAvailability::NotAvailable => NOT_AVAILABLE,
        }
    }
}

impl fmt::Display for SlotAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotAvailability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if normalize::is_not_available(s) {
            return Ok(SlotAvailability::NotAvailable);
        }
        let key = normalize::vocabulary_key(s);
        SlotAvailability::KNOWN
            .into_iter()
            .find(|v| normalize::vocabulary_key(v.as_str()) == key)
            .ok_or_else(|| s.trim().to_string())
    }
}

// =============================================================================
// Backend output
// =============================================================================

/// Volunteer opportunity details as extracted from a webpage.
///
/// Field docs become schema descriptions the model reads, so they state the
/// rule for each field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedOpportunity {
    /// Full name of the organization running the opportunity. If unclear, the most prominent name on the page.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub organization_name: String,

    /// What volunteers will be doing, in 3-10 specific words (e.g. "distributing meals to the homeless").
    #[serde(default, deserialize_with = "null_as_empty")]
    pub activity_type: String,

    /// "Street Address, City, State" of the most relevant location, without ZIP code, country or landmarks. "N/A" if unspecified.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location: String,

    /// Weekday codes Su M T W Th F Sa plus times (e.g. "MWThFSa 9am-12pm"), "Fl" if drop-in or flexible. One-off dates go in extra.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub time_slot: String,

    /// Any of "individual drop-in welcome", "individual application required", "corporate group application required", "corporate group drop-in welcome"; ["N/A"] if unknown.
    #[serde(default, deserialize_with = "null_as_empty_vec")]
    pub slot_availability: Vec<String>,

    /// The single most relevant email, preferring a labeled coordinator. "N/A" if none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub contact_email: String,

    /// The most relevant phone number as digits only, preferring a labeled coordinator. 0 if none.
    #[serde(default, deserialize_with = "lenient_phone")]
    #[schemars(with = "i64")]
    pub contact_number: Option<i64>,

    /// Corporate volunteering details, specific dates and other important details that fit nowhere else. "N/A" if none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub extra: String,

    /// 1-3 tags chosen by the organization's mission from: environment, food security, education, community, healthcare, animal welfare, disaster relief, homeless support, advocacy.
    #[serde(default, deserialize_with = "null_as_empty_vec")]
    pub tags: Vec<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn null_as_empty_vec<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(d)?.unwrap_or_default())
}

/// Accepts a JSON integer, a digit-bearing string, or null.
fn lenient_phone<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    use serde::de::Error;
    use serde_json::Value;

    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("contact_number out of range: {n}"))),
        Some(Value::String(s)) => normalize::phone_digits(&s).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!(
            "contact_number must be a number, got {other}"
        ))),
    }
}

// =============================================================================
// Persisted record
// =============================================================================

/// One volunteer opportunity, validated and normalized. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub organization_name: String,
    pub activity_type: String,
    pub location: String,
    pub time_slot: String,
    pub slot_availability: Vec<SlotAvailability>,
    pub contact_email: String,
    pub contact_number: i64,
    pub extra: String,
    pub tags: Vec<Tag>,
    pub url: String,
}

impl Opportunity {
    /// Validate and normalize a backend record, attaching the source URL.
    ///
    /// The URL always comes from the caller; anything the model echoed is
    /// ignored.
    pub fn from_extracted(raw: ExtractedOpportunity, url: &str) -> ExtractionResult<Self> {
        let activity_type = normalize::scalar(&raw.activity_type);
        let words = activity_type.split_whitespace().count();
        if activity_type != NOT_AVAILABLE && !(3..=10).contains(&words) {
            warn!(
                url = %url,
                activity_type = %activity_type,
                words,
                "activity_type outside the 3-10 word range"
            );
        }

        let contact_number = match raw.contact_number {
            Some(n) if n < 0 => {
                return Err(ExtractionError::validation(
                    "contact_number",
                    format!("negative phone number {n}"),
                ))
            }
            Some(n) => n,
            None => 0,
        };

        Ok(Self {
            organization_name: normalize::scalar(&raw.organization_name),
            activity_type,
            location: normalize::location(&raw.location),
            time_slot: normalize::time_slot(&raw.time_slot),
            slot_availability: parse_slot_availability(&raw.slot_availability)?,
            contact_email: normalize::email(&raw.contact_email),
            contact_number,
            extra: normalize::scalar(&raw.extra),
            tags: parse_tags(&raw.tags)?,
            url: url.to_string(),
        })
    }

    /// Whether a phone number was found.
    pub fn has_contact_number(&self) -> bool {
        self.contact_number != 0
    }
}

/// Match each value against the vocabulary; unknown values reject the record.
fn parse_slot_availability(values: &[String]) -> ExtractionResult<Vec<SlotAvailability>> {
    let mut slots: Vec<SlotAvailability> = Vec::new();
    for value in values.iter().filter(|v| !v.trim().is_empty()) {
        let slot = value.parse::<SlotAvailability>().map_err(|bad| {
            ExtractionError::validation("slot_availability", format!("unknown value `{bad}`"))
        })?;
        if !slots.contains(&slot) {
            slots.push(slot);
        }
    }

    if slots.iter().any(|s| *s != SlotAvailability::NotAvailable) {
        slots.retain(|s| *s != SlotAvailability::NotAvailable);
    }
    if slots.is_empty() {
        slots.push(SlotAvailability::NotAvailable);
    }
    Ok(slots)
}

/// Parse 1-3 distinct tags from the fixed vocabulary.
fn parse_tags(values: &[String]) -> ExtractionResult<Vec<Tag>> {
    let mut tags: Vec<Tag> = Vec::new();
    for value in values {
        let tag = value
            .parse::<Tag>()
            .map_err(|bad| ExtractionError::validation("tags", format!("unknown tag `{bad}`")))?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    match tags.len() {
        0 => Err(ExtractionError::validation("tags", "at least one tag is required")),
        n if n > MAX_TAGS => Err(ExtractionError::validation(
            "tags",
            format!("{n} tags given, at most {MAX_TAGS} allowed"),
        )),
        _ => Ok(tags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soup_mobile() -> ExtractedOpportunity {
        serde_json::from_value(serde_json::json!({
            "organization_name": "SoupMobile",
            "activity_type": "Feeding the homeless and needy children",
            "location": "2490 Coombs Street, Dallas, TX 75215, US",
            "time_slot": "MWThFSa",
            "slot_availability": ["N/A"],
            "contact_email": "soup@dallas.com",
            "contact_number": 2142356987_i64,
            "extra": "Corporate Volunteering only on Tuesday.",
            "tags": ["homeless support", "food security"]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_extracted_normalizes_and_attaches_url() {
        let opp = Opportunity::from_extracted(soup_mobile(), "https://soupmobile.org/volunteer").unwrap();

        assert_eq!(opp.organization_name, "SoupMobile");
        assert_eq!(opp.location, "2490 Coombs Street, Dallas, TX");
        assert_eq!(opp.slot_availability, vec![SlotAvailability::NotAvailable]);
        assert_eq!(opp.contact_number, 2142356987);
        assert_eq!(opp.tags, vec![Tag::HomelessSupport, Tag::FoodSecurity]);
        assert_eq!(opp.url, "https://soupmobile.org/volunteer");
    }

    #[test]
    fn test_model_supplied_url_is_ignored() {
        let mut value = serde_json::to_value(soup_mobile()).unwrap();
        value["url"] = serde_json::json!("https://evil.example");
        let raw: ExtractedOpportunity = serde_json::from_value(value).unwrap();

        let opp = Opportunity::from_extracted(raw, "https://soupmobile.org").unwrap();
        assert_eq!(opp.url, "https://soupmobile.org");
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut raw = soup_mobile();
        raw.tags = vec!["sports".into()];

        let err = Opportunity::from_extracted(raw, "https://x.org").unwrap_err();
        assert!(matches!(err, ExtractionError::Validation { field: "tags", .. }));
    }

    #[test]
    fn test_tag_count_bounds() {
        let mut none = soup_mobile();
        none.tags = vec![];
        assert!(Opportunity::from_extracted(none, "https://x.org").is_err());

        let mut four = soup_mobile();
        four.tags = vec![
            "education".into(),
            "community".into(),
            "advocacy".into(),
            "healthcare".into(),
        ];
        assert!(Opportunity::from_extracted(four, "https://x.org").is_err());

        let mut three = soup_mobile();
        three.tags = vec!["education".into(), "community".into(), "advocacy".into()];
        assert_eq!(
            Opportunity::from_extracted(three, "https://x.org").unwrap().tags.len(),
            3
        );
    }

    #[test]
    fn test_tags_case_insensitive_and_deduplicated() {
        let mut raw = soup_mobile();
        raw.tags = vec!["Food Security".into(), "food_security".into(), " ANIMAL WELFARE ".into()];

        let opp = Opportunity::from_extracted(raw, "https://x.org").unwrap();
        assert_eq!(opp.tags, vec![Tag::FoodSecurity, Tag::AnimalWelfare]);
    }

    #[test]
    fn test_slot_availability_rules() {
        let mut mixed = soup_mobile();
        mixed.slot_availability = vec![
            "N/A".into(),
            "Individual Drop-In Welcome".into(),
            "corporate group application required".into(),
        ];
        let opp = Opportunity::from_extracted(mixed, "https://x.org").unwrap();
        assert_eq!(
            opp.slot_availability,
            vec![
                SlotAvailability::IndividualDropIn,
                SlotAvailability::CorporateApplication
            ]
        );

        let mut empty = soup_mobile();
        empty.slot_availability = vec![];
        let opp = Opportunity::from_extracted(empty, "https://x.org").unwrap();
        assert_eq!(opp.slot_availability, vec![SlotAvailability::NotAvailable]);

        let mut unknown = soup_mobile();
        unknown.slot_availability = vec!["walk-ins maybe".into()];
        let err = Opportunity::from_extracted(unknown, "https://x.org").unwrap_err();
        assert!(matches!(err, ExtractionError::Validation { field: "slot_availability", .. }));
    }

    #[test]
    fn test_contact_number_variants() {
        let parse = |v: serde_json::Value| -> ExtractedOpportunity {
            let mut base = serde_json::to_value(soup_mobile()).unwrap();
            base["contact_number"] = v;
            serde_json::from_value(base).unwrap()
        };

        assert_eq!(parse(serde_json::json!("+1 (214) 696-6987")).contact_number, Some(12146966987));
        assert_eq!(parse(serde_json::json!(null)).contact_number, None);
        assert_eq!(parse(serde_json::json!("N/A")).contact_number, None);
        assert_eq!(parse(serde_json::json!(0)).contact_number, Some(0));

        let opp = Opportunity::from_extracted(parse(serde_json::json!(null)), "https://x.org").unwrap();
        assert_eq!(opp.contact_number, 0);
        assert!(!opp.has_contact_number());

        let err = Opportunity::from_extracted(parse(serde_json::json!(-5)), "https://x.org").unwrap_err();
        assert!(matches!(err, ExtractionError::Validation { field: "contact_number", .. }));
    }

    #[test]
    fn test_missing_scalars_become_not_available() {
        let raw: ExtractedOpportunity = serde_json::from_value(serde_json::json!({
            "organization_name": "Trail Keepers",
            "activity_type": "clearing brush on hiking trails",
            "location": null,
            "time_slot": "",
            "tags": ["environment"]
        }))
        .unwrap();

        let opp = Opportunity::from_extracted(raw, "https://trails.org").unwrap();
        assert_eq!(opp.location, NOT_AVAILABLE);
        assert_eq!(opp.time_slot, NOT_AVAILABLE);
        assert_eq!(opp.contact_email, NOT_AVAILABLE);
        assert_eq!(opp.extra, NOT_AVAILABLE);
    }

    #[test]
    fn test_persisted_shape_uses_vocabulary_strings() {
        let opp = Opportunity::from_extracted(soup_mobile(), "https://soupmobile.org").unwrap();
        let value = serde_json::to_value(&opp).unwrap();

        assert_eq!(value["tags"], serde_json::json!(["homeless support", "food security"]));
        assert_eq!(value["slot_availability"], serde_json::json!(["N/A"]));
        assert_eq!(value["url"], "https://soupmobile.org");
    }

    #[test]
    fn test_schema_lists_every_field() {
        let schema = serde_json::to_value(schemars::schema_for!(ExtractedOpportunity)).unwrap();
        let props = schema["properties"].as_object().unwrap();

        for field in [
            "organization_name",
            "activity_type",
            "location",
            "time_slot",
            "slot_availability",
            "contact_email",
            "contact_number",
            "extra",
            "tags",
        ] {
            assert!(props.contains_key(field), "missing {field}");
        }
        assert!(!props.contains_key("url"));
        assert_eq!(props["contact_number"]["type"], "integer");
    }

    #[test]
    fn test_openai_strict_schema_has_no_defaults() {
        use openai_client::StructuredOutput;

        let schema = <ExtractedOpportunity as StructuredOutput>::openai_schema();
        let props = schema["properties"].as_object().unwrap();

        for (name, prop) in props {
            assert!(prop.get("default").is_none(), "{name} carries a default");
        }
        assert_eq!(props["contact_number"]["type"], "integer");
        assert_eq!(schema["required"].as_array().unwrap().len(), props.len());
        assert_eq!(schema["additionalProperties"], false);
    }
}
