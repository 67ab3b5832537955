use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parsed resume returned by the Resume Parsing Service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resume {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub summary: String,
    pub pdf: String,
    pub location: Location,
    pub emails: Vec<String>,
    pub profession: String,
    pub positions: Vec<Position>,
    pub educations: Vec<Education>,
    pub social_urls: Vec<SocialUrl>,
    pub phone_numbers: Vec<PhoneNumber>,
    pub languages: Vec<String>,
    pub detected_language: String,
    pub skills: Vec<Skill>,
    pub raw_text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub title: String,
    pub title_normalized: String,
    pub organization: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub description: String,
    pub location: Location,
    pub management_level: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub organization: String,
    pub degree: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Location,
    pub education_level: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialUrl {
    pub source: String,
    pub url: String,
    pub username: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneNumber {
    pub country_code: String,
    pub country_name: String,
    pub national_number: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub name: String,
    pub num_months: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub formatted: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    #[serde(rename = "countryCode")]
    pub country_code: String,
}
