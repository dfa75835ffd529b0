use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Upper bound of the salary slider; a ceiling at this value means "no salary filter".
pub const MAX_SALARY_CEILING: u64 = 200_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobType {
    FullTime,
    Hybrid,
    Internship,
    Contract,
    Volunteer,
    Other(String), // anything the API sends outside the fixed set
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::FullTime,
        JobType::Hybrid,
        JobType::Internship,
        JobType::Contract,
        JobType::Volunteer,
    ];

    /// Wire value understood by the listing API.
    pub fn as_str(&self) -> &str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::Hybrid => "Hybrid",
            JobType::Internship => "Internship",
            JobType::Contract => "Contract",
            JobType::Volunteer => "Volunteer",
            JobType::Other(s) => s,
        }
    }

    /// Human label for filter widgets.
    pub fn label(&self) -> &str {
        match self {
            JobType::FullTime => "Full Time",
            other => other.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, JobType::Other(_))
    }
}

impl Default for JobType {
    fn default() -> Self {
        JobType::Other(String::new())
    }
}

impl From<String> for JobType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Full-time" => JobType::FullTime,
            "Hybrid" => JobType::Hybrid,
            "Internship" => JobType::Internship,
            "Contract" => JobType::Contract,
            "Volunteer" => JobType::Volunteer,
            _ => JobType::Other(s),
        }
    }
}

impl From<JobType> for String {
    fn from(t: JobType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = JobType::from(s.to_string());
        if t.is_known() {
            Ok(t)
        } else {
            let valid: Vec<&str> = JobType::ALL.iter().map(|t| t.as_str()).collect();
            Err(format!("unknown job type '{}' (expected one of: {})", s, valid.join(", ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type", default)]
    pub job_type: JobType,
    #[serde(default, deserialize_with = "deserialize_salary")]
    pub salary: Option<u64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub logo: String,
    #[serde(rename = "isBookMarked", default)]
    pub bookmarked: bool, // derived locally, never trusted from the server
}

/// Payload for `POST /jobs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub salary: u64,
    pub description: String,
    pub experience_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub currency: String,
}

/// One fetched page, normalized from whichever metadata fields the API sent.
#[derive(Debug, Clone, Default)]
pub struct JobsPage {
    pub jobs: Vec<JobListing>,
    pub total_items: Option<u64>,
    pub total_pages: Option<u32>,
    pub page: Option<u32>,
}

static SALARY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("salary regex"));

/// Parse a salary that may be formatted for display ("$120,000", "USD 95,000").
pub fn normalize_salary(raw: &str) -> Option<u64> {
    let m = SALARY_NUMBER.find(raw)?;
    let digits: String = m.as_str().chars().filter(|c| *c != ',').collect();
    let value: f64 = digits.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value.round() as u64)
    } else {
        None
    }
}

fn deserialize_salary<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSalary {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<RawSalary>::deserialize(deserializer)? {
        Some(RawSalary::Number(n)) if n.is_finite() && n >= 0.0 => Some(n.round() as u64),
        Some(RawSalary::Number(_)) => None,
        Some(RawSalary::Text(s)) => normalize_salary(&s),
        None => None,
    })
}

pub fn format_salary(salary: Option<u64>) -> String {
    match salary {
        Some(n) => {
            let digits = n.to_string();
            let mut out = String::new();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    out.push(',');
                }
                out.push(c);
            }
            format!("${}", out)
        }
        None => "-".to_string(),
    }
}

#[cfg(test)]
pub(crate) fn sample_listing(id: &str, job_type: JobType, salary: Option<u64>) -> JobListing {
    JobListing {
        id: id.to_string(),
        title: format!("Job {}", id),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
        job_type,
        salary,
        description: String::new(),
        experience_level: String::new(),
        logo: String::new(),
        bookmarked: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_salary_currency_formats() {
        assert_eq!(normalize_salary("$120,000"), Some(120_000));
        assert_eq!(normalize_salary("USD 95,000"), Some(95_000));
        assert_eq!(normalize_salary("80000"), Some(80_000));
        assert_eq!(normalize_salary("$1,250.60"), Some(1_251));
        assert_eq!(normalize_salary("competitive"), None);
        assert_eq!(normalize_salary(""), None);
    }

    #[test]
    fn test_listing_accepts_string_or_number_salary() {
        let json = r#"[
            {"id": "a", "title": "Rust Dev", "type": "Full-time", "salary": "$150,000"},
            {"_id": "b", "title": "Intern", "type": "Internship", "salary": 20000},
            {"id": "c", "title": "Helper", "type": "Volunteer"}
        ]"#;
        let jobs: Vec<JobListing> = serde_json::from_str(json).unwrap();
        assert_eq!(jobs[0].salary, Some(150_000));
        assert_eq!(jobs[1].id, "b");
        assert_eq!(jobs[1].salary, Some(20_000));
        assert_eq!(jobs[2].salary, None);
        assert_eq!(jobs[2].job_type, JobType::Volunteer);
    }

    #[test]
    fn test_unknown_job_type_is_preserved() {
        let json = r#"{"id": "x", "title": "Gig", "type": "Freelance"}"#;
        let job: JobListing = serde_json::from_str(json).unwrap();
        assert_eq!(job.job_type, JobType::Other("Freelance".to_string()));
        assert!(!job.job_type.is_known());
        assert!("Freelance".parse::<JobType>().is_err());
        assert_eq!("Full-time".parse::<JobType>().unwrap(), JobType::FullTime);
    }

    #[test]
    fn test_new_job_serializes_api_field_names() {
        let job = NewJob {
            title: "Backend Engineer".to_string(),
            job_type: "Contract".to_string(),
            experience_level: "Senior Level".to_string(),
            currency: "EUR".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "Contract");
        assert_eq!(value["experienceLevel"], "Senior Level");
        assert!(value.get("logo").is_none());
        assert!(value.get("isBookMarked").is_none());
    }

    #[test]
    fn test_format_salary() {
        assert_eq!(format_salary(Some(120_000)), "$120,000");
        assert_eq!(format_salary(Some(999)), "$999");
        assert_eq!(format_salary(None), "-");
    }
}
