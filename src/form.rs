use reqwest::Url;

use crate::error::{ApiResult, FieldError, ValidationError};
use crate::models::{JobListing, JobType, NewJob};

pub const EXPERIENCE_LEVELS: [&str; 3] = ["Entry Level", "Mid Level", "Senior Level"];
pub const CURRENCIES: [&str; 5] = ["USD", "EUR", "GBP", "CAD", "AUD"];
pub const MAX_POSTED_SALARY: u64 = 1_000_000;

fn check_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.trim().chars().count();
    let message = if len == 0 {
        format!("{} is required", label)
    } else if len < min {
        format!("{} must be at least {} characters", label, min)
    } else if len > max {
        format!("{} must be at most {} characters", label, max)
    } else {
        return;
    };
    errors.push(FieldError { field, message });
}

fn check_one_of(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    label: &str,
    value: &str,
    allowed: &[&str],
) {
    if !allowed.contains(&value) {
        errors.push(FieldError {
            field,
            message: format!("{} must be one of: {}", label, allowed.join(", ")),
        });
    }
}

pub fn validate(job: &NewJob) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    check_length(&mut errors, "title", "Job title", &job.title, 3, 100);
    check_length(&mut errors, "company", "Company name", &job.company, 2, 50);
    check_length(&mut errors, "location", "Location", &job.location, 2, 50);

    let job_types: Vec<&str> = JobType::ALL.iter().map(|t| t.as_str()).collect();
    check_one_of(&mut errors, "type", "Job type", &job.job_type, &job_types);

    if job.salary > MAX_POSTED_SALARY {
        errors.push(FieldError {
            field: "salary",
            message: format!("Salary must be at most {}", MAX_POSTED_SALARY),
        });
    }

    check_length(&mut errors, "description", "Job description", &job.description, 10, 5000);
    check_one_of(
        &mut errors,
        "experienceLevel",
        "Experience level",
        &job.experience_level,
        &EXPERIENCE_LEVELS,
    );

    if let Some(logo) = job.logo.as_deref().filter(|l| !l.trim().is_empty()) {
        let valid = Url::parse(logo)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(FieldError {
                field: "logo",
                message: "Please enter a valid URL".to_string(),
            });
        }
    }

    check_one_of(&mut errors, "currency", "Currency", &job.currency, &CURRENCIES);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(errors))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormStatus {
    Editing,
    Invalid(ValidationError),
    Submitting,
    Created(String), // id of the created job
    Failed(String),
}

/// A job posting being filled in. Values survive a failed submission so the
/// user can correct them; a successful one clears the form.
#[derive(Debug, Clone)]
pub struct CreateForm {
    pub values: NewJob,
    status: FormStatus,
}

impl Default for CreateForm {
    fn default() -> Self {
        Self::new(Self::initial_values())
    }
}

impl CreateForm {
    pub fn new(values: NewJob) -> Self {
        Self {
            values,
            status: FormStatus::Editing,
        }
    }

    pub fn initial_values() -> NewJob {
        NewJob {
            job_type: JobType::FullTime.as_str().to_string(),
            experience_level: EXPERIENCE_LEVELS[0].to_string(),
            currency: CURRENCIES[0].to_string(),
            ..Default::default()
        }
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    /// Validate and hand out the payload to send.
    pub fn begin_submit(&mut self) -> Result<NewJob, ValidationError> {
        if let Err(e) = validate(&self.values) {
            self.status = FormStatus::Invalid(e.clone());
            return Err(e);
        }
        self.status = FormStatus::Submitting;
        Ok(self.values.clone())
    }

    pub fn finish_submit(&mut self, result: ApiResult<JobListing>) {
        match result {
            Ok(job) => {
                self.values = Self::initial_values();
                self.status = FormStatus::Created(job.id);
            }
            Err(e) => {
                self.status = FormStatus::Failed(e.user_message());
            }
        }
    }
}
