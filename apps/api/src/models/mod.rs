pub mod candidate;
pub mod job_description;
