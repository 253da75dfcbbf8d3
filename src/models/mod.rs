pub mod submission;

pub use submission::{FormFields, FormSubmission, DATE_FORMAT};
