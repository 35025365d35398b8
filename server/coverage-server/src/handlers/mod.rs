pub mod benefits;
pub mod coverage;
pub mod eligibility;
pub mod health;
pub mod insurers;
pub mod members;
pub mod policies;
pub mod schemes;
pub mod utilization;
