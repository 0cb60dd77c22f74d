pub mod access_token;
pub mod admission_service;
pub mod eligibility;
pub mod payment_service;
pub mod question_cache;
pub mod scoring_service;
