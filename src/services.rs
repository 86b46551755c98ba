pub mod auth;
pub mod dashboard_service;
pub mod deal_service;
pub mod filters;
pub mod lead_service;
pub mod policy;
pub mod quote_service;
