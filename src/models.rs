pub mod auth;
pub mod dashboard;
pub mod deal;
pub mod lead;
pub mod quote;
