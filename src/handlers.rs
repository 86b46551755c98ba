pub mod dashboard;
pub mod deals;
pub mod leads;
pub mod quotes;
pub mod users;
