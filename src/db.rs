pub mod user_repo;
pub use user_repo::UserRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod quote_repo;
pub use quote_repo::QuoteRepository;
pub mod deal_repo;
pub use deal_repo::DealRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
