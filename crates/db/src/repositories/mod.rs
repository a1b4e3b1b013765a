pub mod delivery_repo;
pub mod job_repo;
pub mod recipient_repo;

pub use delivery_repo::DeliveryRepo;
pub use job_repo::JobRepo;
pub use recipient_repo::RecipientRepo;
