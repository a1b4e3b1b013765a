pub mod delivery;
pub mod job;

pub use delivery::DeliveryRecordRow;
pub use job::JobRow;
