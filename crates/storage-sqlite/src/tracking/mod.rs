mod model;
mod repository;

pub use model::TrackingRecordDB;
pub use repository::TrackingRepository;
