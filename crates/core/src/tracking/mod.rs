//! Tracking module - canonical records, ingestion, and the store contract.

mod normalizer;
mod tracking_constants;
mod tracking_model;
mod tracking_service;
mod tracking_traits;


#[cfg(test)]
mod tracking_service_tests;

pub use normalizer::{device_from_user_agent, record_from_completed_visit, record_from_visit};
pub use tracking_constants::*;
pub use tracking_model::{
    CompletedVisit, DeviceType, OrderInfo, OrderLine, PaginationInfo, RecordPage, RefundInfo,
    SalesStatus, TrackingRecord, VisitEvent,
};
pub use tracking_service::TrackingService;
pub use tracking_traits::{CompletedVisitSource, TrackingRepositoryTrait, TrackingServiceTrait};
