//! # Gateway Crate
//!
//! The guarded data-access operations exposed to callers, and the campaign
//! workflow that creates a campaign from a transaction query.
//!
//! ## Public API
//!
//! - `ContactGateway`: select, count, joined select, routed select (contact and
//!   transaction), contact-with-details, campaign select, campaign creation and
//!   campaign-from-query.
//! - `CampaignOrchestrator`: resolve routing, scope to skills, count, create the
//!   campaign, copy the matching transactions.
//! - Request types in `request`, and `GatewayError` with its `RoutingError` branch.

pub mod campaign;
pub mod error;
pub mod request;
pub mod service;

#[cfg(test)]
mod fakes;

pub use campaign::{CampaignCreated, CampaignOrchestrator, CampaignOutcome, CampaignStage};
pub use error::{GatewayError, RoutingError};
pub use request::{
    CampaignFromQueryRequest, CampaignSelectRequest, CountRequest, CreateCampaignRequest,
    JoinedSelectRequest, RoutedSelectRequest, RoutedTable, SelectRequest,
};
pub use service::{ContactGateway, ContactWithDetails, GatewayOptions};
