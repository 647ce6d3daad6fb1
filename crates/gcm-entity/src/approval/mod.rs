//! Pending change records shared by the price and content workflows.

pub mod content_details;
pub mod content_request;
pub mod price_update;
pub mod status;

pub use content_details::{CONTENT_DETAILS_VERSION, ContentDetails, ContentDetailsDocument};
pub use content_request::{ContentAction, ContentRequest, ContentRequestView, ContentType};
pub use price_update::{PriceUpdate, PriceUpdateView};
pub use status::{Decision, RequestStatus, Resolution};
