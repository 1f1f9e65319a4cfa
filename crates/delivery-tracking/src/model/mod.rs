//! Domain types for deliveries and the collaborators they reference.

mod address;
mod artisan;
pub mod delivery;
mod issue;
mod order;
mod status;
mod tracking_number;

pub use address::*;
pub use artisan::*;
pub use delivery::{
    AttemptOutcome, AttemptReport, CourierInfo, DeliveryAttempt, DeliveryCreate, DeliveryRecord,
    Dimensions, EventOrigin, Feedback, NotificationState, PackageDetails, Recipient, SenderInfo,
    StatusChange, StatusEvent,
};
pub use issue::*;
pub use order::*;
pub use status::*;
pub use tracking_number::*;
