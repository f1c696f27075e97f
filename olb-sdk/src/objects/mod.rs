//! Wire objects exchanged with the Open Lesson Booking server.
//!
//! These are the API/DTO types. Database entities live in `olb-core` and
//! carry the `sqlx` derives; the two layers convert at the handler boundary.

pub mod availability;
pub mod booking;
pub mod earnings;
pub mod special_slot;
pub mod webhook;

pub use availability::{
    AddAvailabilityRequest, AvailabilityBlockResponse, BookedSlotResponse, DerivedScheduleResponse,
    FreeSlotResponse, UpdateAvailabilityRequest,
};
pub use booking::{BookingPeriod, BookingResponse};
pub use earnings::{EarningRow, EarningsRange, EarningsResponse, EarningsSummary};
pub use special_slot::{
    CatalogLesson, CatalogResponse, CatalogStudent, CreateSpecialSlotRequest, SharedSlotView,
    SlotPaymentStatus, SpecialSlotResponse,
};
pub use webhook::{
    CheckoutMetadata, MeetingChallengeResponse, MeetingEvent, MeetingEventPayload, MeetingObject,
    PaymentObject, ProviderEvent, ProviderEventKind,
};
