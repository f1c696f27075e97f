//! Background event processors.
//!
//! - `NotificationDispatcher`: receives `EmailEvent`, renders and sends mail
//! - `MeetingJanitor`: receives `MeetingRoomEvent`, closes abandoned rooms

pub mod meeting_janitor;
pub mod notification_dispatcher;

pub use meeting_janitor::MeetingJanitor;
pub use notification_dispatcher::NotificationDispatcher;
