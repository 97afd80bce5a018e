pub mod mail;
pub mod sms;

pub use self::mail::{Mailer, feedback_response_email};
pub use self::sms::SmsSender;
