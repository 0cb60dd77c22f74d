pub mod booking;
pub mod contest;
pub mod question;
pub mod slots;
pub mod submission;
pub use booking::{Booking, BookingStatus};
pub use contest::Contest;
pub use question::{Question, QuestionOption, QuestionType};
pub use slots::SlotWindow;
pub use submission::{AnswerRecord, SubmissionRecord};
