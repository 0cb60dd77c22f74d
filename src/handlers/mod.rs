pub mod contest_handler;
pub mod exam_handler;
pub mod health_handler;
pub mod payment_handler;

pub use contest_handler::{list_contests, register, slot_counts};
pub use exam_handler::{booking_eligibility, exam_status, list_questions, submit_exam};
pub use health_handler::{health_check, health_check_live, health_check_ready};
pub use payment_handler::{booking_access, confirm_payment, create_payment_order};
