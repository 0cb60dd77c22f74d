pub mod booking_repository;
pub mod contest_repository;
pub mod question_repository;
pub mod slot_occupancy_repository;
pub mod submission_repository;

pub use booking_repository::{BookingRepository, MongoBookingRepository};
pub use contest_repository::{ContestRepository, MongoContestRepository};
pub use question_repository::{MongoQuestionRepository, QuestionChangeEvent, QuestionRepository};
pub use slot_occupancy_repository::{MongoSlotOccupancyRepository, SlotOccupancyRepository};
pub use submission_repository::{MongoSubmissionRepository, SubmissionRepository};
