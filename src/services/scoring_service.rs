use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{AnswerRecord, Question, QuestionType, SubmissionRecord},
        dto::{request::AnswerInput, response::SubmissionSummary},
    },
    repositories::{BookingRepository, SubmissionRepository},
    services::question_cache::QuestionCache,
};

/// Flat deduction for an attempted wrong answer.
const WRONG_ANSWER_PENALTY: f64 = 0.33;

pub struct GradedSubmission {
    pub answers: Vec<AnswerRecord>,
    pub total_score: f64,
    /// How many client answers referenced a question in the server set.
    pub matched_answers: usize,
}

/// Scores exam submissions exactly once per booking. The unique
/// SubmissionRecord.booking_id index is the enforcement point; the booking's
/// exam_taken flag is only the fast path.
pub struct ScoringService {
    bookings: Arc<dyn BookingRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    questions: Arc<QuestionCache>,
}

impl ScoringService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        questions: Arc<QuestionCache>,
    ) -> Self {
        Self {
            bookings,
            submissions,
            questions,
        }
    }

    /// Idempotent submit: the first call for a booking creates its
    /// SubmissionRecord and flips exam_taken; every later call (retry or
    /// duplicate payload) returns the first record unchanged.
    pub async fn submit(
        &self,
        booking_id: &str,
        answers: &[AnswerInput],
    ) -> AppResult<SubmissionSummary> {
        if answers.is_empty() {
            return Err(AppError::ValidationError(
                "answers must not be empty".to_string(),
            ));
        }

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id '{}' not found", booking_id)))?;

        if booking.exam_taken {
            let existing = self.submissions.find_by_booking(booking_id).await?.ok_or_else(|| {
                AppError::InternalError(
                    "exam marked taken but no submission record exists".to_string(),
                )
            })?;
            return Ok(SubmissionSummary::from(existing));
        }

        // the server-held question list is authoritative; the client's set is
        // never trusted to be complete
        let questions = self
            .questions
            .get(&booking.contest_id, &booking.slot_id)
            .await?;
        if questions.is_empty() {
            return Err(AppError::NotFound(
                "No questions found for this exam".to_string(),
            ));
        }

        let graded = grade(&questions, answers);
        if graded.matched_answers == 0 {
            return Err(AppError::NotFound(
                "None of the submitted questions belong to this exam".to_string(),
            ));
        }

        let record = SubmissionRecord::new(
            booking_id,
            &booking.contest_id,
            &booking.slot_id,
            graded.answers,
            graded.total_score,
        );

        let record = match self.submissions.insert(record).await {
            Ok(record) => record,
            Err(AppError::Conflict(_)) => {
                // lost the race to a concurrent submit (or retrying after a
                // partial failure): adopt the record that won
                self.submissions.find_by_booking(booking_id).await?.ok_or_else(|| {
                    AppError::InternalError(
                        "submission conflict but no record found for booking".to_string(),
                    )
                })?
            }
            Err(err) => return Err(err),
        };

        // complete the booking half of the unit; a no-op when a concurrent
        // submit or an earlier partial run already flipped it
        self.bookings
            .mark_exam_taken(booking_id, record.total_score, record.submitted_at)
            .await?;

        Ok(SubmissionSummary::from(record))
    }
}

/// Grade the server question set against the client's answers. Client answers
/// for unknown question ids are dropped silently; server questions with no
/// answer count as skipped.
pub fn grade(questions: &[Question], answers: &[AnswerInput]) -> GradedSubmission {
    let answers_by_question: HashMap<&str, &AnswerInput> = answers
        .iter()
        .map(|answer| (answer.question_id.as_str(), answer))
        .collect();

    let mut total_score = 0.0_f64;
    let mut matched_answers = 0;
    let mut records = Vec::with_capacity(questions.len());

    for question in questions {
        let answer = answers_by_question.get(question.id.as_str());
        if answer.is_some() {
            matched_answers += 1;
        }

        let record = match question.question_type {
            QuestionType::Mcq => grade_mcq(question, answer.copied()),
            QuestionType::Text | QuestionType::Numeric => grade_text(question, answer.copied()),
        };

        if record.is_correct {
            total_score += question.marks;
        } else if !record.skipped {
            total_score -= WRONG_ANSWER_PENALTY;
        }

        records.push(record);
    }

    GradedSubmission {
        answers: records,
        total_score,
        matched_answers,
    }
}

fn grade_mcq(question: &Question, answer: Option<&AnswerInput>) -> AnswerRecord {
    let selected = answer.and_then(|a| a.selected_option_index);

    match selected {
        None => skipped_record(question),
        Some(index) => {
            // an out-of-range index is an attempt, and a wrong one
            let is_correct = question
                .options
                .get(index)
                .map(|option| option.is_correct)
                .unwrap_or(false);
            AnswerRecord {
                question_id: question.id.clone(),
                selected_option_index: Some(index),
                text_answer: None,
                is_correct,
                skipped: false,
            }
        }
    }
}

fn grade_text(question: &Question, answer: Option<&AnswerInput>) -> AnswerRecord {
    let text = answer
        .and_then(|a| a.text_answer.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty());

    match text {
        None => skipped_record(question),
        Some(text) => {
            let expected = question
                .correct_answer
                .as_deref()
                .unwrap_or("")
                .trim()
                .to_lowercase();
            let is_correct = !expected.is_empty() && text.to_lowercase() == expected;
            AnswerRecord {
                question_id: question.id.clone(),
                selected_option_index: None,
                text_answer: Some(text.to_string()),
                is_correct,
                skipped: false,
            }
        }
    }
}

fn skipped_record(question: &Question) -> AnswerRecord {
    AnswerRecord {
        question_id: question.id.clone(),
        selected_option_index: None,
        text_answer: None,
        is_correct: false,
        skipped: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use crate::test_utils::in_memory::{
        InMemoryBookingRepository, InMemoryQuestionRepository, InMemorySubmissionRepository,
    };
    use crate::repositories::QuestionRepository;
    use std::time::Duration;

    const SCORE_EPSILON: f64 = 1e-9;

    struct Harness {
        service: Arc<ScoringService>,
        bookings: Arc<InMemoryBookingRepository>,
        submissions: Arc<InMemorySubmissionRepository>,
        questions: Arc<InMemoryQuestionRepository>,
        cache: Arc<QuestionCache>,
    }

    fn harness(questions: Vec<Question>) -> Harness {
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let submissions = Arc::new(InMemorySubmissionRepository::new());
        let question_repo = Arc::new(InMemoryQuestionRepository::with_questions(questions));
        let cache = Arc::new(QuestionCache::new(
            Arc::clone(&question_repo) as Arc<dyn QuestionRepository>,
            Duration::from_secs(90 * 60),
            8,
        ));
        let service = Arc::new(ScoringService::new(
            Arc::clone(&bookings) as Arc<dyn BookingRepository>,
            Arc::clone(&submissions) as Arc<dyn SubmissionRepository>,
            Arc::clone(&cache),
        ));
        Harness {
            service,
            bookings,
            submissions,
            questions: question_repo,
            cache,
        }
    }

    async fn booked_harness() -> (Harness, String) {
        let harness = harness(fixtures::three_question_exam("contest-1", "Slot-1"));
        let booking = fixtures::booking("contest-1", "Slot-1");
        let booking_id = booking.id.clone();
        harness
            .bookings
            .insert(booking)
            .await
            .expect("insert booking");
        (harness, booking_id)
    }

    #[tokio::test]
    async fn scores_mixed_answers_with_negative_marking() {
        let (harness, booking_id) = booked_harness().await;

        // correct mcq, wrong mcq, skipped numeric
        let summary = harness
            .service
            .submit(
                &booking_id,
                &[
                    fixtures::mcq_answer("q-1", 0),
                    fixtures::mcq_answer("q-2", 0),
                    fixtures::skipped_answer("q-3"),
                ],
            )
            .await
            .expect("submission should succeed");

        assert!((summary.total_score - 0.67).abs() < SCORE_EPSILON);
        assert_eq!(summary.attempted_count, 2);
        assert_eq!(summary.skipped_count, 1);
        assert_eq!(summary.correct_count, 1);
        assert_eq!(summary.wrong_count, 1);

        let booking = harness
            .bookings
            .find_by_id(&booking_id)
            .await
            .expect("lookup")
            .expect("booking exists");
        assert!(booking.exam_taken);
        assert!(booking.exam_taken_at.is_some());
        assert!((booking.score - 0.67).abs() < SCORE_EPSILON);
    }

    #[tokio::test]
    async fn second_submit_returns_first_record_unchanged() {
        let (harness, booking_id) = booked_harness().await;

        let first = harness
            .service
            .submit(
                &booking_id,
                &[
                    fixtures::mcq_answer("q-1", 0),
                    fixtures::mcq_answer("q-2", 0),
                    fixtures::skipped_answer("q-3"),
                ],
            )
            .await
            .expect("first submission should succeed");

        // a different (better) payload must not be rescored
        let second = harness
            .service
            .submit(
                &booking_id,
                &[
                    fixtures::mcq_answer("q-1", 0),
                    fixtures::mcq_answer("q-2", 1),
                    fixtures::text_answer("q-3", "42"),
                ],
            )
            .await
            .expect("second submission should succeed");

        assert_eq!(second.submitted_at, first.submitted_at);
        assert!((second.total_score - first.total_score).abs() < SCORE_EPSILON);
        assert_eq!(harness.submissions.record_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_submissions_produce_one_record() {
        let (harness, booking_id) = booked_harness().await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&harness.service);
            let booking_id = booking_id.clone();
            handles.push(tokio::spawn(async move {
                service
                    .submit(
                        &booking_id,
                        &[
                            fixtures::mcq_answer("q-1", 0),
                            fixtures::mcq_answer("q-2", 0),
                            fixtures::skipped_answer("q-3"),
                        ],
                    )
                    .await
            }));
        }

        let mut scores = Vec::new();
        for handle in handles {
            let summary = handle
                .await
                .expect("task should not panic")
                .expect("every submit resolves to the single record");
            scores.push(summary.total_score);
        }

        assert_eq!(harness.submissions.record_count(), 1);
        assert!(scores
            .windows(2)
            .all(|pair| (pair[0] - pair[1]).abs() < SCORE_EPSILON));
    }

    #[tokio::test]
    async fn retry_completes_partial_submission() {
        let (harness, booking_id) = booked_harness().await;

        // simulate a crash between record insert and the booking flag flip
        let record = SubmissionRecord::new(&booking_id, "contest-1", "Slot-1", vec![], 1.5);
        harness
            .submissions
            .insert(record)
            .await
            .expect("seed partial record");

        let summary = harness
            .service
            .submit(&booking_id, &[fixtures::mcq_answer("q-1", 0)])
            .await
            .expect("retry should reconcile");

        assert!((summary.total_score - 1.5).abs() < SCORE_EPSILON);

        let booking = harness
            .bookings
            .find_by_id(&booking_id)
            .await
            .expect("lookup")
            .expect("booking exists");
        assert!(booking.exam_taken, "retry must complete the missing half");
    }

    #[tokio::test]
    async fn unknown_question_ids_are_dropped_silently() {
        let (harness, booking_id) = booked_harness().await;

        let summary = harness
            .service
            .submit(
                &booking_id,
                &[
                    fixtures::mcq_answer("q-1", 0),
                    fixtures::mcq_answer("ghost-question", 2),
                ],
            )
            .await
            .expect("submission should succeed despite the unknown id");

        // the ghost answer neither scores nor errors; q-2/q-3 count skipped
        assert!((summary.total_score - 1.0).abs() < SCORE_EPSILON);
        assert_eq!(summary.attempted_count, 1);
        assert_eq!(summary.skipped_count, 2);
    }

    #[tokio::test]
    async fn rejects_when_no_submitted_question_matches() {
        let (harness, booking_id) = booked_harness().await;

        let err = harness
            .service
            .submit(&booking_id, &[fixtures::mcq_answer("ghost-question", 0)])
            .await
            .expect_err("should fail");

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(harness.submissions.record_count(), 0);
    }

    #[tokio::test]
    async fn rejects_unknown_booking_and_empty_answers() {
        let (harness, booking_id) = booked_harness().await;

        let err = harness
            .service
            .submit("no-such-booking", &[fixtures::mcq_answer("q-1", 0)])
            .await
            .expect_err("should fail");
        assert!(matches!(err, AppError::NotFound(_)));

        let err = harness
            .service
            .submit(&booking_id, &[])
            .await
            .expect_err("should fail");
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn deleted_question_scores_nothing_after_invalidation() {
        let (harness, booking_id) = booked_harness().await;

        // warm the cache, then delete q-1 upstream and invalidate
        harness
            .cache
            .get("contest-1", "Slot-1")
            .await
            .expect("warm cache");
        harness.questions.delete("q-1");
        harness.cache.invalidate("contest-1", "Slot-1").await;

        let summary = harness
            .service
            .submit(
                &booking_id,
                &[
                    fixtures::mcq_answer("q-1", 0),
                    fixtures::mcq_answer("q-2", 1),
                ],
            )
            .await
            .expect("submission should survive the deleted question");

        // q-1 is gone: no marks awarded for it, q-2 correct, q-3 skipped
        assert!((summary.total_score - 1.0).abs() < SCORE_EPSILON);
        assert_eq!(summary.attempted_count, 1);
        assert_eq!(summary.skipped_count, 1);
    }

    #[test]
    fn text_answers_match_case_insensitively_and_trimmed() {
        let questions = vec![fixtures::text_question(
            "q-text",
            "contest-1",
            "Slot-1",
            "Blue Whale",
            2.0,
        )];

        let graded = grade(&questions, &[fixtures::text_answer("q-text", "  blue whale ")]);

        assert!(graded.answers[0].is_correct);
        assert!((graded.total_score - 2.0).abs() < SCORE_EPSILON);
    }

    #[test]
    fn numeric_answers_compare_after_trimming() {
        let questions = fixtures::three_question_exam("contest-1", "Slot-1");

        let graded = grade(&questions, &[fixtures::text_answer("q-3", " 42 ")]);

        let record = graded
            .answers
            .iter()
            .find(|record| record.question_id == "q-3")
            .expect("q-3 graded");
        assert!(record.is_correct);
        assert!((graded.total_score - 2.0).abs() < SCORE_EPSILON);
    }

    #[test]
    fn out_of_range_option_index_counts_as_wrong_attempt() {
        let questions = fixtures::three_question_exam("contest-1", "Slot-1");

        let graded = grade(&questions, &[fixtures::mcq_answer("q-1", 99)]);

        let record = graded
            .answers
            .iter()
            .find(|record| record.question_id == "q-1")
            .expect("q-1 graded");
        assert!(!record.is_correct);
        assert!(!record.skipped);
        assert!((graded.total_score + WRONG_ANSWER_PENALTY).abs() < SCORE_EPSILON);
    }

    #[test]
    fn whitespace_only_text_answer_counts_as_skipped() {
        let questions = fixtures::three_question_exam("contest-1", "Slot-1");

        let graded = grade(&questions, &[fixtures::text_answer("q-3", "   ")]);

        let record = graded
            .answers
            .iter()
            .find(|record| record.question_id == "q-3")
            .expect("q-3 graded");
        assert!(record.skipped);
    }
}
