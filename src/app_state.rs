use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        BookingRepository, ContestRepository, MongoBookingRepository, MongoContestRepository,
        MongoQuestionRepository, MongoSlotOccupancyRepository, MongoSubmissionRepository,
        QuestionRepository, SlotOccupancyRepository, SubmissionRepository,
    },
    services::{
        access_token::AccessTokenStore, admission_service::AdmissionService,
        payment_service::PaymentService, question_cache::QuestionCache,
        scoring_service::ScoringService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub contests: Arc<dyn ContestRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub admission: Arc<AdmissionService>,
    pub scoring: Arc<ScoringService>,
    pub payments: Arc<PaymentService>,
    pub question_cache: Arc<QuestionCache>,
    pub access_tokens: Arc<AccessTokenStore>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let contest_repository = Arc::new(MongoContestRepository::new(&db));
        contest_repository.ensure_indexes().await?;
        let booking_repository = Arc::new(MongoBookingRepository::new(&db));
        booking_repository.ensure_indexes().await?;
        let occupancy_repository = Arc::new(MongoSlotOccupancyRepository::new(&db));
        occupancy_repository.ensure_indexes().await?;
        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;
        let submission_repository = Arc::new(MongoSubmissionRepository::new(&db));
        submission_repository.ensure_indexes().await?;

        let contests: Arc<dyn ContestRepository> = contest_repository;
        let bookings: Arc<dyn BookingRepository> = booking_repository;
        let occupancy: Arc<dyn SlotOccupancyRepository> = occupancy_repository;
        let questions: Arc<dyn QuestionRepository> = question_repository;
        let submissions: Arc<dyn SubmissionRepository> = submission_repository;

        let admission = Arc::new(AdmissionService::new(
            Arc::clone(&contests),
            Arc::clone(&bookings),
            occupancy,
            config.payment_hold_minutes,
        ));

        let question_cache = Arc::new(QuestionCache::new(
            questions,
            Duration::from_secs(config.question_cache_ttl_minutes * 60),
            config.question_cache_max_entries,
        ));

        let scoring = Arc::new(ScoringService::new(
            Arc::clone(&bookings),
            submissions,
            Arc::clone(&question_cache),
        ));

        let payments = Arc::new(PaymentService::new(
            &config,
            Arc::clone(&contests),
            Arc::clone(&bookings),
        ));

        let access_tokens = Arc::new(AccessTokenStore::new(ChronoDuration::minutes(
            config.access_token_ttl_minutes,
        )));

        Ok(Self {
            db,
            config: Arc::new(config),
            contests,
            bookings,
            admission,
            scoring,
            payments,
            question_cache,
            access_tokens,
        })
    }
}
