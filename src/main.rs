use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use talent_server::{
    app_state::AppState,
    config::Config,
    handlers,
    services::{admission_service::AdmissionService, question_cache::QuestionCache},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        config.validate_for_production();
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;

    let state = AppState::new(config)
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))?;

    let _invalidator = QuestionCache::spawn_invalidator(state.question_cache.clone());
    let _hold_sweeper = AdmissionService::spawn_hold_sweeper(
        state.admission.clone(),
        state.config.hold_sweep_interval_secs,
    );

    log::info!("starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(handlers::list_contests)
            .service(handlers::slot_counts)
            .service(handlers::register)
            .service(handlers::booking_eligibility)
            .service(handlers::submit_exam)
            .service(handlers::exam_status)
            .service(handlers::list_questions)
            .service(handlers::create_payment_order)
            .service(handlers::confirm_payment)
            .service(handlers::booking_access)
            .service(handlers::health_check)
            .service(handlers::health_check_ready)
            .service(handlers::health_check_live)
    })
    .bind((host, port))?
    .run()
    .await
}
