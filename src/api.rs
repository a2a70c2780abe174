use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};

pub async fn health_check() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "dealer-scraper",
        "message": "Dealer scraper backend running"
    })))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health_check))
        .route("/api/health", web::get().to(health_check));
}

/// Run the liveness service until the process is stopped
pub async fn serve(host: &str, port: u16) -> std::io::Result<()> {
    log::info!("Starting dealer-scraper health service");
    log::info!("Health check at http://{}:{}/api/health", host, port);

    HttpServer::new(|| {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(cors)
            .configure(routes)
    })
    .bind((host, port))?
    .run()
    .await
}
