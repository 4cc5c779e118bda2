//! Test service wiring that mirrors `main.rs`.

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use playtogether::middleware::request_trace::RequestTrace;
use playtogether::routes;
use playtogether::state::app_state::AppState;

/// Initialise the full route tree over `state`, wrapped in `RequestTrace`.
pub async fn create_test_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = Error> {
    test::init_service(
        App::new()
            .wrap(RequestTrace)
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await
}
