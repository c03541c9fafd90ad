//! actix-web Binding
//!
//! ```ignore
//! let carnil = carnil_adapters::actix::configure(&config)?;
//! HttpServer::new(move || App::new().configure(carnil.clone()))
//! ```

use actix_web::{
    HttpRequest, HttpResponse, Responder,
    body::BoxBody,
    http::StatusCode,
    middleware::DefaultHeaders,
    web,
};

use crate::config::AdapterConfig;
use crate::error::Result;
use crate::handler::{CarnilHandler, Reply};
use crate::identity::RequestHeaders;
use crate::webhook::WebhookHandler;
use crate::ACTION_PATH;

#[derive(Clone)]
struct Handlers {
    action: CarnilHandler,
    webhook: WebhookHandler,
}

impl Responder for Reply {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        let status = StatusCode::from_u16(self.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(self.body)
    }
}

/// Service configuration mounting the Carnil scope.
///
/// CORS headers are validated here so the returned closure cannot fail.
pub fn configure(
    config: &AdapterConfig,
) -> Result<impl Fn(&mut web::ServiceConfig) + Clone + Send + use<>> {
    config.cors_headers.validate()?;
    let cors = config.cors_headers.resolved();
    let handlers = Handlers {
        action: CarnilHandler::new(config),
        webhook: WebhookHandler::new(config),
    };

    Ok(move |cfg: &mut web::ServiceConfig| {
        let headers = cors
            .iter()
            .fold(DefaultHeaders::new(), |headers, (name, value)| {
                headers.add((name.as_str(), value.as_str()))
            });

        cfg.service(
            web::scope(ACTION_PATH)
                .app_data(web::Data::new(handlers.clone()))
                .wrap(headers)
                .service(
                    web::resource("")
                        .route(web::post().to(action))
                        .route(web::method(actix_web::http::Method::OPTIONS).to(preflight)),
                )
                .service(
                    web::resource("/webhook")
                        .route(web::post().to(webhook))
                        .route(web::method(actix_web::http::Method::OPTIONS).to(preflight)),
                )
                .service(web::resource("/health").route(web::get().to(health))),
        );
    })
}

fn request_headers(req: &HttpRequest) -> RequestHeaders {
    RequestHeaders::from_pairs(
        req.headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?))),
    )
}

async fn action(handlers: web::Data<Handlers>, req: HttpRequest, body: String) -> Reply {
    handlers
        .action
        .handle(&http::Method::POST, &request_headers(&req), &body)
        .await
}

async fn webhook(handlers: web::Data<Handlers>, req: HttpRequest, body: String) -> Reply {
    handlers
        .webhook
        .handle(&request_headers(&req), &body)
        .await
}

async fn preflight() -> Reply {
    Reply::preflight()
}

async fn health(handlers: web::Data<Handlers>) -> Reply {
    handlers.action.health().await
}
