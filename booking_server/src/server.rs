use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use booking_engine::{events::EventProducers, ReconciliationApi, SqliteDatabase};
use futures::future::{ok, Either};
use log::*;
use tokio::task::JoinHandle;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::{get_service_request_ip, is_whitelisted},
    integrations::{
        notifications::create_notification_event_handlers,
        sequence_rpc::SequenceRpcClient,
        stripe::StripeGateway,
    },
    routes::{health, ConfirmPaymentRoute},
    webhook_routes::PaymentWebhookRoute,
};

const MAX_DB_CONNECTIONS: u32 = 25;
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    }
    let db = db.with_write_capabilities(config.column_policy).await.map_err(|e| {
        error!("🗃️ The reservations table cannot be used as it is. {e}");
        ServerError::ConfigurationError(e.to_string())
    })?;
    let gateway = StripeGateway::new(config.gateway.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not create the gateway client. {e}")))?;
    let sequence = SequenceRpcClient::new(&config.sequence_rpc)?;
    let handlers = create_notification_event_handlers(config.mail.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not create the notification dispatcher. {e}")))?;
    let producers = handlers.producers();
    let handles = handlers.start_handlers();
    let srv = create_server_instance(config, db, gateway, sequence, producers)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    drain_notifications(handles).await;
    result
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: StripeGateway,
    sequence: SequenceRpcClient,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let gateway_whitelist = config.gateway_whitelist.clone();
    let srv = HttpServer::new(move || {
        let api = ReconciliationApi::new(db.clone(), gateway.clone(), sequence.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tbp::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(options))
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|e, _req| ServerError::InvalidRequest(e.to_string()).into()),
            );
        let api_scope = web::scope("/api")
            .service(ConfirmPaymentRoute::<SqliteDatabase, StripeGateway, SequenceRpcClient>::new());
        let whitelist = gateway_whitelist.clone();
        let webhook_scope = web::scope("/webhook")
            .wrap_fn(move |req, srv| {
                let whitelisted = whitelist.is_none() || {
                    let peer = get_service_request_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
                    match peer {
                        Some(ip) => info!("📬️ Gateway webhook from {ip}"),
                        None => warn!("📬️ No IP address found in gateway webhook request."),
                    }
                    is_whitelisted(peer, whitelist.as_deref())
                };
                if whitelisted {
                    Either::Left(srv.call(req))
                } else {
                    warn!("📬️ Webhook request from a peer that is not whitelisted. Denying access.");
                    Either::Right(ok(req.error_response(ServerError::ForbiddenPeer)))
                }
            })
            .service(PaymentWebhookRoute::<SqliteDatabase, StripeGateway, SequenceRpcClient>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Gives queued notifications a chance to go out before the process exits.
async fn drain_notifications(handles: Vec<JoinHandle<()>>) {
    let drain = futures::future::join_all(handles);
    if tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, drain).await.is_err() {
        warn!("📧️ Some notifications were still queued at shutdown and have been dropped.");
    }
}
