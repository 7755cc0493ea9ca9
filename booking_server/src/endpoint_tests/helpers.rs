use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use booking_engine::{
    db_types::{NewTenant, TenantId},
    events::EventProducers,
    test_utils::prepare_env::{new_test_database, seed_tenants, tenant_t1},
    PaymentGateway,
    PollSchedule,
    ReconciliationApi,
    RemoteSequence,
    SqliteDatabase,
};
use log::debug;
use serde_json::json;
use stripe_tools::webhook::{signature_header, SIGNATURE_HEADER};

use crate::{
    config::ServerOptions,
    errors::ServerError,
    routes::{health, ConfirmPaymentRoute},
    webhook_routes::PaymentWebhookRoute,
};

pub const T1_SECRET: &str = "whsec_t1";

/// A fresh database with two tenants. `T1` signs its webhooks, `T2` does not.
pub async fn test_database() -> SqliteDatabase {
    let _ = env_logger::try_init().ok();
    let db = new_test_database(5).await;
    let t2 = NewTenant::new(TenantId::from("T2"), "Reef Divers Ltd");
    seed_tenants(&db, vec![tenant_t1().with_webhook_secret(T1_SECRET), t2]).await;
    db
}

pub fn options(confirm_schedule: PollSchedule) -> ServerOptions {
    ServerOptions { confirm_schedule, ..Default::default() }
}

pub fn immediate() -> ServerOptions {
    options(PollSchedule::immediate())
}

pub type TestApi<G, R> = web::Data<ReconciliationApi<SqliteDatabase, G, R>>;

pub fn test_api<G, R>(db: SqliteDatabase, gateway: G, sequence: R) -> TestApi<G, R> {
    web::Data::new(ReconciliationApi::new(db, gateway, sequence, EventProducers::default()))
}

/// Sends a POST request with `body` to a test instance of the server and returns the status and body of the response.
pub async fn post<G, R>(api: TestApi<G, R>, options: ServerOptions, path: &str, body: &str) -> (StatusCode, String)
where
    G: PaymentGateway + 'static,
    R: RemoteSequence + 'static,
{
    post_with_headers(api, options, path, body, &[]).await
}

pub async fn post_with_headers<G, R>(
    api: TestApi<G, R>,
    options: ServerOptions,
    path: &str,
    body: &str,
    headers: &[(&str, String)],
) -> (StatusCode, String)
where
    G: PaymentGateway + 'static,
    R: RemoteSequence + 'static,
{
    let app = App::new()
        .app_data(api)
        .app_data(web::Data::new(options))
        .app_data(
            web::JsonConfig::default().error_handler(|e, _req| ServerError::InvalidRequest(e.to_string()).into()),
        )
        .service(web::scope("/api").service(ConfirmPaymentRoute::<SqliteDatabase, G, R>::new()))
        .service(web::scope("/webhook").service(PaymentWebhookRoute::<SqliteDatabase, G, R>::new()))
        .service(health);
    let service = test::init_service(app).await;
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    for (name, value) in headers {
        req = req.insert_header((*name, value.as_str()));
    }
    let req = req.set_payload(body.to_string()).to_request();
    debug!("Making request to {path}");
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn confirm_body(reference: &str, tenant: &str) -> String {
    json!({ "payment_reference": reference, "tenant_id": tenant }).to_string()
}

pub fn payment_event(event_type: &str, reference: &str, tenant: &str) -> String {
    json!({
        "id": format!("evt_{reference}"),
        "type": event_type,
        "created": 1_719_820_800,
        "data": { "object": { "id": reference, "object": "payment_intent", "metadata": { "tenant_id": tenant } } }
    })
    .to_string()
}

/// The signature header for `body`, signed with `secret` just now.
pub fn signed(body: &str, secret: &str) -> Vec<(&'static str, String)> {
    let now = chrono::Utc::now().timestamp();
    let header = signature_header(body.as_bytes(), now, secret).unwrap();
    vec![(SIGNATURE_HEADER, header)]
}
