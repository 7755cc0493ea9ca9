//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module (see [`crate::webhook_routes`]). Keep this
//! module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. The confirmation endpoint's bounded wait is a `tokio` sleep for exactly this
//! reason.
use actix_web::{get, web, HttpResponse, Responder};
use booking_engine::{BookingDatabase, PaymentGateway, ReconciliationApi, RemoteSequence};
use log::*;

use crate::{
    config::ServerOptions,
    data_objects::{ConfirmPaymentRequest, ConfirmPaymentResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Confirm payment  ----------------------------------------------------
route!(confirm_payment => Post "/confirm-payment" impl BookingDatabase, PaymentGateway, RemoteSequence);
/// Route handler for the payment confirmation endpoint
///
/// The payer's browser calls this after returning from checkout, with the payment reference and the tenant the booking
/// was made with. The claim is not trusted: the payment is verified with the gateway before anything is created.
///
/// The handler first waits briefly for the gateway's webhook to create the reservation (see
/// [`booking_engine::PollSchedule`]), then reconciles the payment itself.
///
/// Responses:
/// * `200` with the reservation number and whether this call `created` the reservation or found it `existing`.
/// * `202 payment_pending` if the payment has not completed yet. The client may ask again.
/// * `400 invalid_request`, `403 payment_rejected` or `404 payment_not_found` for requests that will never succeed.
/// * `503 processing` for temporary failures. The client may ask again.
pub async fn confirm_payment<B, G, R>(
    body: web::Json<ConfirmPaymentRequest>,
    api: web::Data<ReconciliationApi<B, G, R>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingDatabase,
    G: PaymentGateway,
    R: RemoteSequence,
{
    let ConfirmPaymentRequest { payment_reference, tenant_id } = body.into_inner();
    if payment_reference.as_str().trim().is_empty() || tenant_id.as_str().trim().is_empty() {
        debug!("💻️ Confirmation request without a payment reference or tenant");
        return Err(ServerError::InvalidRequest("payment_reference and tenant_id are required".into()));
    }
    debug!("💻️ POST confirm payment {payment_reference} for tenant {tenant_id}");
    let outcome = api.confirm_payment(&payment_reference, &tenant_id, &options.confirm_schedule).await.map_err(|e| {
        info!("💻️ Could not confirm payment {payment_reference} for tenant {tenant_id}. {e}");
        ServerError::from(e)
    })?;
    info!(
        "💻️ Payment {payment_reference} confirmed as reservation {} ({})",
        outcome.reservation.reservation_number, outcome.created_by
    );
    Ok(HttpResponse::Ok().json(ConfirmPaymentResponse::from(outcome)))
}
