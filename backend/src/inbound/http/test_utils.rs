//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, Error, test};
use chrono::{DateTime, TimeZone, Utc};
use mockable::MockClock;
use serde_json::Value;

use crate::domain::{PostService, UserService};
use crate::inbound::http::{HttpState, configure_api};
use crate::outbound::memory::{MemoryPostRepository, MemoryStorage, MemoryUserRepository};

/// Fixed instant returned by the test clock.
pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// HTTP state over fresh in-memory storage and a frozen clock.
pub fn memory_state(
    storage: &MemoryStorage,
) -> HttpState<MemoryStorage, MemoryUserRepository, MemoryPostRepository> {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(fixture_timestamp());
    HttpState::new(
        Arc::new(storage.clone()),
        UserService::new(Arc::new(MemoryUserRepository)),
        PostService::new(Arc::new(MemoryPostRepository), Arc::new(clock)),
    )
}

/// API app over `storage`, ready for `test::init_service`.
pub fn api_app(
    storage: &MemoryStorage,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = Error,
        InitError = (),
    > + use<>,
> {
    App::new().configure(configure_api(memory_state(storage)))
}

/// Read a response body as JSON.
pub async fn json_body<B: MessageBody>(res: ServiceResponse<B>) -> Value {
    let bytes = test::read_body(res).await;
    serde_json::from_slice(&bytes).expect("JSON response body")
}
