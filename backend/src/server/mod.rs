//! Server construction and middleware wiring.
//!
//! Stages run in this order for every request: [`Trace`], [`Authenticate`],
//! then the unit-of-work scope mounted on the `/users` and `/posts` scopes.
//! Health probes skip the unit of work.

mod config;
mod settings;

pub use config::{ServerConfig, StorageBackend};
pub use settings::{AppSettings, JwtSettings, PostgresSettings, SettingsError};

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::info;

use backend::Trace;
use backend::domain::ports::{PostRepository, Storage, UserRepository};
use backend::domain::{PostService, UserService};
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::{HttpState, configure_api};
use backend::middleware::{Authenticate, JwtConfig};
use backend::outbound::memory::{MemoryPostRepository, MemoryUserRepository};
use backend::outbound::persistence::{DieselPostRepository, DieselStorage, DieselUserRepository};

struct AppDependencies<S, U, P> {
    health_state: web::Data<HealthState>,
    http_state: HttpState<S, U, P>,
    jwt: JwtConfig,
}

impl<S, U, P> Clone for AppDependencies<S, U, P> {
    fn clone(&self) -> Self {
        Self {
            health_state: self.health_state.clone(),
            http_state: self.http_state.clone(),
            jwt: self.jwt.clone(),
        }
    }
}

fn build_app<S, U, P>(
    deps: AppDependencies<S, U, P>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    S: Storage,
    U: UserRepository<Tx = S::Tx>,
    P: PostRepository<Tx = S::Tx>,
{
    let AppDependencies {
        health_state,
        http_state,
        jwt,
    } = deps;

    App::new()
        .app_data(health_state)
        .configure(configure_api(http_state))
        .service(ready)
        .service(live)
        .wrap(Authenticate::new(jwt))
        .wrap(Trace)
}

fn services<U, P>(users: U, posts: P) -> (UserService<U>, PostService<P>) {
    (
        UserService::new(Arc::new(users)),
        PostService::new(Arc::new(posts), Arc::new(DefaultClock)),
    )
}

fn spawn<S, U, P>(
    health_state: web::Data<HealthState>,
    http_state: HttpState<S, U, P>,
    jwt: JwtConfig,
    bind_addr: std::net::SocketAddr,
) -> std::io::Result<Server>
where
    S: Storage,
    U: UserRepository<Tx = S::Tx>,
    P: PostRepository<Tx = S::Tx>,
{
    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state,
        jwt,
    };
    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();

    health_state.mark_ready();
    info!(%bind_addr, "server listening");
    Ok(server)
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        jwt,
        backend,
    } = config;

    match backend {
        StorageBackend::Postgres(pool) => {
            let (users, posts) = services(DieselUserRepository, DieselPostRepository);
            let state = HttpState::new(Arc::new(DieselStorage::new(pool)), users, posts);
            spawn(health_state, state, jwt, bind_addr)
        }
        StorageBackend::InMemory(storage) => {
            let (users, posts) = services(MemoryUserRepository, MemoryPostRepository);
            let state = HttpState::new(Arc::new(storage), users, posts);
            spawn(health_state, state, jwt, bind_addr)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Wiring tests for the assembled application.

    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use backend::outbound::memory::MemoryStorage;
    use rstest::rstest;

    fn deps(
        storage: &MemoryStorage,
    ) -> AppDependencies<MemoryStorage, MemoryUserRepository, MemoryPostRepository> {
        let (users, posts) = services(MemoryUserRepository, MemoryPostRepository);
        AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            http_state: HttpState::new(Arc::new(storage.clone()), users, posts),
            jwt: JwtConfig {
                secret: "test-secret".to_owned(),
                algorithm: "HS256".to_owned(),
                expire_minutes: 60,
            },
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn api_requests_carry_a_trace_id_and_one_unit_of_work() {
        let storage = MemoryStorage::new();
        let app = actix_test::init_service(build_app(deps(&storage))).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/users/1").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().contains_key("trace-id"));
        let stats = storage.stats();
        assert_eq!((stats.begins, stats.closes), (1, 1));
    }

    #[rstest]
    #[actix_web::test]
    async fn health_probes_do_not_open_transactions() {
        let storage = MemoryStorage::new();
        let deps = deps(&storage);
        deps.health_state.mark_ready();
        let app = actix_test::init_service(build_app(deps)).await;

        for uri in ["/health/ready", "/health/live"] {
            let res =
                actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                    .await;
            assert_eq!(res.status(), StatusCode::OK, "{uri}");
        }
        assert_eq!(storage.stats().begins, 0);
    }

    #[rstest]
    fn default_backend_is_in_memory() {
        let config = ServerConfig::new(
            "127.0.0.1:0".parse().expect("literal address"),
            deps(&MemoryStorage::new()).jwt,
        );

        assert!(matches!(config.backend, StorageBackend::InMemory(_)));
        assert_eq!(config.bind_addr().port(), 0);
    }
}
