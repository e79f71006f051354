//! Request-scoped unit-of-work middleware.
//!
//! [`UnitOfWorkScope`] opens exactly one transaction per request before any
//! handler runs and attaches it to the request extensions as a
//! [`RequestUnitOfWork`]. Once the inner service has produced a response it:
//!
//! 1. rolls back if the request failed (an `Err` from the inner service or a
//!    response carrying an error), then
//! 2. closes the unit of work, always, even when a commit already happened.
//!
//! If the request future is dropped early the last handle drops the
//! [`UnitOfWork`], which releases the connection. Failing to begin is fatal to
//! the request and surfaces as an unmapped 500.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};

use crate::domain::ports::{Storage, StorageError, Transaction};
use crate::domain::{ServiceError, UnitOfWork};

/// Handle to the request's [`UnitOfWork`], extracted by handlers.
///
/// # Examples
/// ```ignore
/// async fn handler(uow: RequestUnitOfWork<DieselTransaction>) -> ApiResult<HttpResponse> {
///     let mut uow = uow.lock().await;
///     let mut session = uow.session()?;
///     // hand `&mut session` to a service
/// }
/// ```
pub struct RequestUnitOfWork<T: Transaction> {
    inner: Arc<Mutex<UnitOfWork<T>>>,
}

impl<T: Transaction> Clone for RequestUnitOfWork<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transaction> RequestUnitOfWork<T> {
    fn new(uow: UnitOfWork<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(uow)),
        }
    }

    /// Exclusive access for the duration of a service call.
    pub async fn lock(&self) -> MutexGuard<'_, UnitOfWork<T>> {
        self.inner.lock().await
    }

    async fn finish(&self, failed: bool) {
        let mut uow = self.inner.lock().await;
        if failed {
            if let Err(err) = uow.rollback().await {
                warn!(error = %err, "unit of work rollback failed");
            }
        }
        if let Err(err) = uow.close().await {
            warn!(error = %err, "unit of work close failed");
        }
    }
}

impl<T: Transaction> FromRequest for RequestUnitOfWork<T> {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let handle = req.extensions().get::<Self>().cloned();
        ready(handle.ok_or_else(|| {
            error!(path = req.path(), "no unit of work attached to request");
            ServiceError::from(StorageError::connection("unit of work middleware missing")).into()
        }))
    }
}

/// Middleware factory opening one unit of work per request on `S`.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use actix_web::{App, web};
/// use backend::middleware::UnitOfWorkScope;
/// use backend::outbound::memory::MemoryStorage;
///
/// let storage = Arc::new(MemoryStorage::new());
/// let _app = App::new().service(web::scope("/users").wrap(UnitOfWorkScope::new(storage)));
/// ```
pub struct UnitOfWorkScope<S> {
    storage: Arc<S>,
}

impl<S> UnitOfWorkScope<S> {
    /// Scope requests to transactions begun on `storage`.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

impl<S> Clone for UnitOfWorkScope<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<Svc, B, S> Transform<Svc, ServiceRequest> for UnitOfWorkScope<S>
where
    Svc: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    Svc::Future: 'static,
    B: 'static,
    S: Storage,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = UnitOfWorkMiddleware<Svc, S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: Svc) -> Self::Future {
        ready(Ok(UnitOfWorkMiddleware {
            service: Rc::new(service),
            storage: Arc::clone(&self.storage),
        }))
    }
}

/// Service wrapper produced by [`UnitOfWorkScope`].
pub struct UnitOfWorkMiddleware<Svc, S> {
    service: Rc<Svc>,
    storage: Arc<S>,
}

impl<Svc, B, S> Service<ServiceRequest> for UnitOfWorkMiddleware<Svc, S>
where
    Svc: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    Svc::Future: 'static,
    B: 'static,
    S: Storage,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let storage = Arc::clone(&self.storage);

        Box::pin(async move {
            let tx = match storage.begin().await {
                Ok(tx) => tx,
                Err(err) => {
                    error!(error = %err, "failed to open unit of work");
                    return Ok(req
                        .error_response(ServiceError::from(err))
                        .map_into_right_body());
                }
            };
            debug!("unit of work opened");

            let handle = RequestUnitOfWork::new(UnitOfWork::new(tx));
            req.extensions_mut().insert(handle.clone());

            let result = service.call(req).await;
            let failed = match &result {
                Ok(res) => {
                    res.request()
                        .extensions_mut()
                        .remove::<RequestUnitOfWork<S::Tx>>();
                    res.response().error().is_some()
                }
                Err(_) => true,
            };

            handle.finish(failed).await;
            result.map(ServiceResponse::map_into_left_body)
        })
    }
}

#[cfg(test)]
#[path = "unit_of_work_tests.rs"]
mod tests;
