//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations such as persisting or requiring a [`Caller`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Caller, Error};

pub(crate) const CALLER_KEY: &str = "caller";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated caller in the session cookie.
    pub fn persist_caller(&self, caller: &Caller) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(CALLER_KEY, caller)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current caller from the session, if present.
    ///
    /// A cookie that no longer deserialises into a [`Caller`] counts as
    /// anonymous.
    pub fn caller(&self) -> Result<Option<Caller>, Error> {
        match self.0.get::<Caller>(CALLER_KEY) {
            Ok(caller) => Ok(caller),
            Err(error) => {
                tracing::warn!("invalid caller in session cookie: {error}");
                Ok(None)
            }
        }
    }

    /// Require an authenticated caller or return `401 Unauthorized`.
    pub fn require_caller(&self) -> Result<Caller, Error> {
        self.caller()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Require an administrator: `401` without a session, `403` otherwise.
    pub fn require_admin(&self) -> Result<Caller, Error> {
        let caller = self.require_caller()?;
        if caller.is_admin() {
            Ok(caller)
        } else {
            Err(Error::forbidden("administrator role required"))
        }
    }

    /// Drop every session entry and expire the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ROLE_ADMIN, ROLE_CLIENT};
    use actix_session::Session;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .route(
                "/login/{role}",
                web::get().to(|session: SessionContext, role: web::Path<String>| async move {
                    let caller = Caller::new(9, "agent@example.com", vec![role.into_inner()])
                        .with_matricule("M009");
                    session.persist_caller(&caller)?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
            .route(
                "/me",
                web::get().to(|session: SessionContext| async move {
                    let caller = session.require_caller()?;
                    Ok::<_, Error>(HttpResponse::Ok().json(caller))
                }),
            )
            .route(
                "/admin",
                web::get().to(|session: SessionContext| async move {
                    session.require_admin()?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
    }

    async fn login_cookie<S>(app: &S, role: &str) -> actix_web::cookie::Cookie<'static>
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let res = test::call_service(
            app,
            test::TestRequest::get()
                .uri(&format!("/login/{role}"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned()
    }

    #[actix_web::test]
    async fn round_trips_caller() {
        let app = test::init_service(session_test_app()).await;
        let cookie = login_cookie(&app, ROLE_CLIENT).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/me").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let caller: Caller = test::read_body_json(res).await;
        assert_eq!(caller.user_id, 9);
        assert_eq!(caller.matricule.as_deref(), Some("M009"));
    }

    #[rstest]
    #[case(ROLE_ADMIN, StatusCode::OK)]
    #[case(ROLE_CLIENT, StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn admin_guard_checks_role(#[case] role: &str, #[case] expected: StatusCode) {
        let app = test::init_service(session_test_app()).await;
        let cookie = login_cookie(&app, role).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/admin")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }

    #[rstest]
    #[case("/me")]
    #[case("/admin")]
    #[actix_web::test]
    async fn missing_caller_is_unauthorised(#[case] uri: &str) {
        let app = test::init_service(session_test_app()).await;
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_caller_is_unauthorised() {
        let app = test::init_service(session_test_app().route(
            "/set-invalid",
            web::get().to(|session: Session| async move {
                session
                    .insert(CALLER_KEY, "not-a-caller")
                    .expect("set invalid caller");
                HttpResponse::Ok()
            }),
        ))
        .await;

        let set_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/set-invalid").to_request(),
        )
        .await;
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set")
            .into_owned();

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/me").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
