//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};

use crate::domain::ports::{
    MockClientPortal, MockInterventionScheduling, MockLoginService, MockMessaging,
    MockTicketLifecycle, MockTravauxLifecycle,
};
use crate::domain::{Caller, Error, ROLE_ADMIN, ROLE_AGENT, ROLE_CLIENT};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Path of the helper route that plants a caller in the session.
pub const SEED_SESSION_PATH: &str = "/__test/session";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// One mock per driving port, converted into [`HttpState`] once the test
/// has set its expectations.
#[derive(Default)]
pub struct TestMocks {
    pub login: MockLoginService,
    pub clients: MockClientPortal,
    pub tickets: MockTicketLifecycle,
    pub travaux: MockTravauxLifecycle,
    pub interventions: MockInterventionScheduling,
    pub messaging: MockMessaging,
}

impl TestMocks {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            login: Arc::new(self.login),
            clients: Arc::new(self.clients),
            tickets: Arc::new(self.tickets),
            travaux: Arc::new(self.travaux),
            interventions: Arc::new(self.interventions),
            messaging: Arc::new(self.messaging),
        })
    }
}

async fn seed_session(
    session: SessionContext,
    caller: web::Json<Caller>,
) -> Result<HttpResponse, Error> {
    session.persist_caller(&caller)?;
    Ok(HttpResponse::Ok().finish())
}

/// Register the session seeding route on a test app.
pub fn seed_route(cfg: &mut web::ServiceConfig) {
    cfg.route(SEED_SESSION_PATH, web::post().to(seed_session));
}

pub fn admin() -> Caller {
    Caller::new(1, "admin@example.com", vec![ROLE_ADMIN.to_owned()]).with_matricule("A001")
}

pub fn agent() -> Caller {
    Caller::new(2, "agent@example.com", vec![ROLE_AGENT.to_owned()]).with_matricule("M042")
}

pub fn client_user() -> Caller {
    Caller::new(3, "client@example.com", vec![ROLE_CLIENT.to_owned()])
}

/// Log `caller` in through [`SEED_SESSION_PATH`] and return the cookie.
pub async fn session_cookie<S>(app: &S, caller: &Caller) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri(SEED_SESSION_PATH)
            .set_json(caller)
            .to_request(),
    )
    .await;
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Build a test app with session middleware, the seeding route and the full
/// route table bound to `mocks`.
macro_rules! test_app {
    ($mocks:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($mocks.into_state())
                .wrap($crate::inbound::http::test_utils::test_session_middleware())
                .configure($crate::inbound::http::test_utils::seed_route)
                .configure($crate::inbound::http::routes::configure),
        )
    };
}

pub(crate) use test_app;
