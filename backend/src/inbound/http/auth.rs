//! Session endpoints.
//!
//! ```text
//! POST /api/login {"email":"chef@example.com","password":"secret"}
//! POST /api/logout
//! GET /api/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Caller, Error, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyEmail => Error::invalid_request("email must not be empty")
            .with_details(json!({ "field": "email", "code": "empty_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate and store the caller identity in the session cookie.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = Caller, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<Caller>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let caller = state.login.authenticate(&credentials).await?;
    session.persist_caller(&caller)?;
    Ok(web::Json(caller))
}

/// Forget the caller and expire the cookie.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 204, description = "Session purged")),
    tags = ["session"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Current caller.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current caller", body = Caller),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["session"],
    operation_id = "me"
)]
#[get("/me")]
pub async fn me(session: SessionContext) -> ApiResult<web::Json<Caller>> {
    Ok(web::Json(session.require_caller()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::inbound::http::test_utils::{TestMocks, agent, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::Value;

    fn login_request(email: &str, password: &str) -> actix_http::Request {
        actix_test::TestRequest::post()
            .uri("/api/login")
            .set_json(&LoginRequest {
                email: email.into(),
                password: password.into(),
            })
            .to_request()
    }

    #[rstest]
    #[case("   ", "secret", "email", "empty_email")]
    #[case("chef@example.com", "", "password", "empty_password")]
    #[actix_web::test]
    async fn login_rejects_blank_fields(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let app = test_app!(TestMocks::default()).await;
        let res = actix_test::call_service(&app, login_request(email, password)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }

    #[actix_web::test]
    async fn login_then_me_returns_caller() {
        let mut mocks = TestMocks::default();
        mocks
            .login
            .expect_authenticate()
            .withf(|creds| creds.email() == "agent@example.com")
            .times(1)
            .returning(|_| Ok(agent()));
        let app = test_app!(mocks).await;

        let res = actix_test::call_service(&app, login_request("agent@example.com", "pw")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        let me_res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(me_res.status(), StatusCode::OK);
        let caller: Caller = actix_test::read_body_json(me_res).await;
        assert_eq!(caller, agent());
    }

    #[actix_web::test]
    async fn bad_credentials_are_unauthorised() {
        let mut mocks = TestMocks::default();
        mocks
            .login
            .expect_authenticate()
            .returning(|_| Err(Error::unauthorized("invalid credentials")));
        let app = test_app!(mocks).await;

        let res = actix_test::call_service(&app, login_request("x@example.com", "nope")).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Error = actix_test::read_body_json(res).await;
        assert_eq!(body.code(), ErrorCode::Unauthorized);
    }

    #[actix_web::test]
    async fn me_without_session_is_unauthorised() {
        let app = test_app!(TestMocks::default()).await;
        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/me").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_returns_no_content() {
        let app = test_app!(TestMocks::default()).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri("/api/logout").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}
