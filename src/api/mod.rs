// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AuthErrorResponse, NonceResponse, SessionStatusResponse, SigninRequest, SignoutResponse,
    },
    signin::{
        error::{SigninErrorBody, SigninSuccessBody},
        ResolvedUser, SessionError,
    },
    state::AppState,
};

pub mod health;
pub mod session;
pub mod siwe;

pub fn router(state: AppState) -> Router {
    let siwe_routes = Router::new()
        .route("/nonce", get(siwe::nonce))
        .route("/signin", post(siwe::signin))
        .route("/signin/callback", post(siwe::signin_callback))
        .route("/auth/error", get(siwe::auth_error))
        .route("/session", get(siwe::session_status))
        .route("/signout", post(siwe::signout))
        .route("/me", get(siwe::me));

    let health_routes = Router::new()
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness));

    Router::new()
        .nest("/siwe", siwe_routes)
        .nest("/health", health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        siwe::nonce,
        siwe::signin,
        siwe::signin_callback,
        siwe::auth_error,
        siwe::session_status,
        siwe::signout,
        siwe::me,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            NonceResponse,
            SigninRequest,
            SigninSuccessBody,
            SigninErrorBody,
            SessionStatusResponse,
            AuthErrorResponse,
            SignoutResponse,
            ResolvedUser,
            SessionError,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "SiwE", description = "Sign-in with Ethereum"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::U256;
    use alloy::signers::local::PrivateKeySigner;
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
            Request, StatusCode,
        },
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::signin::testing::{
        build_message, sign, test_signer, FakeChain, FakeWhitelist, MessageSpec,
    };
    use crate::signin::{
        CheckPolicy, ContractQuery, InMemorySessionStore, SessionIdentityResolver, SigninService,
    };
    use crate::state::HttpSettings;

    fn app(listed: bool) -> Router {
        let policy = CheckPolicy {
            chain: Arc::new(FakeChain::new(1, 0)),
            require_network_match: true,
            whitelist: Some(Arc::new(FakeWhitelist::new(listed)) as Arc<dyn ContractQuery>),
            minimum_balance: U256::ZERO,
        };
        let signin = SigninService::with_policy(
            Arc::new(InMemorySessionStore::default()),
            &policy,
            SessionIdentityResolver::default(),
            None,
        );
        router(AppState::new(
            signin,
            HttpSettings {
                session_cookie_name: "connect.sid".to_string(),
                success_redirect: "/".to_string(),
                error_redirect: "/siwe/auth/error".to_string(),
            },
        ))
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, format!("connect.sid={cookie}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, format!("connect.sid={cookie}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Request a nonce and return `(session id, nonce)`.
    async fn start(app: &Router) -> (String, String) {
        let response = app.clone().oneshot(get("/siwe/nonce", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        let session_id = cookie
            .strip_prefix("connect.sid=")
            .and_then(|rest| rest.split(';').next())
            .unwrap()
            .to_string();
        let nonce = json_body(response).await["nonce"]
            .as_str()
            .unwrap()
            .to_string();
        (session_id, nonce)
    }

    fn signed_body(signer: &PrivateKeySigner, nonce: &str) -> Value {
        let message = build_message(&MessageSpec::for_signer(signer, 1, nonce));
        let signature = sign(signer, &message);
        json!({ "message": message, "signature": signature })
    }

    #[tokio::test]
    async fn nonce_reuses_existing_session_cookie() {
        let app = app(true);
        let response = app
            .oneshot(get("/siwe/nonce", Some("existing-session")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn json_signin_flow() {
        let app = app(true);
        let signer = test_signer(0x42);
        let (sid, nonce) = start(&app).await;

        let response = app
            .clone()
            .oneshot(post_json("/siwe/signin", Some(&sid), signed_body(&signer, &nonce)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let expected_id = format!("1:{}", signer.address().to_checksum(None));
        assert_eq!(json_body(response).await["user"]["id"], expected_id);

        let response = app.clone().oneshot(get("/siwe/me", Some(&sid))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["id"], expected_id);

        let response = app
            .clone()
            .oneshot(post_json("/siwe/signout", Some(&sid), json!({})))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["signed_out"], true);

        let response = app.oneshot(get("/siwe/me", Some(&sid))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn whitelist_denial_is_403_and_recorded() {
        let app = app(false);
        let signer = test_signer(0x42);
        let (sid, nonce) = start(&app).await;

        let response = app
            .clone()
            .oneshot(post_json("/siwe/signin", Some(&sid), signed_body(&signer, &nonce)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["check"], "whitelist");
        assert_eq!(body["error_code"], "access_denied");

        let response = app.oneshot(get("/siwe/session", Some(&sid))).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["authenticated"], false);
        assert_eq!(body["error"]["check"], "whitelist");
    }

    #[tokio::test]
    async fn signin_without_session_is_412() {
        let app = app(true);
        let signer = test_signer(0x42);

        let response = app
            .oneshot(post_json("/siwe/signin", None, signed_body(&signer, "abcdefgh12")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn forged_signature_is_401() {
        let app = app(true);
        let (sid, nonce) = start(&app).await;

        let mut body = signed_body(&test_signer(0x42), &nonce);
        let forged = sign(&test_signer(0x07), body["message"].as_str().unwrap());
        body["signature"] = json!(forged);

        let response = app
            .oneshot(post_json("/siwe/signin", Some(&sid), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn form_callback_redirects_denial_to_error_page() {
        let app = app(false);
        let signer = test_signer(0x42);
        let (sid, nonce) = start(&app).await;

        let message = build_message(&MessageSpec::for_signer(&signer, 1, &nonce));
        let signature = sign(&signer, &message);
        let form: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("message", &message)
            .append_pair("signature", &signature)
            .finish();

        let request = Request::post("/siwe/signin/callback")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(COOKIE, format!("connect.sid={sid}"))
            .body(Body::from(form))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[LOCATION],
            "/siwe/auth/error?error=AccessDenied"
        );

        let response = app
            .oneshot(get("/siwe/auth/error?error=AccessDenied", Some(&sid)))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["kind"], "AccessDenied");
        assert_eq!(body["error"]["check"], "whitelist");
    }

    #[tokio::test]
    async fn health_probes() {
        let app = app(true);

        let response = app.clone().oneshot(get("/health/live", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/health/ready", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["checks"]["session_store"], "ok");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = app(true)
            .oneshot(get("/health/live", None))
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
