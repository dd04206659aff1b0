use actix_csp_nonce::{
    csp_middleware, csp_middleware_with_settings, CspConfigBuilder, CspExtensions, CspMiddleware,
    CspPolicy, CspPolicyBuilder, CspSettings, Source,
};
use actix_web::{error, http::StatusCode, test, web, App, HttpRequest, HttpResponse};

fn template() -> CspPolicy {
    CspPolicyBuilder::new()
        .default_src([Source::Self_])
        .style_src([Source::Self_, Source::UnsafeInline])
        .build()
}

/// Echoes the nonce the rendering layer would stamp onto inline elements.
async fn render_nonce(req: HttpRequest) -> HttpResponse {
    let nonce = req.nonce().expect("nonce missing from request extensions");
    assert!(req.scope_id().is_some());
    HttpResponse::Ok().body(nonce)
}

async fn plain() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn boom() -> Result<HttpResponse, actix_web::Error> {
    Err(error::ErrorInternalServerError("downstream failure"))
}

fn style_src_nonce(header: &str) -> Option<String> {
    CspPolicy::parse(header)
        .get_directive("style-src")?
        .sources()
        .iter()
        .find_map(|s| s.nonce().map(str::to_owned))
}

#[actix_web::test]
async fn header_nonce_matches_request_extension_nonce() {
    let app = test::init_service(
        App::new()
            .wrap(csp_middleware(template()))
            .route("/", web::get().to(render_nonce)),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let header = res
        .headers()
        .get("content-security-policy")
        .expect("CSP header missing")
        .to_str()
        .unwrap()
        .to_owned();
    let header_nonce = style_src_nonce(&header).expect("no nonce in style-src");

    let rendered_nonce = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert_eq!(header_nonce, rendered_nonce);
}

#[actix_web::test]
async fn template_is_used_when_handler_sets_no_header() {
    let app = test::init_service(
        App::new()
            .wrap(csp_middleware(template()))
            .route("/", web::get().to(plain)),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let header = res
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap();

    let nonce = style_src_nonce(header).unwrap();
    assert_eq!(
        header,
        format!("default-src 'self'; style-src 'self' 'unsafe-inline' 'nonce-{nonce}'")
    );
}

#[actix_web::test]
async fn handler_set_header_is_rewritten_in_place() {
    async fn handler_with_header() -> HttpResponse {
        HttpResponse::Ok()
            .insert_header((
                "content-security-policy",
                "default-src 'self'; img-src https://cdn.example.com; style-src 'self'",
            ))
            .finish()
    }

    let app = test::init_service(
        App::new()
            .wrap(csp_middleware(template()))
            .route("/", web::get().to(handler_with_header)),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let header = res
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap();

    let nonce = style_src_nonce(header).unwrap();
    // The handler's directives survive untouched; only style-src gains the nonce.
    assert_eq!(
        header,
        format!(
            "default-src 'self'; img-src https://cdn.example.com; style-src 'self' 'nonce-{nonce}'"
        )
    );
}

#[actix_web::test]
async fn exactly_one_csp_header_instance_is_emitted() {
    let app = test::init_service(
        App::new()
            .wrap(csp_middleware(template()))
            .route("/", web::get().to(plain)),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(
        res.headers().get_all("content-security-policy").count(),
        1
    );
}

#[actix_web::test]
async fn nonces_never_repeat_across_requests() {
    let app = test::init_service(
        App::new()
            .wrap(csp_middleware(template()))
            .route("/", web::get().to(plain)),
    )
    .await;

    let mut seen = std::collections::HashSet::new();
    for _ in 0..32 {
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = res
            .headers()
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert!(seen.insert(style_src_nonce(&header).unwrap()));
    }
}

#[actix_web::test]
async fn scope_is_torn_down_after_success() {
    let config = CspConfigBuilder::new().template(template()).build();
    let registry_view = config.clone();

    let app = test::init_service(
        App::new()
            .wrap(CspMiddleware::new(config))
            .route("/", web::get().to(plain)),
    )
    .await;

    test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(registry_view.registry().is_empty());
}

#[actix_web::test]
async fn downstream_failure_emits_no_header_and_clears_the_scope() {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = CspConfigBuilder::new().template(template()).build();
    let registry_view = config.clone();

    let app = test::init_service(
        App::new()
            .wrap(CspMiddleware::new(config))
            .route("/", web::get().to(boom)),
    )
    .await;

    let err = test::try_call_service(&app, test::TestRequest::get().uri("/").to_request())
        .await
        .expect_err("handler error should propagate unchanged");
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert!(registry_view.registry().is_empty());
}

#[actix_web::test]
async fn dropped_in_flight_request_clears_the_scope() {
    use actix_web::dev::Service;

    async fn hang() -> HttpResponse {
        std::future::pending::<()>().await;
        HttpResponse::Ok().finish()
    }

    let config = CspConfigBuilder::new().template(template()).build();
    let registry_view = config.clone();

    let app = test::init_service(
        App::new()
            .wrap(CspMiddleware::new(config))
            .route("/", web::get().to(hang)),
    )
    .await;

    let mut fut = Box::pin(app.call(test::TestRequest::get().uri("/").to_request()));
    // One poll opens the scope and parks in the handler.
    assert!(futures::poll!(fut.as_mut()).is_pending());
    assert_eq!(registry_view.registry().len(), 1);

    // Client disconnect: the in-flight future is dropped before finalize.
    drop(fut);
    assert!(registry_view.registry().is_empty());
}

#[actix_web::test]
async fn handler_supplied_nonce_is_not_double_injected() {
    async fn handler_with_nonce() -> HttpResponse {
        HttpResponse::Ok()
            .insert_header((
                "content-security-policy",
                "style-src 'self' 'nonce-preexisting'",
            ))
            .finish()
    }

    let app = test::init_service(
        App::new()
            .wrap(csp_middleware(template()))
            .route("/", web::get().to(handler_with_nonce)),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let header = res
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap();

    assert_eq!(header, "style-src 'self' 'nonce-preexisting'");
}

#[actix_web::test]
async fn double_wrapping_still_yields_a_single_nonce() {
    let app = test::init_service(
        App::new()
            .wrap(csp_middleware(template()))
            .wrap(csp_middleware(template()))
            .route("/", web::get().to(render_nonce)),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let header = res
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    let nonce_tokens = CspPolicy::parse(&header)
        .get_directive("style-src")
        .unwrap()
        .sources()
        .iter()
        .filter(|s| s.is_nonce())
        .count();
    assert_eq!(nonce_tokens, 1);

    // The handler-visible nonce is the one the header commits to.
    let rendered_nonce = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert_eq!(style_src_nonce(&header).unwrap(), rendered_nonce);
}

#[actix_web::test]
async fn echo_header_carries_the_same_nonce() {
    let config = CspConfigBuilder::new()
        .template(template())
        .nonce_response_header("x-csp-nonce")
        .unwrap()
        .build();

    let app = test::init_service(
        App::new()
            .wrap(CspMiddleware::new(config))
            .route("/", web::get().to(plain)),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let header = res
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    let echoed = res
        .headers()
        .get("x-csp-nonce")
        .expect("echo header missing")
        .to_str()
        .unwrap();

    assert_eq!(style_src_nonce(&header).as_deref(), Some(echoed));
}

#[actix_web::test]
async fn settings_drive_the_full_cycle() {
    let settings: CspSettings = serde_json::from_value(serde_json::json!({
        "directives": {
            "default-src": ["'self'"],
            "style-src": ["'self'"],
            "script-src": ["'self'"]
        },
        "nonce_directives": ["style-src", "script-src"],
        "nonce_length": 24
    }))
    .unwrap();

    let app = test::init_service(
        App::new()
            .wrap(csp_middleware_with_settings(settings).unwrap())
            .route("/", web::get().to(plain)),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let header = res
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    let policy = CspPolicy::parse(&header);
    let style_nonce = style_src_nonce(&header).unwrap();
    let script_nonce = policy
        .get_directive("script-src")
        .unwrap()
        .sources()
        .iter()
        .find_map(Source::nonce)
        .unwrap();

    // One nonce per request, shared by every nonce-bearing directive.
    assert_eq!(style_nonce, script_nonce);
    // 24 random bytes encode to 32 characters.
    assert_eq!(style_nonce.len(), 32);
    assert!(policy.get_directive("default-src").is_some());
}
