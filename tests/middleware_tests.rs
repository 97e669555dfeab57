// SPDX-License-Identifier: Apache-2.0
use actix_web::{App, HttpResponse, test, web};

use mailgate::middleware::ApiKeyGuard;

#[actix_web::test]
async fn test_guard_requires_bearer_key_on_send() {
    let app = test::init_service(
        App::new()
            .wrap(ApiKeyGuard::with_key("sekrit"))
            .service(
                web::resource("/send")
                    .route(web::post().to(|| async { HttpResponse::Ok().finish() })),
            )
            .service(
                web::resource("/health")
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
    )
    .await;

    // No credentials
    let req = test::TestRequest::post().uri("/send").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 401);

    // Wrong key
    let req = test::TestRequest::post()
        .uri("/send")
        .insert_header(("Authorization", "Bearer wrong"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status().as_u16(), 401);

    // Correct key
    let req = test::TestRequest::post()
        .uri("/send")
        .insert_header(("Authorization", "Bearer sekrit"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());

    // Health stays public
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
}

#[actix_web::test]
async fn test_guard_without_key_passes_everything() {
    let app = test::init_service(App::new().wrap(ApiKeyGuard::disabled()).service(
        web::resource("/send").route(web::post().to(|| async { HttpResponse::Ok().finish() })),
    ))
    .await;

    let req = test::TestRequest::post().uri("/send").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
}
