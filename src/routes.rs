use crate::{
    api::{attendance, dashboard, employee, holiday, leave, salary_slip, settings},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    storage,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Stored selfies and documents are public-read
    cfg.service(
        web::resource("/files/{bucket}/{key:.*}").route(web::get().to(storage::serve_file)),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/session").route(web::get().to(handlers::session)))
            .service(web::resource("/dashboard/stats").route(web::get().to(dashboard::stats)))
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/team (before /{id})
                    .service(web::resource("/team").route(web::get().to(employee::my_team)))
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee)),
                    )
                    // /employee/{id}/leave-balance
                    .service(
                        web::resource("/{id}/leave-balance")
                            .route(web::get().to(employee::employee_leave_balance)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("").route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/sign-in").route(web::post().to(attendance::sign_in)),
                    )
                    .service(
                        web::resource("/sign-out").route(web::put().to(attendance::sign_out)),
                    )
                    .service(web::resource("/me").route(web::get().to(attendance::my_attendance)))
                    .service(
                        web::resource("/export")
                            .route(web::get().to(attendance::export_attendance)),
                    )
                    // /attendance/mark-present/{employee_id}
                    .service(
                        web::resource("/mark-present/{employee_id}")
                            .route(web::post().to(attendance::mark_present)),
                    )
                    // /attendance/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(attendance::approve_attendance)),
                    )
                    // /attendance/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(attendance::reject_attendance)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::apply_leave)),
                    )
                    .service(web::resource("/me").route(web::get().to(leave::my_leaves)))
                    .service(web::resource("/balance").route(web::get().to(leave::my_balance)))
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    ),
            )
            .service(
                web::scope("/holidays")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::list_holidays))
                            .route(web::post().to(holiday::create_holiday)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(holiday::delete_holiday)),
                    ),
            )
            .service(
                web::scope("/salary-slip")
                    .service(
                        web::resource("").route(web::post().to(salary_slip::generate_salary_slip)),
                    )
                    .service(
                        web::resource("/{employee_id}/{month}/print")
                            .route(web::get().to(salary_slip::print_salary_slip)),
                    ),
            )
            .service(
                web::scope("/settings")
                    .service(web::resource("").route(web::get().to(settings::list_settings)))
                    .service(
                        web::resource("/{key}").route(web::put().to(settings::update_setting)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + rotated refresh_token
