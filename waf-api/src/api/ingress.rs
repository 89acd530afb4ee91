//! The evaluation entrypoint: runs one inbound request through the
//! pipeline orchestrator (C7) and renders its [`Decision`] back out as an
//! HTTP response (spec.md §4.7, §6 "Incoming request").

use actix_web::{post, web, HttpResponse};
use waf_core::field::RawRequest;
use waf_core::pipeline::Decision;

use crate::state::AppState;

#[post("/ingress/evaluate")]
pub async fn evaluate(state: web::Data<AppState>, request: web::Json<RawRequest>) -> HttpResponse {
    let decision = state.pipeline.handle(&request.into_inner()).await;
    render(decision)
}

fn render(decision: Decision) -> HttpResponse {
    match decision {
        Decision::Block {
            rule_id,
            http_code,
            content_type,
            body,
        } => {
            let status = actix_web::http::StatusCode::from_u16(http_code)
                .unwrap_or(actix_web::http::StatusCode::FORBIDDEN);
            HttpResponse::build(status)
                .insert_header(("X-Waf-Action", "BLOCK"))
                .insert_header(("X-Waf-Matched-Rule", rule_id))
                .content_type(content_type)
                .body(body)
        }
        Decision::Challenge { rule_id } => HttpResponse::Forbidden()
            .insert_header(("X-Waf-Action", "CHALLENGE"))
            .insert_header(("X-Waf-Matched-Rule", rule_id))
            .finish(),
        Decision::Forwarded { matched_rule_id, response } => {
            let status = actix_web::http::StatusCode::from_u16(response.status)
                .unwrap_or(actix_web::http::StatusCode::OK);
            let mut builder = HttpResponse::build(status);
            builder.insert_header(("X-Waf-Action", "ALLOW"));
            if let Some(rule_id) = matched_rule_id {
                builder.insert_header(("X-Waf-Matched-Rule", rule_id));
            }
            for (name, value) in &response.headers {
                builder.insert_header((name.as_str(), value.as_str()));
            }
            builder.body(response.body)
        }
        Decision::OriginMisconfig { matched_rule_id, detail } => {
            let mut builder = HttpResponse::InternalServerError();
            builder.insert_header(("X-Waf-Action", "ORIGIN_MISCONFIG"));
            if let Some(rule_id) = matched_rule_id {
                builder.insert_header(("X-Waf-Matched-Rule", rule_id));
            }
            builder.content_type("text/plain").body(format!("origin misconfigured: {detail}"))
        }
    }
}
