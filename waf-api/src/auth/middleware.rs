//! Actix-web `Transform`/`Service` middleware enforcing JWT auth and, on
//! top of it, a minimum role. Grounded near-verbatim in the teacher's
//! `router-api/src/api/users/helper/auth_middleware.rs`.

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::dev::{self, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::ErrorUnauthorized;
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;

use super::token::{self, AuthConfig, Claims};

pub struct JwtAuth {
    auth_config: Rc<AuthConfig>,
}

impl JwtAuth {
    pub fn new() -> Self {
        Self {
            auth_config: Rc::new(AuthConfig::default()),
        }
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            auth_config: self.auth_config.clone(),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    auth_config: Rc<AuthConfig>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_config = self.auth_config.clone();
        let srv = self.service.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .ok_or_else(|| ErrorUnauthorized("missing Authorization header"))?;
            let header = header.to_str().map_err(|_| ErrorUnauthorized("invalid Authorization header"))?;
            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ErrorUnauthorized("expected a Bearer token"))?;

            let claims: Claims =
                token::validate_token(token, &auth_config).map_err(|_| ErrorUnauthorized("invalid or expired token"))?;
            req.extensions_mut().insert(claims);

            srv.call(req).await
        })
    }
}

/// Enforces a minimum role on top of [`JwtAuth`] having already populated
/// `Claims` in the request extensions.
pub struct RoleAuth {
    required_role: &'static str,
}

impl RoleAuth {
    pub fn admin() -> Self {
        Self { required_role: "admin" }
    }

    pub fn staff() -> Self {
        Self { required_role: "staff" }
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for RoleAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RoleAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleAuthMiddleware {
            service: Rc::new(service),
            required_role: self.required_role,
        }))
    }
}

pub struct RoleAuthMiddleware<S> {
    service: Rc<S>,
    required_role: &'static str,
}

impl<S, B> Service<ServiceRequest> for RoleAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let required_role = self.required_role;

        Box::pin(async move {
            let role = {
                let extensions = req.extensions();
                extensions.get::<Claims>().map(|c| c.role.clone())
            };
            let role = role.ok_or_else(|| ErrorUnauthorized("missing authentication"))?;

            let allowed = match required_role {
                "admin" => token::is_admin(&role),
                "staff" => token::is_staff_or_admin(&role),
                _ => true,
            };
            if !allowed {
                return Err(ErrorUnauthorized("insufficient role"));
            }

            srv.call(req).await
        })
    }
}
