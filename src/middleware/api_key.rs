//! API Key 认证中间件
//!
//! 支持两种方式传递密钥：
//! - Authorization: Bearer <token>
//! - X-API-Key: <token>
//!
//! 未配置 API Key 时不做认证；健康检查接口始终放行

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderMap,
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::models::ApiResponse;

/// API Key 中间件
pub struct ApiKeyMiddleware {
    api_key: Option<Rc<String>>,
}

impl ApiKeyMiddleware {
    /// 空字符串表示关闭认证
    pub fn new(api_key: String) -> Self {
        Self {
            api_key: (!api_key.is_empty()).then(|| Rc::new(api_key)),
        }
    }
}

/// 从请求头中取出客户端提供的密钥
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or_else(|| headers.get("X-API-Key").and_then(|v| v.to_str().ok()))
        .map(str::trim)
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyMiddlewareService {
            service: Rc::new(service),
            api_key: self.api_key.clone(),
        })
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
    api_key: Option<Rc<String>>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let api_key = self.api_key.clone();

        Box::pin(async move {
            let authorized = match &api_key {
                None => true,
                Some(_) if req.path().ends_with("/health") => true,
                Some(expected) => provided_key(req.headers()) == Some(expected.as_str()),
            };

            if authorized {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            log::warn!("拒绝未授权请求: {}", req.path());
            let response = HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("无效的 API Key".to_string()));
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}
