use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use chrono::Utc;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::handlers::http::catalogue::{plans, products, ratings, recipes};
use crate::handlers::http::utils::{JsonResult, PathParams, deliver_api_error, full};
use crate::handlers::http::{admin, auth, profile, status};
use crate::security::{Access, Identity, authenticate};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Three tiers:
//
//   Open   : no auth.  Receives (req, state).
//   User   : bearer token verified and the account still exists.
//            Receives (req, state, identity).
//   Admin  : as User, and the token carries the admin flag.
//
// Every handler sees a request whose body is already collected and whose
// `:param` captures sit in the extensions as `PathParams`.

const INTERNAL_ERROR_BODY: &str =
    r#"{"status":"error","code":"INTERNAL_ERROR","message":"internal server error"}"#;

type HandlerFuture = Pin<Box<dyn Future<Output = JsonResult> + Send>>;

type OpenHandler = Box<dyn Fn(Request<Bytes>, AppState) -> HandlerFuture + Send + Sync>;

type GuardedHandler =
    Box<dyn Fn(Request<Bytes>, AppState, Identity) -> HandlerFuture + Send + Sync>;

enum RouteKind {
    Open(OpenHandler),
    Guarded(Access, GuardedHandler),
}

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    fn open<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    fn guarded<F, Fut>(mut self, method: Method, access: Access, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Guarded(
                access,
                Box::new(move |req, state, who| Box::pin(handler(req, state, who))),
            ),
        });
        self
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.open(Method::GET, path, handler)
    }

    /// POST with no authentication. Login and register only.
    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.open(Method::POST, path, handler)
    }

    // ── User (any admitted identity) ──────────────────────────────────────────

    pub fn get_user<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.guarded(Method::GET, Access::User, path, handler)
    }

    pub fn post_user<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.guarded(Method::POST, Access::User, path, handler)
    }

    pub fn patch_user<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.guarded(Method::PATCH, Access::User, path, handler)
    }

    pub fn delete_user<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.guarded(Method::DELETE, Access::User, path, handler)
    }

    // ── Admin ─────────────────────────────────────────────────────────────────

    pub fn get_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.guarded(Method::GET, Access::Admin, path, handler)
    }

    pub fn post_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.guarded(Method::POST, Access::Admin, path, handler)
    }

    pub fn patch_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.guarded(Method::PATCH, Access::Admin, path, handler)
    }

    pub fn delete_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, Identity) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = JsonResult> + Send + 'static,
    {
        self.guarded(Method::DELETE, Access::Admin, path, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// First registered route that matches wins, so specific paths such as
    /// `/users/me` must be registered before `/users/:id`.
    pub async fn route<B>(&self, req: Request<B>, state: AppState) -> JsonResult
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let matched = self.routes.iter().find_map(|route| {
            if route.method != method {
                return None;
            }
            Self::match_path(&route.path, &path).map(|params| (route, params))
        });
        let Some((route, params)) = matched else {
            debug!("No route for {} {}", method, path);
            return deliver_api_error(ApiError::NotFound("endpoint"));
        };

        // Auth runs on the headers alone so a rejected caller never gets its
        // body read.
        let who = match &route.kind {
            RouteKind::Open(_) => None,
            RouteKind::Guarded(access, _) => {
                match authenticate(req.headers(), &state, *access, Utc::now()).await {
                    Ok(who) => Some(who),
                    Err(e) => {
                        warn!("Auth rejected {} {}: {}", method, path, e);
                        return deliver_api_error(e);
                    }
                }
            }
        };

        let limit = state.config.read().await.server.max_body_bytes;
        let (mut parts, body) = req.into_parts();
        let bytes = match Limited::new(body, limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => {
                warn!("Body over {} bytes rejected on {} {}", limit, method, path);
                return deliver_api_error(ApiError::PayloadTooLarge);
            }
            Err(e) => return deliver_api_error(ApiError::MalformedBody(e.to_string())),
        };
        parts.extensions.insert(params);
        let req = Request::from_parts(parts, bytes);

        match (&route.kind, who) {
            (RouteKind::Open(h), _) => h(req, state).await,
            (RouteKind::Guarded(_, h), Some(who)) => h(req, state, who).await,
            (RouteKind::Guarded(..), None) => deliver_api_error(ApiError::Unauthorized),
        }
    }

    /// Entry point for the connection loop: like [`Router::route`], but a
    /// handler failure becomes a bare 500 instead of an error.
    pub async fn serve<B>(
        &self,
        req: Request<B>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>, Infallible>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match self.route(req, state).await {
            Ok(response) => Ok(response),
            Err(e) => {
                error!("Handler failed: {:#}", e);
                let mut response = Response::new(full(INTERNAL_ERROR_BODY));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                Ok(response)
            }
        }
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    /// Match `request_path` against a route pattern, capturing `:param`
    /// segments.  `None` when the shapes differ.
    pub fn match_path(route_path: &str, request_path: &str) -> Option<PathParams> {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        if route_path == clean {
            return Some(PathParams::default());
        }

        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return None;
        }

        let mut params = Vec::new();
        for (r, p) in route_segs.iter().zip(path_segs.iter()) {
            if let Some(name) = r.strip_prefix(':') {
                if p.is_empty() {
                    return None;
                }
                params.push((name.to_string(), p.to_string()));
            } else if r != p {
                return None;
            }
        }
        Some(PathParams(params))
    }
}

// ---------------------------------------------------------------------------
// API router
//
// Auth tier is enforced here at the routing level; handlers MUST NOT repeat
// the auth call.  Ownership checks (owner-only updates, owner-or-admin
// deletes) stay in the handlers because they need the stored aggregate.
// ---------------------------------------------------------------------------

pub fn build_api_router() -> Router {
    Router::new()
        // ── Public ───────────────────────────────────────────────────────────
        .post("/register", auth::handle_register)
        .post("/login", auth::handle_login)
        .get("/version", status::handle_version)
        .get("/health", status::handle_health)
        .get("/products", products::handle_list_products)
        .get("/products/:id", products::handle_get_product)
        .get("/recipes", recipes::handle_list_recipes)
        .get("/recipes/:id", recipes::handle_get_recipe)
        .get("/recipes/:id/ratings", ratings::handle_list_ratings)
        .get("/users/:id/recipes", recipes::handle_list_user_recipes)
        // ── Any signed-in user ───────────────────────────────────────────────
        .post_user("/recipes", recipes::handle_create_recipe)
        .patch_user("/recipes/:id", recipes::handle_update_recipe)
        .delete_user("/recipes/:id", recipes::handle_delete_recipe)
        .post_user("/recipes/:id/ratings", ratings::handle_rate_recipe)
        .patch_user("/recipes/:id/ratings", ratings::handle_update_rating)
        .delete_user("/recipes/:id/ratings", ratings::handle_delete_rating)
        .get_user("/plans", plans::handle_list_plans)
        .get_user("/plans/:id", plans::handle_get_plan)
        .post_user("/plans", plans::handle_create_plan)
        .patch_user("/plans/:id", plans::handle_update_plan)
        .delete_user("/plans/:id", plans::handle_delete_plan)
        .get_user("/users/:id/plans", plans::handle_list_user_plans)
        .get_user("/users/me", profile::handle_get_me)
        .patch_user("/users/me", profile::handle_change_password)
        .delete_user("/users/me", profile::handle_delete_me)
        // ── Administrators ───────────────────────────────────────────────────
        .post_admin("/products", products::handle_create_product)
        .patch_admin("/products/:id", products::handle_update_product)
        .delete_admin("/products/:id", products::handle_delete_product)
        .get_admin("/users", admin::handle_list_users)
        .post_admin("/users", admin::handle_create_admin)
        .get_admin("/users/:id", admin::handle_get_user)
        .delete_admin("/users/:id", admin::handle_delete_user)
}
