use std::str::FromStr;

use bytes::Bytes;
use hyper::Request;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// `:param` captures of the matched route, stored in request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(pub Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse a typed path parameter, e.g. the `:id` of `/recipes/:id`.
pub fn path_param<T: FromStr>(req: &Request<Bytes>, name: &str) -> Result<T, ApiError> {
    let raw = req
        .extensions()
        .get::<PathParams>()
        .and_then(|params| params.get(name))
        .ok_or_else(|| ApiError::BadRequest(format!("missing path parameter {name}")))?;

    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {name}: {raw}")))
}

/// Deserialize the collected request body.
pub fn parse_json_body<T: DeserializeOwned>(req: &Request<Bytes>) -> Result<T, ApiError> {
    serde_json::from_slice(req.body()).map_err(|e| {
        debug!("Rejected request body: {}", e);
        ApiError::MalformedBody(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use shared::types::RecipeId;

    use super::*;

    fn with_params(body: &'static str, params: &[(&str, &str)]) -> Request<Bytes> {
        let mut req = Request::new(Bytes::from_static(body.as_bytes()));
        req.extensions_mut().insert(PathParams(
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        req
    }

    #[test]
    fn typed_id_is_parsed() {
        let id = RecipeId::generate();
        let raw = id.to_string();
        let req = with_params("", &[("id", raw.as_str())]);
        assert_eq!(path_param::<RecipeId>(&req, "id").unwrap(), id);
    }

    #[test]
    fn bad_id_is_bad_request() {
        let req = with_params("", &[("id", "42")]);
        assert!(matches!(
            path_param::<RecipeId>(&req, "id"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        #[allow(dead_code)]
        name: String,
    }

    #[test]
    fn broken_json_is_malformed() {
        let req = with_params("{\"name\":", &[]);
        assert!(matches!(
            parse_json_body::<Named>(&req),
            Err(ApiError::MalformedBody(_))
        ));
    }
}
