//! REST collaborator - talks to the evaluation backend over HTTP.
//!
//! Requires the `http` feature. Uses reqwest.
//!
//! ## Routes
//!
//! - `GET /{kind}?page=N&per_page=M`: listing, paginated or not
//! - `GET /sessions/{id}`, `POST /sessions`, `PUT /sessions/{id}`,
//!   `DELETE /sessions/{id}`
//! - `POST /sessions/{id}/{action}`: status change (`activate`,
//!   `complete`, `cancel`), returns the updated session
//!
//! Success bodies are either the payload itself or the payload wrapped in
//! `{ "data": ... }`. Error bodies may carry `{ "message": "..." }`, which
//! is surfaced verbatim.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};

use super::{ApiError, FetchAll, SessionApi};
use crate::config::ApiConfig;
use crate::lifecycle::TransitionAction;
use crate::model::{Entity, NewSession, Session, SessionUpdate};

/// Upper bound on pages followed by one listing.
const MAX_PAGES: u32 = 500;

/// Pagination fields, either at the top level or under `meta`.
///
/// Only `last_page` is read; the page counter is the client's own, so a
/// server that ignores `?page=` cannot keep the listing going.
#[derive(Debug, Default, Deserialize)]
struct PageMeta {
    #[serde(default)]
    last_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<E> {
    Bare(Vec<E>),
    Paged {
        data: Vec<E>,
        #[serde(flatten)]
        page: PageMeta,
        #[serde(default)]
        meta: Option<PageMeta>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

/// HTTP client for the backend. Cheap to clone.
///
/// ## Example
///
/// ```ignore
/// let api = RestClient::new(ApiConfig::from_env()?)?;
/// let ctx = AppContext::new(api);
/// ctx.refresh_all().await;
/// ```
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
}

impl RestClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Fetch every page of `/{kind}` and flatten it.
    ///
    /// Stops at `last_page`, at the first empty page, or fails with
    /// [`ApiError::Decode`] after `MAX_PAGES` pages.
    pub async fn list<E: Entity>(&self) -> Result<Vec<E>, ApiError> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self.request(Method::GET, E::KIND).query(&[
                ("page", page.to_string()),
                ("per_page", self.config.page_size.to_string()),
            ]);
            let listing: Listing<E> = self.send_json(request).await?;

            let (data, meta) = match listing {
                Listing::Bare(data) => (data, PageMeta::default()),
                Listing::Paged { data, page: top, meta } => (data, meta.unwrap_or(top)),
            };
            let fetched = data.len();
            items.extend(data);
            trace!(kind = E::KIND, page, fetched, "listing page received");

            match meta.last_page {
                Some(last) if page < last && fetched > 0 => {
                    if page >= MAX_PAGES {
                        return Err(ApiError::Decode(format!(
                            "{} listing exceeds {MAX_PAGES} pages",
                            E::KIND
                        )));
                    }
                    page += 1;
                }
                _ => break,
            }
        }

        debug!(kind = E::KIND, count = items.len(), "listing fetched");
        Ok(items)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(ApiError::from_body(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send_entity<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.send_json(request).await?;
        Ok(envelope.into_inner())
    }
}

impl<E: Entity> FetchAll<E> for RestClient {
    async fn fetch_all(&self) -> Result<Vec<E>, ApiError> {
        self.list::<E>().await
    }
}

impl SessionApi for RestClient {
    async fn get_by_id(&self, id: i64) -> Result<Session, ApiError> {
        let path = format!("{}/{}", Session::KIND, id);
        self.send_entity(self.request(Method::GET, &path)).await
    }

    async fn create(&self, payload: &NewSession) -> Result<Session, ApiError> {
        let request = self.request(Method::POST, Session::KIND).json(payload);
        self.send_entity(request).await
    }

    async fn update(&self, id: i64, payload: &SessionUpdate) -> Result<Session, ApiError> {
        let path = format!("{}/{}", Session::KIND, id);
        self.send_entity(self.request(Method::PUT, &path).json(payload))
            .await
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("{}/{}", Session::KIND, id);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn change_status(&self, id: i64, action: TransitionAction) -> Result<Session, ApiError> {
        let path = format!("{}/{}/{}", Session::KIND, id, action.as_str());
        self.send_entity(self.request(Method::POST, &path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Classe;

    #[test]
    fn listing_accepts_bare_and_paged_shapes() {
        let bare: Listing<Classe> = serde_json::from_str(r#"[{"id":1,"name":"L1"}]"#).unwrap();
        assert!(matches!(bare, Listing::Bare(ref v) if v.len() == 1));

        let paged: Listing<Classe> = serde_json::from_str(
            r#"{"data":[{"id":1,"name":"L1"}],"current_page":1,"last_page":3}"#,
        )
        .unwrap();
        match paged {
            Listing::Paged { data, page, meta } => {
                assert_eq!(data.len(), 1);
                assert_eq!(page.last_page, Some(3));
                assert!(meta.is_none());
            }
            Listing::Bare(_) => panic!("expected paged listing"),
        }

        let resource: Listing<Classe> = serde_json::from_str(
            r#"{"data":[],"meta":{"current_page":2,"last_page":2}}"#,
        )
        .unwrap();
        assert!(matches!(
            resource,
            Listing::Paged { meta: Some(PageMeta { last_page: Some(2), .. }), .. }
        ));
    }

    #[test]
    fn envelope_unwraps_data() {
        let wrapped: Envelope<Classe> =
            serde_json::from_str(r#"{"data":{"id":4,"name":"M2"}}"#).unwrap();
        assert_eq!(wrapped.into_inner().id, 4);
        let bare: Envelope<Classe> = serde_json::from_str(r#"{"id":5,"name":"M1"}"#).unwrap();
        assert_eq!(bare.into_inner().id, 5);
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let client = RestClient::new(ApiConfig::new("http://api.local/api/")).unwrap();
        assert_eq!(client.url("/sessions/3"), "http://api.local/api/sessions/3");
    }
}
