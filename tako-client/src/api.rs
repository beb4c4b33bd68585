use reqwest::{Client, Method, Response};
use serde::{Deserialize, Deserializer, Serialize};
use takotako_core::{CoreError, Post, TakoApiError, TakoConfig};
use tracing::{debug, error, info, warn};

const USER_AGENT: &str = concat!("takotako/", env!("CARGO_PKG_VERSION"));

/// Response envelope shared by every Tako open-API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct TakoEnvelope<T> {
    pub status: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> TakoEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Feed page. Items stay raw so one malformed cast cannot fail the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakoFeedData {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub cursor: Option<serde_json::Value>,
}

impl TakoFeedData {
    /// Decodes each item on its own, skipping the ones that are not casts.
    pub fn into_casts(self) -> Vec<TakoCastData> {
        self.items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let hash = item
                    .get("hash")
                    .and_then(|h| h.as_str())
                    .unwrap_or("<no hash>")
                    .to_string();
                match serde_json::from_value::<TakoCastData>(item) {
                    Ok(cast) => Some(cast),
                    Err(e) => {
                        warn!("Skipping feed item {} ({}): {}", index, hash, e);
                        None
                    }
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakoCastData {
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    pub created_at: i64,
    pub author: TakoAuthorData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakoAuthorData {
    #[serde(default)]
    pub fid: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Optional mention and link data carried by a new cast or reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CastAttachments {
    pub mentions: Option<Vec<u64>>,
    pub mentions_positions: Option<Vec<u64>>,
    pub urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakoImageUploadData {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
struct ReplyRequest<'a> {
    cast_hash: &'a str,
    text: &'a str,
    mentions: Option<&'a [u64]>,
    mentions_positions: Option<&'a [u64]>,
    urls: Option<&'a [String]>,
}

#[derive(Debug, Clone, Serialize)]
struct CreateCastRequest<'a> {
    text: &'a str,
    title: &'a str,
    community_id: &'a str,
    mentions: &'a [u64],
    mentions_positions: &'a [u64],
    urls: &'a [String],
}

#[derive(Debug)]
pub struct TakoApiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl TakoApiClient {
    pub fn new(config: &TakoConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn make_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        query_params: Option<&[(&str, String)]>,
        body: Option<&B>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .header("x-api-key", &self.api_key);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }
        if let Some(body) = body {
            request_builder = request_builder.json(body);
        }

        debug!("Making Tako API request: {} {}", method, endpoint);
        let response = request_builder.send().await.map_err(|e| {
            error!("Network error for {} {}: {}", method, endpoint, e);
            CoreError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let err = match status.as_u16() {
            401 => TakoApiError::InvalidApiKey,
            403 => TakoApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited by Tako, retry after {} seconds", retry_after);
                TakoApiError::RateLimitExceeded { retry_after }
            }
            code if status.is_server_error() => TakoApiError::ServerError { status_code: code },
            code => TakoApiError::RequestFailed {
                endpoint: endpoint.to_string(),
                status_code: code,
            },
        };
        Err(CoreError::TakoApi(err))
    }

    async fn parse_envelope<T>(response: Response, what: &str) -> Result<TakoEnvelope<T>, CoreError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse {}: {}", what, e);
            CoreError::TakoApi(TakoApiError::InvalidResponse {
                details: format!("Failed to parse {}", what),
            })
        })
    }

    /// `GET /feed/follow`: casts from accounts the key's owner follows.
    pub async fn get_following_feed(&self) -> Result<TakoEnvelope<TakoFeedData>, CoreError> {
        let response = self
            .make_request::<()>(Method::GET, "/feed/follow", None, None)
            .await?;
        let envelope: TakoEnvelope<TakoFeedData> =
            Self::parse_envelope(response, "following feed").await?;

        if let Some(ref data) = envelope.data {
            info!("Retrieved {} casts from following feed", data.items.len());
        }
        Ok(envelope)
    }

    pub async fn get_feed_by_fids(
        &self,
        fids: &[u64],
        cursor: Option<u64>,
    ) -> Result<TakoEnvelope<TakoFeedData>, CoreError> {
        let target_ids = fids
            .iter()
            .map(|fid| fid.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.get_cast_feed("fid", target_ids, cursor).await
    }

    pub async fn get_feed_by_communities(
        &self,
        community_ids: &[&str],
        cursor: Option<u64>,
    ) -> Result<TakoEnvelope<TakoFeedData>, CoreError> {
        self.get_cast_feed("community", community_ids.join(","), cursor)
            .await
    }

    async fn get_cast_feed(
        &self,
        target_type: &str,
        target_ids: String,
        cursor: Option<u64>,
    ) -> Result<TakoEnvelope<TakoFeedData>, CoreError> {
        let mut params = vec![
            ("target_type", target_type.to_string()),
            ("target_ids", target_ids),
        ];
        // A zero cursor means the first page and is left out.
        if let Some(cursor) = cursor.filter(|c| *c != 0) {
            params.push(("cursor", cursor.to_string()));
        }

        let response = self
            .make_request::<()>(Method::GET, "/feed/cast", Some(params.as_slice()), None)
            .await?;
        Self::parse_envelope(response, &format!("{} feed", target_type)).await
    }

    /// `POST /cast/reply`. Unset attachments are sent as `null`.
    pub async fn reply_to_cast(
        &self,
        cast_hash: &str,
        text: &str,
        attachments: &CastAttachments,
    ) -> Result<TakoEnvelope<serde_json::Value>, CoreError> {
        let body = ReplyRequest {
            cast_hash,
            text,
            mentions: attachments.mentions.as_deref(),
            mentions_positions: attachments.mentions_positions.as_deref(),
            urls: attachments.urls.as_deref(),
        };

        let response = self
            .make_request(Method::POST, "/cast/reply", None, Some(&body))
            .await?;
        let envelope = Self::parse_envelope(response, "reply response").await?;
        debug!("Reply to {} returned status {}", cast_hash, envelope.status);
        Ok(envelope)
    }

    /// `POST /cast`. Either `text` or `title` must be non-empty; unset
    /// attachments are sent as empty lists.
    pub async fn create_cast(
        &self,
        text: Option<&str>,
        title: Option<&str>,
        community_id: Option<&str>,
        attachments: &CastAttachments,
    ) -> Result<TakoEnvelope<serde_json::Value>, CoreError> {
        let text = text.unwrap_or_default();
        let title = title.unwrap_or_default();
        if text.is_empty() && title.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "Either text or title must be provided".to_string(),
            });
        }

        let body = CreateCastRequest {
            text,
            title,
            community_id: community_id.unwrap_or_default(),
            mentions: attachments.mentions.as_deref().unwrap_or_default(),
            mentions_positions: attachments
                .mentions_positions
                .as_deref()
                .unwrap_or_default(),
            urls: attachments.urls.as_deref().unwrap_or_default(),
        };

        let response = self
            .make_request(Method::POST, "/cast", None, Some(&body))
            .await?;
        Self::parse_envelope(response, "create cast response").await
    }

    pub async fn get_image_upload_url(&self) -> Result<String, CoreError> {
        let response = self
            .make_request::<()>(Method::POST, "/image_upload_url", None, None)
            .await?;
        let envelope: TakoEnvelope<TakoImageUploadData> =
            Self::parse_envelope(response, "image upload url").await?;

        envelope.data.map(|d| d.url).ok_or_else(|| {
            CoreError::TakoApi(TakoApiError::InvalidResponse {
                details: "Image upload response carried no url".to_string(),
            })
        })
    }
}

impl From<TakoCastData> for Post {
    fn from(cast: TakoCastData) -> Self {
        Self {
            id: cast.hash,
            author_display_name: cast.author.display_name,
            text: cast.text,
            created_at: cast.created_at,
        }
    }
}
