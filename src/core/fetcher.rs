use crate::config::InventoryConfig;
use crate::domain::model::Page;
use crate::domain::ports::ResourceSource;
use crate::utils::error::{InventoryError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Cursor-paginated GET client for the hosting API.
pub struct ApiFetcher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiFetcher {
    pub fn new(config: &InventoryConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn page_url(&self, path: &str, cursor: Option<&str>) -> String {
        match cursor {
            None => format!("{}{}", self.base_url, path),
            Some(cursor) => {
                let separator = if path.contains('?') { '&' } else { '?' };
                let encoded: String =
                    url::form_urlencoded::byte_serialize(cursor.as_bytes()).collect();
                format!("{}{}{}cursor={}", self.base_url, path, separator, encoded)
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<Page> {
        let mut request = self.client.get(url);
        if !self.api_key.is_empty() {
            request = request.header(API_KEY_HEADER, &self.api_key);
        }

        let response = request.send().await?.error_for_status()?;
        tracing::debug!("GET {} -> {}", url, response.status());

        let body = response.text().await?;
        decode_page(&body)
    }
}

/// Pages must be JSON objects; serde would otherwise accept an array as a
/// positional struct and silently read it as an empty page.
fn decode_page(body: &str) -> Result<Page> {
    match serde_json::from_str::<Value>(body)? {
        page @ Value::Object(_) => Ok(serde_json::from_value(page)?),
        _ => Err(InventoryError::SerializationError(
            serde::de::Error::custom("page is not an object"),
        )),
    }
}

#[async_trait]
impl ResourceSource for ApiFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = self.page_url(path, cursor.as_deref());
            let page = self.fetch_page(&url).await?;

            cursor = page.continuation().map(str::to_string);
            items.extend(page.items.unwrap_or_default());

            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!("Fetched {} items from {}", items.len(), path);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roles::RoleMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn fetcher(base_url: &str) -> ApiFetcher {
        ApiFetcher::new(&InventoryConfig {
            base_url: base_url.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
            static_path: PathBuf::from("static.ini"),
            roles: RoleMap::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_page_url_separator() {
        let fetcher = fetcher("http://api.example/v1");

        assert_eq!(fetcher.page_url("/regions", None), "http://api.example/v1/regions");
        assert_eq!(
            fetcher.page_url("/regions", Some("abc")),
            "http://api.example/v1/regions?cursor=abc"
        );
        assert_eq!(
            fetcher.page_url("/regions?limit=5", Some("abc")),
            "http://api.example/v1/regions?limit=5&cursor=abc"
        );
    }

    #[test]
    fn test_page_url_encodes_cursor() {
        let fetcher = fetcher("http://api.example/v1");
        assert_eq!(
            fetcher.page_url("/regions", Some("a+b/c=")),
            "http://api.example/v1/regions?cursor=a%2Bb%2Fc%3D"
        );
    }

    #[test]
    fn test_decode_page_requires_object() {
        let page = decode_page(r#"{"items": [{"id": "r1"}], "has_more": false}"#).unwrap();
        assert_eq!(page.items.unwrap().len(), 1);

        for body in ["[]", r#"[[{"id": "r1"}], false, null]"#, "null", "\"page\""] {
            let err = decode_page(body).unwrap_err();
            assert!(matches!(err, InventoryError::SerializationError(_)));
            assert!(!err.is_transport());
        }
    }
}
