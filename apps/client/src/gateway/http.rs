//! Gateway for the REST catalog backend.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use word_core::{Category, Page, StatusCode, WordId, WordRecord};

use super::memory::DEFAULT_CATEGORY_ICON;
use super::{WordDraft, WordGateway};
use crate::error::{Result, SyncError};

const CATEGORY_PAGE_SIZE: usize = 50;

// === API Request/Response Types ===

/// Spring `Page<T>` envelope. Every field may be missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPage<T> {
    content: Option<Vec<T>>,
    number: Option<usize>,
    size: Option<usize>,
    total_pages: Option<usize>,
    total_elements: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCard {
    id: i64,
    palabra: Option<String>,
    traduccion: Option<String>,
    imagen: Option<String>,
    es_favorita: Option<bool>,
    id_categoria: Option<Value>,
}

impl ApiCard {
    fn into_record(self, favorite: Option<bool>) -> WordRecord {
        WordRecord {
            id: WordId::Persisted(self.id),
            title: self.palabra.unwrap_or_default(),
            meaning: self.traduccion.unwrap_or_default(),
            image_url: self.imagen,
            favorite: favorite.unwrap_or(self.es_favorita.unwrap_or(false)),
            category: self.id_categoria.as_ref().map(id_text).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiCategory {
    id: Value,
    nombre: String,
}

#[derive(Debug, Deserialize)]
struct ApiDeleted {
    id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    id_categoria: Value,
    palabra: &'a str,
    traduccion: &'a str,
    es_favorita: bool,
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric category ids go over the wire as numbers.
fn category_value(id: &str) -> Value {
    id.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(id))
}

/// REST client for the catalog service.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
    user_id: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            user_id: None,
        }
    }

    /// Bearer token attached to every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// User id attached to every request as the `idUsuario` header.
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    // === Private methods ===

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(user_id) = &self.user_id {
            builder = builder.header("idUsuario", user_id);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let resp = builder
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Backend { status, message });
        }

        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        self.send(builder)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))
    }

    async fn fetch_page(
        &self,
        path: &str,
        query: Option<&str>,
        page: usize,
        size: usize,
        favorite: Option<bool>,
    ) -> Result<Page<WordRecord>> {
        let mut builder = self
            .request(Method::GET, path)
            .query(&[("page", page), ("size", size)]);
        if let Some(query) = query {
            builder = builder.query(&[("query", query)]);
        }
        tracing::debug!(path, page, size, "fetching word page");

        let api: ApiPage<ApiCard> = self.json(builder).await?;
        let items: Vec<WordRecord> = api
            .content
            .unwrap_or_default()
            .into_iter()
            .map(|card| card.into_record(favorite))
            .collect();
        Ok(Page {
            page: api.number.unwrap_or(page),
            size: api.size.unwrap_or(size),
            total_pages: api.total_pages.unwrap_or(1).max(1),
            total_elements: api.total_elements.unwrap_or(items.len() as u64),
            items,
        })
    }

    /// Multipart body with the card JSON part and the optional image part.
    fn card_form(id: Option<i64>, draft: &WordDraft) -> Result<Form> {
        let payload = CardPayload {
            id,
            id_categoria: category_value(&draft.category_id),
            palabra: &draft.title,
            traduccion: &draft.meaning,
            es_favorita: draft.favorite,
        };
        let json = serde_json::to_string(&payload).map_err(|e| SyncError::Parse(e.to_string()))?;
        let card = Part::text(json)
            .mime_str("application/json")
            .map_err(|e| SyncError::Parse(e.to_string()))?;
        let mut form = Form::new().part("tarjeta", card);

        if let Some(image) = &draft.image {
            let mut part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
            if let Some(content_type) = &image.content_type {
                part = part
                    .mime_str(content_type)
                    .map_err(|e| SyncError::Parse(e.to_string()))?;
            }
            form = form.part("imagen", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl WordGateway for HttpGateway {
    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        if self.user_id.is_none() {
            tracing::debug!("no user id, skipping category fetch");
            return Ok(Vec::new());
        }
        let builder = self
            .request(Method::GET, "/api/categoria")
            .query(&[("page", 0), ("size", CATEGORY_PAGE_SIZE)]);
        let api: ApiPage<ApiCategory> = self.json(builder).await?;
        Ok(api
            .content
            .unwrap_or_default()
            .into_iter()
            .map(|c| Category {
                id: id_text(&c.id),
                name: c.nombre,
                icon: DEFAULT_CATEGORY_ICON.to_string(),
                active: false,
            })
            .collect())
    }

    async fn fetch_by_category(
        &self,
        category_id: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        let path = format!("/api/tarjeta/categoria/{category_id}");
        self.fetch_page(&path, None, page, size, None).await
    }

    async fn fetch_by_category_and_status(
        &self,
        category_id: &str,
        status: StatusCode,
        query: Option<&str>,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        let path = format!("/api/tarjeta/{category_id}/{}", status.as_str());
        self.fetch_page(&path, query, page, size, None).await
    }

    async fn fetch_favorites(
        &self,
        category_id: &str,
        query: Option<&str>,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        let path = format!("/api/tarjeta/favorites/{category_id}");
        self.fetch_page(&path, query, page, size, Some(true)).await
    }

    async fn fetch_by_status(
        &self,
        status: StatusCode,
        page: usize,
        size: usize,
    ) -> Result<Page<WordRecord>> {
        let path = format!("/api/tarjeta/estado/{}", status.as_str());
        self.fetch_page(&path, None, page, size, None).await
    }

    async fn fetch_word(&self, id: i64) -> Result<WordRecord> {
        let builder = self.request(Method::GET, &format!("/api/tarjeta/{id}"));
        let card: ApiCard = self.json(builder).await?;
        Ok(card.into_record(None))
    }

    async fn create(&self, draft: &WordDraft) -> Result<WordRecord> {
        let form = Self::card_form(None, draft)?;
        let builder = self
            .request(Method::POST, "/api/tarjeta/create")
            .multipart(form);
        let card: ApiCard = self.json(builder).await?;
        Ok(card.into_record(None))
    }

    async fn update(&self, id: i64, draft: &WordDraft) -> Result<WordRecord> {
        let form = Self::card_form(Some(id), draft)?;
        let builder = self.request(Method::PUT, "/api/tarjeta").multipart(form);
        let card: ApiCard = self.json(builder).await?;
        Ok(card.into_record(None))
    }

    async fn delete(&self, id: i64) -> Result<i64> {
        let builder = self.request(Method::DELETE, &format!("/api/tarjeta/{id}"));
        let body = self
            .send(builder)
            .await?
            .text()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Ok(serde_json::from_str::<ApiDeleted>(&body)
            .ok()
            .and_then(|deleted| deleted.id)
            .unwrap_or(id))
    }

    async fn change_status(&self, id: i64, status: StatusCode) -> Result<WordRecord> {
        let path = format!("/api/tarjeta/status/{id}/{}", status.as_str());
        let card: ApiCard = self.json(self.request(Method::PUT, &path)).await?;
        Ok(card.into_record(None))
    }
}
