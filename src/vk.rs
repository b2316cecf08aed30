//! Публикация фотографий на стене группы VK.
//!
//! Публикация идёт в четыре шага: запрос адреса загрузки, загрузка байтов,
//! сохранение фотографии и создание поста с вложением. Каждый ответ VK
//! проверяется дважды: сначала HTTP-статус, затем поле `error`, которое VK
//! кладёт в тело даже при статусе 200.

use std::path::Path;

use reqwest::multipart;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{VK_API_URL, VK_API_VERSION};
use crate::{Error, Result};

/// Адрес сервера загрузки фотографий.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadServer {
    pub upload_url: String,
}

/// Опорные токены загрузки, которые VK требует на шаге сохранения.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedPhoto {
    pub server: i64,
    pub photo: String,
    pub hash: String,
}

/// Сохранённая фотография, готовая к прикреплению к посту.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedPhoto {
    pub id: i64,
    pub owner_id: i64,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct VkErrorBody {
    error_msg: String,
}

#[derive(Debug, Deserialize)]
struct ErrorProbe {
    error: Option<VkErrorBody>,
}

/// Клиент VK API.
#[derive(Debug, Clone)]
pub struct VkClient {
    http: Client,
    token: String,
    base_url: String,
    api_version: String,
}

impl VkClient {
    /// Клиент с адресом API по умолчанию.
    pub fn new<S: Into<String>>(token: S) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "VK_IMPLICIT_FLOW_TOKEN пустой".to_string(),
            ));
        }

        let http = Client::builder()
            .user_agent(format!("comic_poster/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("Не удалось построить HTTP-клиент: {}", e)))?;

        Ok(Self {
            http,
            token,
            base_url: VK_API_URL.to_string(),
            api_version: VK_API_VERSION.to_string(),
        })
    }

    /// Клиент с нестандартным адресом API (в первую очередь для тестов).
    pub fn with_base_url<S1: Into<String>, S2: Into<String>>(
        token: S1,
        base_url: S2,
    ) -> Result<Self> {
        let mut client = Self::new(token)?;
        client.base_url = base_url.into();
        Ok(client)
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Не удалось обратиться к VK: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Не удалось прочитать ответ VK: {}", e)))?;

        Self::parse_response(status, &text)
    }

    /// Двойная проверка ответа: HTTP-статус, затем поле `error` в теле.
    fn parse_response<T: DeserializeOwned>(status: reqwest::StatusCode, text: &str) -> Result<T> {
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "VK вернул HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let probe: ErrorProbe = serde_json::from_str(text).map_err(|e| {
            Error::MalformedResponse(format!("VK вернул не-JSON ответ: {} ({})", text, e))
        })?;
        if let Some(error) = probe.error {
            return Err(Error::Vk(error.error_msg));
        }

        serde_json::from_str(text).map_err(|e| {
            Error::MalformedResponse(format!("Неожиданная форма ответа VK: {} ({})", text, e))
        })
    }

    /// Шаг 1: адрес сервера загрузки фотографий на стену группы.
    pub async fn wall_upload_server(&self, group_id: i64) -> Result<UploadServer> {
        let request = self
            .http
            .get(format!(
                "{}/method/photos.getWallUploadServer",
                self.base_url
            ))
            .query(&[
                ("group_id", group_id.to_string()),
                ("access_token", self.token.clone()),
                ("v", self.api_version.clone()),
            ]);

        let envelope: Envelope<UploadServer> = self.execute(request).await?;
        Ok(envelope.response)
    }

    /// Шаг 2: загрузка байтов картинки на выданный адрес.
    ///
    /// Ответ приходит плоским объектом без обёртки `response`, но поле
    /// `error` в нём возможно так же, как и в остальных методах.
    pub async fn upload_photo(&self, upload_url: &str, image_path: &Path) -> Result<UploadedPhoto> {
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo.png")
            .to_string();

        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new().part("photo", part);

        let request = self.http.post(upload_url).multipart(form);
        self.execute(request).await
    }

    /// Шаг 3: сохранение загруженной фотографии как фотографии стены.
    pub async fn save_wall_photo(
        &self,
        group_id: i64,
        uploaded: &UploadedPhoto,
    ) -> Result<SavedPhoto> {
        let request = self
            .http
            .post(format!("{}/method/photos.saveWallPhoto", self.base_url))
            .query(&[
                ("group_id", group_id.to_string()),
                ("access_token", self.token.clone()),
                ("v", self.api_version.clone()),
                ("server", uploaded.server.to_string()),
                ("photo", uploaded.photo.clone()),
                ("hash", uploaded.hash.clone()),
            ]);

        let envelope: Envelope<Vec<SavedPhoto>> = self.execute(request).await?;
        envelope.response.into_iter().next().ok_or_else(|| {
            Error::MalformedResponse("VK не вернул сохранённую фотографию".to_string())
        })
    }

    /// Шаг 4: пост на стене группы с прикреплённой фотографией.
    pub async fn post_to_wall(
        &self,
        group_id: i64,
        saved: &SavedPhoto,
        message: &str,
    ) -> Result<()> {
        let attachment = format!("photo{}_{}", saved.owner_id, saved.id);
        let request = self
            .http
            .post(format!("{}/method/wall.post", self.base_url))
            .query(&[
                ("access_token", self.token.clone()),
                ("v", self.api_version.clone()),
                ("owner_id", (-group_id).to_string()),
                ("attachments", attachment),
                ("message", message.to_string()),
                ("from_group", "1".to_string()),
            ]);

        let _: Envelope<serde_json::Value> = self.execute(request).await?;
        Ok(())
    }

    /// Полный цикл публикации: четыре шага подряд, без повторов.
    ///
    /// Любая ошибка обрывает оставшиеся шаги.
    pub async fn publish(&self, group_id: i64, image_path: &Path, message: &str) -> Result<()> {
        let upload = self.wall_upload_server(group_id).await?;
        debug!("Получен адрес загрузки");

        let uploaded = self.upload_photo(&upload.upload_url, image_path).await?;
        debug!("Картинка загружена на сервер VK");

        let saved = self.save_wall_photo(group_id, &uploaded).await?;
        self.post_to_wall(group_id, &saved, message).await?;

        info!("Пост опубликован на стене группы {}", group_id);
        Ok(())
    }
}
