//! Получение случайного комикса с xkcd.
//!
//! Клиент узнаёт номер последнего выпуска, выбирает случайный номер из
//! диапазона [1, N] и скачивает картинку вместе с подписью (alt-текстом).

use std::path::{Path, PathBuf};

use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::XKCD_URL;
use crate::{Error, Result};

/// Метаданные выпуска: адрес картинки и подпись.
#[derive(Debug, Clone, Deserialize)]
pub struct ComicInfo {
    pub img: String,
    pub alt: String,
}

#[derive(Debug, Deserialize)]
struct LatestComic {
    num: u32,
}

/// Скачанный комикс: локальный файл с картинкой и подпись для поста.
#[derive(Debug)]
pub struct FetchedComic {
    pub image: ImageArtifact,
    pub caption: String,
}

/// Локальный файл с картинкой. Удаляется при выходе из области видимости.
#[derive(Debug)]
pub struct ImageArtifact {
    path: PathBuf,
}

impl ImageArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Имя файла (последний сегмент пути из URL картинки).
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

impl Drop for ImageArtifact {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!("Не удалось удалить файл {}: {}", self.path.display(), err);
        }
    }
}

/// Клиент API xkcd.
#[derive(Debug, Clone)]
pub struct XkcdClient {
    http: Client,
    base_url: String,
}

impl XkcdClient {
    /// Клиент с адресом по умолчанию.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("comic_poster/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("Не удалось построить HTTP-клиент: {}", e)))?;

        Ok(Self {
            http,
            base_url: XKCD_URL.to_string(),
        })
    }

    /// Клиент с нестандартным адресом API (в первую очередь для тестов).
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Result<Self> {
        let mut client = Self::new()?;
        client.base_url = base_url.into();
        Ok(client)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Не удалось обратиться к xkcd: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "xkcd вернул HTTP {}",
                status.as_u16()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Не удалось прочитать ответ xkcd: {}", e)))?;

        serde_json::from_str(&text).map_err(|e| {
            Error::MalformedResponse(format!("xkcd вернул не-JSON ответ: {} ({})", text, e))
        })
    }

    /// Номер последнего опубликованного выпуска.
    pub async fn latest_comic_number(&self) -> Result<u32> {
        let latest: LatestComic = self
            .get_json(&format!("{}/info.0.json", self.base_url))
            .await?;
        Ok(latest.num)
    }

    /// Метаданные конкретного выпуска.
    pub async fn comic_info(&self, number: u32) -> Result<ComicInfo> {
        self.get_json(&format!("{}/{}/info.0.json", self.base_url, number))
            .await
    }

    /// Скачивает картинку в `dir` под именем из URL.
    ///
    /// Повторное скачивание того же выпуска перезаписывает тот же файл.
    pub async fn download_image(&self, url: &str, dir: &Path) -> Result<ImageArtifact> {
        let file_name = image_file_name(url)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Не удалось скачать картинку: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "xkcd вернул HTTP {} на запрос картинки",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Не удалось прочитать картинку: {}", e)))?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;

        Ok(ImageArtifact { path })
    }

    /// Случайный выпуск: выбор номера, метаданные, картинка.
    pub async fn fetch_random_comic(&self, dir: &Path) -> Result<FetchedComic> {
        let last = self.latest_comic_number().await?;
        if last == 0 {
            return Err(Error::MalformedResponse(
                "xkcd сообщил нулевой номер последнего выпуска".to_string(),
            ));
        }

        let number = pick_comic_number(&mut rand::thread_rng(), last);
        debug!("Выбран комикс №{} из {}", number, last);

        let comic = self.comic_info(number).await?;
        let image = self.download_image(&comic.img, dir).await?;
        info!("Комикс №{} сохранён в {}", number, image.path().display());

        Ok(FetchedComic {
            image,
            caption: comic.alt,
        })
    }
}

/// Равномерный выбор номера выпуска из диапазона [1, last].
fn pick_comic_number<R: Rng>(rng: &mut R, last: u32) -> u32 {
    rng.gen_range(1..=last)
}

/// Имя файла - последний сегмент пути в URL картинки.
fn image_file_name(url: &str) -> Result<&str> {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::MalformedResponse(format!("В URL картинки нет имени файла: {}", url))
        })
}
