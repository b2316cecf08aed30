//! Публикация случайного комикса xkcd на стене группы VK.

use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::vk::VkClient;
use crate::xkcd::XkcdClient;
use crate::{Error, Result};

/// Сообщение при сбое запроса к API xkcd.
const XKCD_FAILURE_MESSAGE: &str = "Не удалось сделать запрос к API xkcd.";
/// Сообщение при сбое запроса к API VK.
const VK_FAILURE_MESSAGE: &str = "Не удалось сделать запрос к API VK.";

/// Полный цикл: скачать случайный комикс и опубликовать его на стене.
///
/// Картинка сохраняется в текущий каталог на время публикации.
pub async fn run(config: &Config) -> Result<()> {
    let xkcd = XkcdClient::new()?;
    let vk = VkClient::new(config.vk_token.clone())?;

    run_with_clients(&xkcd, &vk, config.vk_group_id, Path::new(".")).await
}

/// То же, но с готовыми клиентами и каталогом для картинки.
///
/// Сбои запросов не превращаются в ошибку процесса: сообщение уходит в
/// stderr, а функция возвращает `Ok`.
pub async fn run_with_clients(
    xkcd: &XkcdClient,
    vk: &VkClient,
    group_id: i64,
    dir: &Path,
) -> Result<()> {
    let comic = match xkcd.fetch_random_comic(dir).await {
        Ok(comic) => comic,
        Err(err) => {
            debug!("Сбой получения комикса: {}", err);
            eprintln!("{XKCD_FAILURE_MESSAGE}");
            return Ok(());
        }
    };

    // Файл с картинкой удаляется при выходе из функции на любом пути.
    match vk.publish(group_id, comic.image.path(), &comic.caption).await {
        Ok(()) => info!("Комикс {} опубликован", comic.image.file_name()),
        Err(Error::Vk(message)) => eprintln!("{message}"),
        Err(err) => {
            debug!("Сбой публикации: {}", err);
            eprintln!("{VK_FAILURE_MESSAGE}");
        }
    }

    Ok(())
}
