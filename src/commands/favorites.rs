use anyhow::Result;

use pinwall::app::App;
use pinwall::config::Config;
use pinwall::models::Record;

pub async fn favorites_list(config: Config) -> Result<()> {
    let app = App::open(config).await?;
    let favorites = app.favorites.list().await?;

    if favorites.is_empty() {
        println!("No favorites yet.");
        return Ok(());
    }

    for (i, record) in favorites.iter().enumerate() {
        println!("{i:>3}. {} ({})", record.title, record.url);
    }
    Ok(())
}

pub async fn favorites_toggle(config: Config, url: String, title: Option<String>) -> Result<()> {
    let app = App::open(config).await?;

    let mut record = Record::new(url);
    if let Some(title) = title {
        record = record.with_title(title);
    }

    let outcome = app.favorites.toggle(record).await?;
    println!("{}", if outcome.added { "Added to favorites" } else { "Removed from favorites" });
    Ok(())
}

pub async fn favorites_remove(config: Config, index: usize) -> Result<()> {
    let app = App::open(config).await?;
    let removed = app.favorites.remove(index).await?;
    println!("Removed {} ({})", removed.title, removed.url);
    Ok(())
}
