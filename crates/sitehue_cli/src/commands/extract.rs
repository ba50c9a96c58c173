//! `sitehue extract` subcommand.

use anyhow::{anyhow, Result};
use sitehue_core::{PaletteKey, ThemeStore, WebsiteData};
use sitehue_extract::{ExtractConfig, WebsiteDataAssembler};

use crate::output;

pub async fn handle(url: &str, shuffle: bool) -> Result<()> {
    let config = ExtractConfig::from_env()?;
    let assembler = WebsiteDataAssembler::from_config(&config)?;
    let url = with_scheme(url);

    let spinner = output::spinner(&format!("Extracting colors from {url}"));
    let result = assembler.extract(&url).await;
    spinner.finish_and_clear();

    let mut data = result.map_err(|e| anyhow!("{}: {e}", e.user_message()))?;
    if shuffle {
        let theme = ThemeStore::new();
        theme.set_palette(data.colors.palette.clone(), Some(data.colors.favicon.as_slice()));
        data.colors.palette = theme.shuffle();
    }

    render(&data);
    Ok(())
}

/// Assume https when the user typed a bare host.
fn with_scheme(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn render(data: &WebsiteData) {
    if output::is_json() {
        output::data("website", data);
        return;
    }

    output::header(if data.title.is_empty() { data.url.as_str() } else { data.title.as_str() });
    if !data.description.is_empty() {
        output::dim(&data.description);
    }
    output::kv("url", &data.url);
    output::kv("favicon", if data.favicon.is_empty() { "-" } else { data.favicon.as_str() });
    println!();

    let mut table = output::table();
    output::table_header(&mut table, &["Slot", "Color", ""]);
    for key in PaletteKey::ALL {
        output::color_row(&mut table, key.as_str(), data.colors.palette.get(key));
    }
    println!("{table}");

    for (label, colors) in [("CSS", &data.colors.css), ("Favicon", &data.colors.favicon)] {
        if colors.is_empty() {
            continue;
        }
        println!();
        output::header(&format!("{label} colors"));
        let mut table = output::table();
        output::table_header(&mut table, &["#", "Color", ""]);
        for (i, color) in colors.iter().enumerate() {
            output::color_row(&mut table, &(i + 1).to_string(), color);
        }
        println!("{table}");
    }
}
