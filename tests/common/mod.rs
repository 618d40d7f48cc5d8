//! Common test utilities for closet-dl integration tests

use closet_dl::Config;
use std::path::Path;

/// Seller login written by [`SCRAPER_SCRIPT`]
pub const SELLER: &str = "bob";

/// Title written by [`SCRAPER_SCRIPT`]
pub const TITLE: &str = "Vintage Jacket";

/// Stand-in downloader run through `sh -c`
///
/// `$1` is the listing URL and `$2` the working directory. URLs containing
/// `broken` exit with status 3.
pub const SCRAPER_SCRIPT: &str = r#"
case "$1" in
  *broken*) echo "listing gone" >&2; exit 3 ;;
esac
printf '{"title":"Vintage Jacket","user":{"login":"bob"},"url":"%s"}' "$1" > "$2/item.json"
printf one > "$2/photo_1.jpg"
printf two > "$2/photo_2.jpg"
printf notes > "$2/description.txt"
"#;

/// Write a configuration file under `root` that runs [`SCRAPER_SCRIPT`]
pub fn write_config(root: &Path) -> std::path::PathBuf {
    let config = serde_json::json!({
        "paths": {
            "queue_file": root.join("data/download_queue.json"),
            "ledger_file": root.join("data/downloaded_items.json"),
            "download_dir": root.join("downloads"),
        },
        "fetcher": {
            "program": "sh",
            "args": ["-c", SCRAPER_SCRIPT, "sh", "{url}", "{output_dir}"],
        },
    });
    let path = root.join("closet-dl.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

/// Load the configuration written by [`write_config`]
pub fn load_config(root: &Path) -> Config {
    Config::from_file(&write_config(root)).unwrap()
}
