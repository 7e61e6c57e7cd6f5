use env_logger::Env;
use qr_studio::history::{FileStorage, History, ItemKind, NewItem};
use qr_studio::{format_file_size, save_history, unix_millis, Preset, QrConfig};

fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let dir = std::env::temp_dir().join("qr-studio-demo");
    let mut history = History::new(FileStorage::new(dir.join("history.json")));

    for preset in Preset::ALL {
        let config = QrConfig::resolve(preset.options());
        history.add_item(NewItem::created(&config)).unwrap();
    }
    history
        .add_item(NewItem::text(ItemKind::Scanned, "https://example.com/scanned"))
        .unwrap();

    let stats = history.stats().unwrap();
    println!(
        "{} items ({} created, {} scanned)",
        stats.total, stats.created, stats.scanned
    );
    for item in history.search("example").unwrap() {
        println!("{}\t{:?}\t{}", item.id, item.kind, item.data);
    }

    let json = history.export_history().unwrap();
    let path = save_history(&dir, &json, unix_millis()).unwrap();
    println!(
        "exported to {} ({})",
        path.display(),
        format_file_size(json.len() as u64)
    );
}
