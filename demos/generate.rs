use env_logger::Env;
use qr_studio::{
    generate, save_artifact, unix_millis, EcLevel, ExportFormat, Logo, LogoSource, QrConfig,
};

fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let mut args = std::env::args().skip(1);
    let data = args.next().unwrap_or_else(|| "https://example.com".to_string());
    let logo = args
        .next()
        .map(|path| std::fs::read(path).unwrap())
        .map(|bytes| Logo::new(LogoSource::Bytes(bytes)));

    let config = QrConfig::new(data)
        .with_error_correction(if logo.is_some() { EcLevel::H } else { EcLevel::M })
        .with_pixel_size(512)
        .with_logo(logo);
    let artifact = generate(&config).unwrap();

    let dir = std::env::current_dir().unwrap();
    let timestamp = unix_millis();
    for format in [ExportFormat::Png, ExportFormat::Svg, ExportFormat::Jpg] {
        let path = save_artifact(&dir, &artifact, format, timestamp).unwrap();
        println!("{}", path.display());
    }
}
