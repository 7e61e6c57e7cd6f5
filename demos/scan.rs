use env_logger::Env;
use qr_studio::{classify, decode, ImageSource};

fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    for path in std::env::args().skip(1) {
        match decode(ImageSource::File(path.clone().into())) {
            Ok(result) => {
                let classification = classify(&result.payload);
                println!(
                    "{}\t{:?}\t{}",
                    path, classification.kind, classification.sanitized
                );
            }
            Err(e) => eprintln!("{}\t{}", path, e),
        }
    }
}
