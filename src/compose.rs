use crate::config::QrConfig;
use crate::error::GenerateError;
use crate::logo::composite_logo;
use crate::raster::{rasterize, RasterImage};
use crate::vector::render_vector;

/// Matching vector and raster renderings of one [QrConfig].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct QrArtifact {
    /// SVG markup, logo included
    pub vector_markup: String,
    /// `pixel_size` x `pixel_size` PNG of `vector_markup`
    pub raster_image: RasterImage,
}

/// Validate `config`, encode it, place the logo if there is one, and rasterize the result.
///
/// Both artifacts come from the same markup. Each call redoes the whole pipeline and shares
/// nothing with other calls, so concurrent generations never interfere.
///
/// # Errors
///
/// Will return [GenerateError::Validation] listing every invalid field before anything is
/// encoded, [GenerateError::Encoding] when the payload doesn't fit, and
/// [GenerateError::Rasterization] when the markup can't be drawn. A logo that can't be
/// placed is not an error: the symbol is returned without it.
///
/// # Example
///
/// ```rust
/// use qr_studio::{generate, QrConfig};
///
/// let artifact = generate(&QrConfig::new("https://example.com")).unwrap();
/// assert_eq!(artifact.raster_image.width, 300);
/// assert!(artifact.vector_markup.contains("viewBox"));
/// ```
pub fn generate(config: &QrConfig) -> Result<QrArtifact, GenerateError> {
    config.validate()?;
    let vector_markup = compose_vector(config)?;
    let raster_image = rasterize(&vector_markup, config.pixel_size)?;
    Ok(QrArtifact {
        vector_markup,
        raster_image,
    })
}

fn compose_vector(config: &QrConfig) -> Result<String, GenerateError> {
    let markup = render_vector(config)?;
    Ok(match &config.logo {
        Some(logo) => composite_logo(&markup, logo, config.pixel_size),
        None => markup,
    })
}

impl QrConfig {
    /// Shorthand for [generate].
    ///
    /// # Errors
    ///
    /// See [generate]
    pub fn generate(&self) -> Result<QrArtifact, GenerateError> {
        generate(self)
    }
}

/// [generate] off the async executor, one blocking task per stage.
///
/// `token` is checked before every stage; once it's cancelled the next check returns
/// [GenerateError::Cancelled] and later stages never start. A stage already running is
/// allowed to finish and its output is dropped.
///
/// # Errors
///
/// Same as [generate], plus [GenerateError::Cancelled].
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub async fn generate_async(
    config: QrConfig,
    token: &tokio_util::sync::CancellationToken,
) -> Result<QrArtifact, GenerateError> {
    use crate::error::RasterizationError;

    let join_error = |e: tokio::task::JoinError| RasterizationError::Task(e.to_string());
    let check = || {
        if token.is_cancelled() {
            Err(GenerateError::Cancelled)
        } else {
            Ok(())
        }
    };

    check()?;
    config.validate()?;

    check()?;
    let pixel_size = config.pixel_size;
    let vector_markup = tokio::task::spawn_blocking(move || compose_vector(&config))
        .await
        .map_err(join_error)??;

    check()?;
    let markup = vector_markup.clone();
    let raster_image = tokio::task::spawn_blocking(move || rasterize(&markup, pixel_size))
        .await
        .map_err(join_error)??;

    check()?;
    Ok(QrArtifact {
        vector_markup,
        raster_image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EcLevel, Logo, LogoSource, QrVersion};
    use crate::logo::SvgDocument;

    fn logo_png() -> Vec<u8> {
        let logo = image::RgbaImage::from_pixel(64, 64, image::Rgba([220, 30, 30, 255]));
        let mut png = Vec::new();
        image::ImageEncoder::write_image(
            image::codecs::png::PngEncoder::new(&mut png),
            logo.as_raw(),
            64,
            64,
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        png
    }

    fn example() -> QrConfig {
        QrConfig::new("https://example.com")
            .with_error_correction(EcLevel::M)
            .with_pixel_size(300)
            .with_margin(4)
            .with_colors("#000000", "#FFFFFF")
    }

    fn with_logo(config: QrConfig) -> QrConfig {
        config.with_logo(Some(Logo {
            source: LogoSource::Bytes(logo_png()),
            display_size: 40,
        }))
    }

    #[test]
    fn raster_matches_pixel_size() {
        for size in [50, 123, 300, 1000] {
            let artifact = example().with_pixel_size(size).generate().unwrap();
            assert_eq!(artifact.raster_image.width, size);
            assert_eq!(artifact.raster_image.height, size);
            assert_eq!(
                artifact.raster_image.to_rgba().unwrap().dimensions(),
                (size, size)
            );
        }
    }

    #[test]
    fn blank_data_is_rejected_before_encoding() {
        for data in ["", "  \t "] {
            let err = generate(&example().with_data(data)).unwrap_err();
            assert_eq!(
                err,
                GenerateError::Validation(crate::ValidationError {
                    errors: vec!["Data must be a non-empty string".to_string()]
                })
            );
        }
    }

    #[test]
    fn validation_errors_are_aggregated() {
        let err = generate(&example().with_pixel_size(20).with_margin(30)).unwrap_err();
        match err {
            GenerateError::Validation(e) => assert_eq!(e.errors.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn plain_markup_has_no_logo() {
        let artifact = generate(&example()).unwrap();
        assert!(artifact.vector_markup.contains("viewBox=\"0 0 33 33\""));
        assert!(!artifact.vector_markup.contains("<clipPath"));
        assert!(!artifact.vector_markup.contains("<image"));
    }

    #[test]
    fn logo_is_composited() {
        let artifact = generate(&with_logo(example())).unwrap();
        assert_eq!(artifact.vector_markup.matches("<clipPath").count(), 1);
        assert_eq!(artifact.vector_markup.matches("<image").count(), 1);
        assert_eq!(
            SvgDocument::parse(&artifact.vector_markup).unwrap().view_box,
            SvgDocument::parse(&generate(&example()).unwrap().vector_markup)
                .unwrap()
                .view_box
        );
    }

    #[test]
    fn raster_shows_the_logo() {
        let pixels = generate(&with_logo(example()))
            .unwrap()
            .raster_image
            .to_rgba()
            .unwrap();
        let centre = pixels.get_pixel(150, 150).0;
        assert!(centre[0] > 180 && centre[1] < 80 && centre[2] < 80, "{:?}", centre);
    }

    #[test]
    fn identical_configs_give_matching_artifacts() {
        let first = generate(&example()).unwrap();
        let second = generate(&example()).unwrap();
        assert_eq!(first, second);

        let first = generate(&with_logo(example())).unwrap();
        let second = generate(&with_logo(example())).unwrap();
        assert_eq!(first.raster_image, second.raster_image);
        assert_eq!(first.vector_markup.len(), second.vector_markup.len());
    }

    #[test]
    fn oversized_payload_fails_cleanly() {
        let config = QrConfig::new("a".repeat(3000))
            .with_error_correction(EcLevel::H)
            .with_version(QrVersion::Auto);
        assert!(matches!(generate(&config), Err(GenerateError::Encoding(_))));
    }

    #[test]
    fn large_payload_picks_a_larger_version() {
        let config = QrConfig::new("a".repeat(1000))
            .with_error_correction(EcLevel::L)
            .with_pixel_size(1000);
        let artifact = generate(&config).unwrap();
        let view_box = SvgDocument::parse(&artifact.vector_markup).unwrap().view_box;
        assert!(view_box.width > 100.0);
    }

    #[cfg(feature = "scan")]
    mod round_trip {
        use super::*;
        use crate::scan::{decode, ImageSource};

        fn decoded(config: &QrConfig) -> String {
            let artifact = generate(config).unwrap();
            decode(ImageSource::Bytes(artifact.raster_image.png))
                .unwrap()
                .payload
        }

        #[test]
        fn example_url() {
            assert_eq!(decoded(&example()), "https://example.com");
        }

        #[test]
        fn example_url_with_logo() {
            assert_eq!(decoded(&with_logo(example())), "https://example.com");
        }

        #[test]
        fn representative_payloads() {
            let payloads = [
                "https://example.com/a?b=c",
                "The quick brown fox jumps over the dog!!",
                "WIFI:T:WPA;S:MyNetwork;P:MyPassword;;",
            ];
            for data in payloads {
                for level in [EcLevel::M, EcLevel::Q, EcLevel::H] {
                    let config = QrConfig::new(data).with_error_correction(level);
                    assert_eq!(decoded(&config), data, "{} at {}", data, level);
                }
            }
        }
    }

    #[cfg(feature = "async")]
    mod asynchronous {
        use super::*;
        use tokio_util::sync::CancellationToken;

        #[tokio::test]
        async fn matches_sync_pipeline() {
            let token = CancellationToken::new();
            let artifact = generate_async(example(), &token).await.unwrap();
            assert_eq!(artifact, generate(&example()).unwrap());
        }

        #[tokio::test]
        async fn cancelled_before_start() {
            let token = CancellationToken::new();
            token.cancel();
            assert_eq!(
                generate_async(example(), &token).await,
                Err(GenerateError::Cancelled)
            );
        }

        #[tokio::test]
        async fn validation_still_comes_first() {
            let token = CancellationToken::new();
            let err = generate_async(example().with_data(""), &token)
                .await
                .unwrap_err();
            assert!(matches!(err, GenerateError::Validation(_)));
        }
    }
}
