use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use facecrop::config::{CACHE_DIR_ENV, DEFAULT_MODEL_URL, ModelCacheConfig, ThumbConfig};
use facecrop::model::ModelCache;
use facecrop::thumbnail::{FaceCropper, variant_path};
use facecrop::{FaceRect, calculate_crop_rect};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Face-aware square thumbnails for static gallery builds.
#[derive(Parser, Debug)]
#[command(name = "facecrop", version)]
#[command(about = "Crop square thumbnails around faces, with a cached detection model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the square crop for a face box as JSON
    Crop {
        /// Face box as X,Y,WIDTH,HEIGHT
        #[arg(long, value_parser = parse_face)]
        face: FaceRect,

        /// Source image size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_image_size)]
        image: (u32, u32),

        /// Multiplier applied to the face square
        #[arg(short, long, default_value_t = 2.0)]
        padding: f64,
    },

    /// Render square thumbnails from an image file
    Thumb {
        /// Source image
        input: PathBuf,

        /// Output image; with several sizes each is written as <stem>-<size>.<ext>
        output: PathBuf,

        /// Face box as X,Y,WIDTH,HEIGHT; the image center is used when omitted
        #[arg(long, value_parser = parse_face)]
        face: Option<FaceRect>,

        /// Multiplier applied to the face square
        #[arg(short, long, default_value_t = 2.0)]
        padding: f64,

        /// Thumbnail side length in pixels (repeatable)
        #[arg(short, long = "size", default_value = "256")]
        sizes: Vec<u32>,
    },

    /// Download the detection model into the cache if it is missing
    Model {
        /// Cache root; the model is stored under <DIR>/models
        #[arg(long, env = CACHE_DIR_ENV)]
        cache_dir: Option<PathBuf>,

        /// Model URL
        #[arg(long, default_value = DEFAULT_MODEL_URL)]
        url: String,

        /// Delete the cached copy before downloading
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Crop {
            face,
            image,
            padding,
        } => {
            ThumbConfig {
                padding,
                ..ThumbConfig::default()
            }
            .validate()?;
            let crop = calculate_crop_rect(face, padding, image.0, image.1);
            println!("{}", serde_json::to_string(&crop)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Thumb {
            input,
            output,
            face,
            padding,
            sizes,
        } => {
            let multiple = sizes.len() > 1;
            let cropper = FaceCropper::new(ThumbConfig { padding, sizes })?;
            let image = image::open(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;

            for thumb in cropper.thumbnails_with_face(&image, face)? {
                let path = if multiple {
                    variant_path(&output, thumb.size)
                } else {
                    output.clone()
                };
                thumb
                    .image
                    .save(&path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(
                    path = %path.display(),
                    size = thumb.size,
                    crop = ?thumb.crop,
                    "wrote thumbnail"
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Model {
            cache_dir,
            url,
            refresh,
        } => {
            let mut config = ModelCacheConfig::default().with_url(url);
            config.cache_dir = cache_dir;
            config.validate()?;

            let cache = ModelCache::with_reqwest(config)?;
            match fetch_model(&cache, refresh).await? {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    warn!("model is not available; thumbnails will use center crops");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Make sure the model is cached, dropping the old copy first on refresh
async fn fetch_model(cache: &ModelCache, refresh: bool) -> Result<Option<PathBuf>> {
    let hint = || format!("set --cache-dir or {CACHE_DIR_ENV}");
    if refresh {
        cache.remove().await.with_context(hint)?;
    }
    cache.ensure().await.with_context(hint)
}

/// Parse "X,Y,WIDTH,HEIGHT" into a face box
fn parse_face(value: &str) -> Result<FaceRect> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| anyhow!("Invalid face box: {value}. Use X,Y,WIDTH,HEIGHT"))?;

    match parts.as_slice() {
        &[x, y, width, height] if width >= 0.0 && height >= 0.0 => {
            Ok(FaceRect::new(x, y, width, height))
        }
        &[_, _, _, _] => Err(anyhow!("Face width and height must not be negative: {value}")),
        _ => Err(anyhow!("Invalid face box: {value}. Use X,Y,WIDTH,HEIGHT")),
    }
}

/// Parse "WIDTHxHEIGHT" into image dimensions
fn parse_image_size(value: &str) -> Result<(u32, u32)> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("Invalid image size: {value}. Use WIDTHxHEIGHT"))?;
    let width: u32 = w.trim().parse().map_err(|_| anyhow!("Invalid width: {w}"))?;
    let height: u32 = h.trim().parse().map_err(|_| anyhow!("Invalid height: {h}"))?;
    if width == 0 || height == 0 {
        return Err(anyhow!("Image dimensions must be greater than 0: {value}"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_face_box() {
        let face = parse_face("100, 50,40,60.5").unwrap();
        assert_eq!(face, FaceRect::new(100.0, 50.0, 40.0, 60.5));
        assert!(parse_face("1,2,3").is_err());
        assert!(parse_face("1,2,-3,4").is_err());
        assert!(parse_face("a,b,c,d").is_err());
    }

    #[test]
    fn parses_image_size() {
        assert_eq!(parse_image_size("800x600").unwrap(), (800, 600));
        assert_eq!(parse_image_size("64X48").unwrap(), (64, 48));
        assert!(parse_image_size("800").is_err());
        assert!(parse_image_size("0x10").is_err());
    }

    #[tokio::test]
    async fn missing_cache_dir_error_names_the_setting() {
        let cache = ModelCache::with_reqwest(ModelCacheConfig::default()).unwrap();
        for refresh in [false, true] {
            let err = fetch_model(&cache, refresh).await.unwrap_err();
            let message = format!("{err:#}");
            assert!(message.contains("--cache-dir"), "{message}");
            assert!(message.contains(CACHE_DIR_ENV), "{message}");
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
