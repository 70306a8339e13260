//! # Thumbnail Rendering
//!
//! Turns a source image into square thumbnails, centered on a face when one is
//! known and on the image center otherwise.
//!
//! ## Flow
//!
//! 1. [`FaceCropper::prepare`] asks the [`ModelCache`] for the detection model
//!    and hands it to a [`DetectorLoader`]. If either step fails the cropper
//!    runs in [`CropMode::Center`] for the rest of the build.
//! 2. [`FaceCropper::thumbnails`] detects faces, keeps the best one
//!    ([`choose_face`]), plans the crop ([`plan_crop`]) and renders one image
//!    per configured size ([`render_square`]).
//!
//! Inference itself lives behind [`FaceDetector`]; this module only consumes
//! the boxes it reports.

use std::path::{Path, PathBuf};

use crop_geom::{FaceRect, SquareRect, calculate_crop_rect, center_square};
use fast_image_resize as fir;
use fir::images::{Image, ImageRef};
use fir::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbaImage};
use tracing::{debug, warn};

use crate::config::ThumbConfig;
use crate::error::{FaceCropError, FaceCropResult};
use crate::model::ModelCache;

/// One face reported by a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub rect: FaceRect,
    pub score: f32,
}

/// Finds faces in a decoded image.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> FaceCropResult<Vec<Detection>>;
}

/// Builds a detector from a model file on disk.
pub trait DetectorLoader: Send + Sync {
    fn load(&self, model_path: &Path) -> FaceCropResult<Box<dyn FaceDetector>>;
}

/// Whether crops follow detected faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    FaceAware,
    Center,
}

/// A rendered thumbnail and the source region it was taken from.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub size: u32,
    pub crop: SquareRect,
    pub image: RgbaImage,
}

/// Highest-scoring detection; equal scores go to the larger box. Detections
/// with a non-finite score are ignored.
pub fn choose_face(detections: &[Detection]) -> Option<FaceRect> {
    detections
        .iter()
        .filter(|d| d.score.is_finite())
        .max_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then(a.rect.area().total_cmp(&b.rect.area()))
        })
        .map(|d| d.rect)
}

/// Crop around `face` if there is one, otherwise the centered square.
///
/// A face too small to cover a whole pixel after rounding also gets the
/// centered square.
pub fn plan_crop(face: Option<FaceRect>, padding: f64, width: u32, height: u32) -> SquareRect {
    let Some(face) = face else {
        return center_square(width, height);
    };
    let crop = calculate_crop_rect(face, padding, width, height);
    if crop.size <= 0 {
        warn!(?face, padding, "face crop is empty, using center crop");
        return center_square(width, height);
    }
    crop
}

/// Cut `crop` out of `source` and scale it to `out_size` x `out_size`.
///
/// # Errors
///
/// - [`FaceCropError::ZeroDimensions`] for an empty source or `out_size == 0`
/// - [`FaceCropError::InvalidCrop`] when `crop` is empty or overhangs the image
pub fn render_square(
    source: &RgbaImage,
    crop: SquareRect,
    out_size: u32,
) -> FaceCropResult<RgbaImage> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 || out_size == 0 {
        return Err(FaceCropError::ZeroDimensions);
    }
    let (x, y, side, _) = crop
        .as_crop_box(width, height)
        .ok_or(FaceCropError::InvalidCrop)?;

    let src = ImageRef::new(width, height, source.as_raw(), PixelType::U8x4)
        .map_err(FaceCropError::image)?;
    let mut dst = Image::new(out_size, out_size, PixelType::U8x4);

    let options = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3))
        .crop(f64::from(x), f64::from(y), f64::from(side), f64::from(side));
    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(FaceCropError::image)?;

    RgbaImage::from_raw(out_size, out_size, dst.into_vec())
        .ok_or_else(|| FaceCropError::image("resized buffer has unexpected length"))
}

/// `<stem>-<size>.<ext>` next to `output`, used for multi-size renders.
pub fn variant_path(output: &Path, size: u32) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}-{size}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{size}"),
    };
    output.with_file_name(name)
}

/// Face-aware thumbnailer that degrades to center crops.
pub struct FaceCropper {
    config: ThumbConfig,
    detector: Option<Box<dyn FaceDetector>>,
}

impl FaceCropper {
    /// Cropper that always uses center crops.
    pub fn new(config: ThumbConfig) -> FaceCropResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: None,
        })
    }

    /// Cropper with an already-loaded detector.
    pub fn with_detector(
        config: ThumbConfig,
        detector: Box<dyn FaceDetector>,
    ) -> FaceCropResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: Some(detector),
        })
    }

    /// Fetch the model if needed and load a detector from it.
    ///
    /// An unavailable model or a loader failure is logged and yields a
    /// center-crop cropper.
    ///
    /// # Errors
    ///
    /// Invalid `config`, or a cache without a cache directory.
    pub async fn prepare(
        cache: &ModelCache,
        loader: &dyn DetectorLoader,
        config: ThumbConfig,
    ) -> FaceCropResult<Self> {
        config.validate()?;
        let Some(model_path) = cache.ensure().await? else {
            warn!("detection model unavailable, using center crops");
            return Self::new(config);
        };
        match loader.load(&model_path) {
            Ok(detector) => {
                debug!(model = %model_path.display(), "face detector loaded");
                Self::with_detector(config, detector)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    model = %model_path.display(),
                    "failed to load face detector, using center crops"
                );
                Self::new(config)
            }
        }
    }

    pub fn mode(&self) -> CropMode {
        if self.detector.is_some() {
            CropMode::FaceAware
        } else {
            CropMode::Center
        }
    }

    pub fn config(&self) -> &ThumbConfig {
        &self.config
    }

    /// Best face in `image`, or `None` in center mode, when nothing was found,
    /// or when detection failed.
    pub fn detect_face(&self, image: &DynamicImage) -> Option<FaceRect> {
        let detector = self.detector.as_ref()?;
        match detector.detect(image) {
            Ok(detections) => choose_face(&detections),
            Err(err) => {
                warn!(error = %err, "face detection failed, using center crop");
                None
            }
        }
    }

    /// Detect, crop and render every configured size.
    pub fn thumbnails(&self, image: &DynamicImage) -> FaceCropResult<Vec<Thumbnail>> {
        let face = self.detect_face(image);
        self.thumbnails_with_face(image, face)
    }

    /// Render every configured size around a face found elsewhere.
    pub fn thumbnails_with_face(
        &self,
        image: &DynamicImage,
        face: Option<FaceRect>,
    ) -> FaceCropResult<Vec<Thumbnail>> {
        let source = image.to_rgba8();
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(FaceCropError::ZeroDimensions);
        }
        let crop = plan_crop(face, self.config.padding, width, height);
        debug!(?face, ?crop, width, height, "planned crop");

        self.config
            .sizes
            .iter()
            .map(|&size| {
                Ok(Thumbnail {
                    size,
                    crop,
                    image: render_square(&source, crop, size)?,
                })
            })
            .collect()
    }
}
