//! Template matching against captured frames.
//!
//! Scores every alignment of the template with the normalized squared
//! difference `Σ(T−I)² / sqrt(ΣT²·ΣI²)`. Lower is better; zero is a
//! pixel-exact match. Rows of the score map are computed in parallel;
//! the scan for the first hit stays sequential.

use super::{DetectionConfig, DetectionError};
use crate::capture::Frame;
use image::GrayImage;
use imageproc::template_matching::{match_template_parallel, MatchTemplateMethod};

/// Outcome of running detection on one frame.
///
/// The frame is carried along so the caller can hand it to the state
/// machine without cloning.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Center of the matched region in frame coordinates.
    pub point: Option<(u32, u32)>,
    /// Score of the reported match.
    pub score: Option<f32>,
    /// The frame that was searched.
    pub frame: Frame,
}

impl Detection {
    /// A detection result with no match.
    pub fn none(frame: Frame) -> Self {
        Self {
            point: None,
            score: None,
            frame,
        }
    }

    /// Returns true if the template was found.
    pub fn is_found(&self) -> bool {
        self.point.is_some()
    }
}

/// Locates the overlay template in frames.
///
/// Reports the first offset in row-major scan order whose score is at or
/// below the threshold, not the best-scoring one.
pub struct AdDetector {
    template: GrayImage,
    scaled_template: GrayImage,
    threshold: f32,
    scale: u32,
}

impl AdDetector {
    /// Creates a detector for the given grayscale template.
    pub fn new(template: GrayImage, config: &DetectionConfig) -> Self {
        let scale = config.search_scale.max(1);
        let scaled_template = downscale(&template, scale);
        Self {
            template,
            scaled_template,
            threshold: config.threshold,
            scale,
        }
    }

    /// Returns the full-resolution template.
    pub fn template(&self) -> &GrayImage {
        &self.template
    }

    /// Searches the frame for the template.
    ///
    /// Matching errors are logged and reported as "not found".
    pub fn detect(&self, frame: Frame) -> Detection {
        match self.find(&frame) {
            Ok(Some((point, score))) => {
                tracing::debug!(x = point.0, y = point.1, score, "Template matched");
                Detection {
                    point: Some(point),
                    score: Some(score),
                    frame,
                }
            }
            Ok(None) => Detection::none(frame),
            Err(e) => {
                tracing::debug!(error = %e, "Template matching failed");
                Detection::none(frame)
            }
        }
    }

    /// Returns the center of the first qualifying offset and its score.
    pub fn find(&self, frame: &Frame) -> Result<Option<((u32, u32), f32)>, DetectionError> {
        let (tw, th) = self.scaled_template.dimensions();
        if tw == 0 || th == 0 {
            return Err(DetectionError::EmptyTemplate);
        }

        let luma = downscale(&frame.to_luma(), self.scale);
        let (iw, ih) = luma.dimensions();
        if tw > iw || th > ih {
            return Err(DetectionError::TemplateTooLarge {
                template: (tw, th),
                image: (iw, ih),
            });
        }

        let scores = match_template_parallel(
            &luma,
            &self.scaled_template,
            MatchTemplateMethod::SumOfSquaredErrorsNormalized,
        );

        let first = scores
            .enumerate_pixels()
            .find(|(_, _, score)| score.0[0] <= self.threshold)
            .map(|(x, y, score)| ((x, y), score.0[0]));

        Ok(first.map(|((x, y), score)| {
            let (full_w, full_h) = self.template.dimensions();
            let cx = (x * self.scale + full_w / 2).min(frame.width() - 1);
            let cy = (y * self.scale + full_h / 2).min(frame.height() - 1);
            ((cx, cy), score)
        }))
    }
}

/// Decimates by taking the top-left pixel of every `scale`×`scale` block.
fn downscale(image: &GrayImage, scale: u32) -> GrayImage {
    if scale <= 1 {
        return image.clone();
    }
    GrayImage::from_fn(image.width() / scale, image.height() / scale, |x, y| {
        *image.get_pixel(x * scale, y * scale)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DEFAULT_THRESHOLD;
    use image::imageops;
    use image::{Luma, Rgba, RgbaImage};
    use proptest::prelude::*;

    /// Deterministic high-frequency noise so that misaligned offsets score badly.
    fn noise(x: u32, y: u32, seed: u32) -> u8 {
        let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77) ^ seed;
        h ^= h >> 15;
        h = h.wrapping_mul(0x2C1B_3C6D);
        h ^= h >> 12;
        (h & 0xFF) as u8
    }

    fn gray_frame(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Frame {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let v = f(x, y);
            Rgba([v, v, v, 255])
        });
        Frame::new(image, 1)
    }

    fn crop(frame: &Frame, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
        imageops::crop_imm(&frame.to_luma(), x, y, w, h).to_image()
    }

    fn detector(template: GrayImage) -> AdDetector {
        AdDetector::new(template, &DetectionConfig::default())
    }

    #[test]
    fn test_finds_exact_copy() {
        let frame = gray_frame(64, 48, |x, y| noise(x, y, 1));
        let detector = detector(crop(&frame, 20, 12, 10, 6));

        let detection = detector.detect(frame);
        assert_eq!(detection.point, Some((25, 15)));
        assert!(detection.score.unwrap() <= 1e-6);
    }

    #[test]
    fn test_reports_first_not_best_match() {
        let patch = |x: u32, y: u32| noise(x, y, 99);
        let frame = gray_frame(64, 64, |x, y| {
            if (30..38).contains(&x) && (40..48).contains(&y) {
                patch(x - 30, y - 40)
            } else if (5..13).contains(&x) && (10..18).contains(&y) {
                // Slightly perturbed copy earlier in scan order.
                patch(x - 5, y - 10).saturating_add(((x + y) % 3) as u8)
            } else {
                noise(x, y, 7)
            }
        });
        let detector = detector(crop(&frame, 30, 40, 8, 8));

        let detection = detector.detect(frame);
        assert_eq!(detection.point, Some((9, 14)));
        assert!(detection.score.unwrap() > 0.0);
    }

    #[test]
    fn test_parallel_scores_keep_first_hit() {
        let patch = |x: u32, y: u32| noise(x, y, 42);
        let frame = gray_frame(48, 40, |x, y| {
            let in_copy = |ox: u32, oy: u32| (ox..ox + 6).contains(&x) && (oy..oy + 5).contains(&y);
            if in_copy(30, 25) {
                patch(x - 30, y - 25)
            } else if in_copy(8, 4) {
                patch(x - 8, y - 4)
            } else {
                noise(x, y, 13)
            }
        });
        let template = crop(&frame, 30, 25, 6, 5);

        let sequential = imageproc::template_matching::match_template(
            &frame.to_luma(),
            &template,
            MatchTemplateMethod::SumOfSquaredErrorsNormalized,
        );
        let expected = sequential
            .enumerate_pixels()
            .find(|(_, _, score)| score.0[0] <= DEFAULT_THRESHOLD)
            .map(|(x, y, _)| (x + 3, y + 2));

        assert_eq!(expected, Some((11, 6)));
        assert_eq!(detector(template).detect(frame).point, expected);
    }

    #[test]
    fn test_absent_template_not_found() {
        let frame = gray_frame(48, 48, |x, y| noise(x, y, 3));
        let template = GrayImage::from_fn(8, 8, |x, y| Luma([noise(x, y, 4)]));

        assert!(!detector(template).detect(frame).is_found());
    }

    #[test]
    fn test_oversized_template_is_error_and_not_found() {
        let frame = gray_frame(8, 8, |x, y| noise(x, y, 5));
        let detector = detector(GrayImage::new(16, 4));

        assert!(matches!(
            detector.find(&frame),
            Err(DetectionError::TemplateTooLarge { .. })
        ));
        assert!(!detector.detect(frame).is_found());
    }

    #[test]
    fn test_empty_template_is_error() {
        let frame = gray_frame(8, 8, |x, y| noise(x, y, 5));
        let detector = detector(GrayImage::new(0, 0));

        assert!(matches!(
            detector.find(&frame),
            Err(DetectionError::EmptyTemplate)
        ));
    }

    #[test]
    fn test_downscaled_search_maps_back_to_frame() {
        // 2x2 blocks survive decimation by two unchanged.
        let frame = gray_frame(64, 48, |x, y| noise(x / 2, y / 2, 11));
        let config = DetectionConfig {
            search_scale: 2,
            ..DetectionConfig::default()
        };
        let detector = AdDetector::new(crop(&frame, 20, 12, 16, 16), &config);

        assert_eq!(detector.detect(frame).point, Some((28, 20)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_detection_is_idempotent_and_in_bounds(
            width in 8u32..40,
            height in 8u32..40,
            tw in 1u32..8,
            th in 1u32..8,
            ox in 0u32..32,
            oy in 0u32..32,
            seed in any::<u32>(),
        ) {
            let frame = gray_frame(width, height, |x, y| noise(x, y, seed));
            let ox = ox % (width - tw + 1);
            let oy = oy % (height - th + 1);
            let detector = detector(crop(&frame, ox, oy, tw, th));

            let first = detector.detect(frame.clone());
            let second = detector.detect(frame);
            prop_assert_eq!(first.point, second.point);

            if let Some((x, y)) = first.point {
                prop_assert!(x < width);
                prop_assert!(y < height);
            }
        }
    }
}
