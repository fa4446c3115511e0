//! Template asset loading.

use image::GrayImage;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading the template image.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to load template {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("template {0} has no pixels")]
    Empty(String),
}

/// Loads an image file and converts it to grayscale.
pub fn load_template(path: impl AsRef<Path>) -> Result<GrayImage, TemplateError> {
    let path = path.as_ref();
    let template = image::open(path)
        .map_err(|source| TemplateError::Load {
            path: path.display().to_string(),
            source,
        })?
        .to_luma8();

    if template.width() == 0 || template.height() == 0 {
        return Err(TemplateError::Empty(path.display().to_string()));
    }

    tracing::info!(
        path = %path.display(),
        width = template.width(),
        height = template.height(),
        "Loaded template"
    );
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_missing_file_reported() {
        assert!(matches!(
            load_template("/nonexistent/template.png"),
            Err(TemplateError::Load { .. })
        ));
    }

    #[test]
    fn test_round_trip_png() {
        let path =
            std::env::temp_dir().join(format!("adimate-template-{}.png", std::process::id()));
        GrayImage::from_fn(5, 3, |x, y| Luma([(x * 50 + y) as u8]))
            .save(&path)
            .unwrap();

        let template = load_template(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(template.dimensions(), (5, 3));
        assert_eq!(template.get_pixel(2, 1).0[0], 101);
    }
}
