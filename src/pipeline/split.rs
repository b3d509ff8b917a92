//! Cut a flashcard page into question (top half) and answer (bottom half).

use crate::error::SplitError;
use crate::logging::Logger;
use crate::output::{ContentHash, ImagePair};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// `({base}_{hash8}_question.png, {base}_{hash8}_answer.png)`
pub fn output_file_names(base: &str, hash: &ContentHash) -> (String, String) {
    let short = hash.short();
    (
        format!("{base}_{short}_question.png"),
        format!("{base}_{short}_answer.png"),
    )
}

/// Writes question/answer PNGs under a fixed output directory.
#[derive(Debug, Clone)]
pub struct Splitter {
    output_dir: PathBuf,
    logger: Logger,
}

impl Splitter {
    /// Creates `output_dir` (and parents) if missing.
    pub fn new(output_dir: impl Into<PathBuf>, logger: Logger) -> Result<Self, SplitError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|e| SplitError::OutputDir {
            path: output_dir.clone(),
            source: e,
        })?;
        Ok(Self { output_dir, logger })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Split `img` at `height / 2`. Rows `[0, mid)` become the question,
    /// rows `[mid, height)` the answer; both keep the full width.
    ///
    /// The question file is written first. If the answer write then fails the
    /// question file stays on disk.
    pub fn split(
        &self,
        img: &DynamicImage,
        base: &str,
        hash: &ContentHash,
    ) -> Result<ImagePair, SplitError> {
        self.logger.in_scope(|| {
            let (width, height) = img.dimensions();
            if width == 0 || height < 2 {
                return Err(SplitError::Degenerate { width, height });
            }
            let mid = height / 2;

            let (q_name, a_name) = output_file_names(base, hash);
            let question = self.output_dir.join(q_name);
            let answer = self.output_dir.join(a_name);

            save_png(&img.crop_imm(0, 0, width, mid), &question)?;
            save_png(&img.crop_imm(0, mid, width, height - mid), &answer)?;

            debug!("Created question image: {}", question.display());
            debug!("Created answer image: {}", answer.display());

            Ok(ImagePair {
                question,
                answer,
                hash: hash.clone(),
            })
        })
    }

    /// Decode the image at `path` and [`split`](Self::split) it.
    pub fn split_file(
        &self,
        path: &Path,
        base: &str,
        hash: &ContentHash,
    ) -> Result<ImagePair, SplitError> {
        let img = self.logger.in_scope(|| {
            debug!("Splitting image: {}", path.display());
            image::open(path).map_err(|e| SplitError::Decode {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        self.split(&img, base, hash)
    }
}

fn save_png(img: &DynamicImage, path: &Path) -> Result<(), SplitError> {
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| SplitError::Write {
            path: path.to_path_buf(),
            source: e,
        })
}
