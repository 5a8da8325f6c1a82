//! Image download loop and zip archive.
//!
//! Downloads run as a fixed-point loop: a pass fetches every manifest
//! entry a few at a time, then the images directory's plain-file count
//! is compared against the manifest size, and passes repeat until the
//! two agree or the retry budget (three passes) is spent. A shortfall
//! after the budget runs out is tolerated silently; the archive is
//! written either way, holding whatever made it to disk.
//!
//! Fetching goes through the [`ImageFetcher`] trait so the loop's
//! convergence behavior is testable without a network.

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::models::{ImageManifestEntry, NOT_AVAILABLE};
use crate::utils::OutputPaths;

/// How many full download passes one run may spend.
const DOWNLOAD_TRIES: u32 = 3;

/// How many images may be in flight at once within a pass.
const PARALLEL_DOWNLOADS: usize = 4;

/// Name of the archive written next to the images directory.
const ARCHIVE_NAME: &str = "images.zip";

/// Fetches one image's bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>>;
}

/// [`ImageFetcher`] backed by a shared reqwest client.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Download every manifest image into the images directory, then zip it.
///
/// # Arguments
///
/// * `fetcher` - Transport for the image bytes.
/// * `manifest` - One entry per distinct image filename.
/// * `paths` - Prepared output area; images land in `paths.images_dir` and
///   the archive in `paths.root`.
///
/// # Returns
///
/// The path of the written archive. Only filesystem and archiving failures
/// are errors; individual fetches that never succeed are logged and
/// absorbed.
#[instrument(level = "info", skip_all)]
pub async fn download_and_archive<F: ImageFetcher>(
    fetcher: &F,
    manifest: &[ImageManifestEntry],
    paths: &OutputPaths,
) -> Result<PathBuf, Box<dyn Error>> {
    let target = manifest.len();
    let mut downloaded = 0usize;
    let mut tries = DOWNLOAD_TRIES;

    loop {
        if target == 0 {
            break;
        }
        if downloaded != target {
            download_pass(fetcher, manifest, &paths.images_dir).await;
            tries -= 1;
        }
        downloaded = count_plain_files(&paths.images_dir)?;
        if downloaded == target {
            break;
        }
        if tries == 0 {
            debug!(downloaded, target, "Download budget exhausted");
            break;
        }
    }

    let archive = zip_directory(&paths.images_dir, &paths.root)?;
    info!(
        downloaded,
        target,
        archive = %archive.display(),
        "Image archive written"
    );
    Ok(archive)
}

/// One full pass over the manifest. Failed entries are skipped; the caller
/// decides from the directory count whether another pass is worth it.
async fn download_pass<F: ImageFetcher>(
    fetcher: &F,
    manifest: &[ImageManifestEntry],
    images_dir: &Path,
) {
    stream::iter(manifest.iter().filter(|entry| entry.image_url != NOT_AVAILABLE))
        .for_each_concurrent(PARALLEL_DOWNLOADS, |entry| async move {
            match fetcher.fetch(&entry.image_url).await {
                Ok(bytes) => {
                    let path = images_dir.join(&entry.image_name);
                    if let Err(e) = tokio::fs::write(&path, &bytes).await {
                        warn!(error = %e, path = %path.display(), "Image write failed, skipping");
                    }
                }
                Err(e) => {
                    warn!(error = %e, url = %entry.image_url, "Image fetch failed, skipping");
                }
            }
        })
        .await;
}

fn count_plain_files(dir: &Path) -> Result<usize, std::io::Error> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// Zip every plain file in `images_dir` into `<output_root>/images.zip`.
fn zip_directory(images_dir: &Path, output_root: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let archive_path = output_root.join(ARCHIVE_NAME);
    let file = fs::File::create(&archive_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in fs::read_dir(images_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        zip.start_file(name, options)?;
        zip.write_all(&fs::read(entry.path())?)?;
    }
    zip.finish()?;

    Ok(archive_path)
}
