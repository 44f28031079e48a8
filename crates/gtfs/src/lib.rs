use reqwest::cookie::Jar;
use std::fs::{self, File};
use std::io::{self, copy};
use std::path::Path;
use std::sync::Arc;
use std::{error::Error, io::Cursor};

pub mod data_model;
pub mod database;
mod serde;

/// Downloads a static feed archive from `url` and extracts it into `target_dir`.
pub async fn download_gtfs(
    url: &str,
    target_dir: &Path,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let zip_name = "latest.zip";
    download_file(url, zip_name).await?;
    extract_zip(zip_name, target_dir)?;
    Ok(())
}

pub async fn download_file(
    url: &str,
    file_name: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let jar = Arc::new(Jar::default());

    let client = reqwest::Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .build()?;

    let response = client.get(url).send().await?;

    let mut file = std::fs::File::create(file_name)?;
    let mut content = Cursor::new(response.bytes().await?);
    std::io::copy(&mut content, &mut file)?;
    Ok(())
}

/// Extracts every entry of a zip archive at `filename` into `target_dir`.
pub fn extract_zip(filename: &str, target_dir: &Path) -> Result<(), io::Error> {
    let file = File::open(Path::new(filename))?;
    let mut archive = zip::ZipArchive::new(file)?;

    fs::create_dir_all(target_dir)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        let relative_path = match file.enclosed_name() {
            Some(path) => path.to_owned(),
            None => continue,
        };
        let outpath = target_dir.join(relative_path);

        if file.name().ends_with('/') {
            log::debug!("extracting directory {}", outpath.display());
            fs::create_dir_all(&outpath)?;
        } else {
            log::debug!("extracting {} ({} bytes)", outpath.display(), file.size());

            if let Some(p) = outpath.parent() {
                if !p.exists() {
                    fs::create_dir_all(p)?;
                }
            }

            let mut outfile = File::create(&outpath)?;
            copy(&mut file, &mut outfile)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}
