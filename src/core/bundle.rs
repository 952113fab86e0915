use crate::domain::model::BundleLayout;
use crate::utils::error::{RenewError, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const NGINX_PREFIX: &str = "Nginx/";

/// `Full` when saving into the OS temp directory, `Nginx` for anything else.
pub fn default_layout(save_dir: &Path) -> BundleLayout {
    if same_dir(save_dir, &std::env::temp_dir()) {
        BundleLayout::Full
    } else {
        BundleLayout::Nginx
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.components().eq(b.components()),
    }
}

/// Extracts a downloaded certificate bundle and returns the written files.
pub fn install_bundle(
    bundle: &[u8],
    save_dir: &Path,
    layout: BundleLayout,
    domain: &str,
) -> Result<Vec<PathBuf>> {
    let mut archive = ZipArchive::new(Cursor::new(bundle))?;
    let base = match layout {
        BundleLayout::Full => save_dir.join(domain),
        BundleLayout::Nginx => save_dir.to_path_buf(),
    };
    fs::create_dir_all(&base)?;

    let mut written = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };

        let relative = match layout {
            BundleLayout::Full => relative,
            BundleLayout::Nginx => {
                if entry.is_dir() || !entry.name().starts_with(NGINX_PREFIX) {
                    continue;
                }
                match relative.strip_prefix("Nginx") {
                    Ok(rest) if rest.components().next().is_some() => rest.to_path_buf(),
                    _ => continue,
                }
            }
        };

        let target = base.join(&relative);
        if entry.is_dir() {
            tracing::debug!("Creating directory {}", target.display());
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!("Unzipping file: {}", target.display());
        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&target)?;
        io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777))?;
            }
        }

        written.push(target);
    }

    if written.is_empty() {
        return Err(RenewError::BundleError {
            message: match layout {
                BundleLayout::Nginx => format!("bundle for {} has no {} entries", domain, NGINX_PREFIX),
                BundleLayout::Full => format!("bundle for {} is empty", domain),
            },
        });
    }

    Ok(written)
}
