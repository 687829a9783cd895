//! Retrieval of finished subset jobs from the downscaled projection archive.

use {
    crate::{
        climate::ftp::{FtpClient, FtpError},
        layout::Layout,
        parameters::{Method, Parameters},
        utils::file_name,
    },
    anyhow::{bail, Context, Result},
    log::info,
    regex::Regex,
    std::{
        fs::{self, File},
        io::BufWriter,
        path::{Path, PathBuf},
    },
};

const EXTRACTION_PREFIX: &str = "Extraction";

/// Job identifier from the archive's notification email, without any `.job` suffix.
pub fn job_id(raw: &str) -> Result<String> {
    let job = raw.trim().trim_end_matches(".job");
    let re = Regex::new(r"^20[0-9]{10}.+_[a-zA-Z0-9_]{6}$")?;
    if !re.is_match(job) {
        bail!("Job identifier \"{}\" is invalid", raw);
    }
    Ok(job.to_string())
}

/// Remote directory holding a job's results
pub fn remote_path(root: &str, job: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), job)
}

/// Mirrors `remote` below `local`. Entries that cannot be retrieved as files
/// are descended into as directories.
fn mirror(ftp: &mut FtpClient, remote: &str, local: &Path) -> Result<usize> {
    fs::create_dir_all(local).with_context(|| format!("Failed to create {}", local.display()))?;

    let mut count = 0;
    for name in ftp.list(remote)? {
        let remote_entry = format!("{}/{}", remote, name);
        let local_entry = local.join(&name);

        let mut file = BufWriter::new(
            File::create(&local_entry).with_context(|| format!("Failed to create {}", local_entry.display()))?,
        );
        match ftp.retrieve(&remote_entry, &mut file) {
            Ok(bytes) => {
                info!("Retrieved {} ({} bytes)", remote_entry, bytes);
                count += 1;
            }
            Err(FtpError::Unavailable { .. }) => {
                drop(file);
                fs::remove_file(&local_entry)?;
                count += mirror(ftp, &remote_entry, &local_entry)?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(count)
}

/// Moves `Extraction*` files out of `from` into `to`, renamed
/// `<watershed>_<tag><rest>`, e.g. `Extraction_pr.nc` to `GO1_B_pr.nc`.
pub fn collect_extractions(from: &Path, to: &Path, watershed: &str, tag: &str) -> Result<Vec<PathBuf>> {
    let mut moved = vec![];
    let mut entries: Vec<PathBuf> = fs::read_dir(from)
        .with_context(|| format!("Failed to list {}", from.display()))?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    for path in entries {
        let name = file_name(&path);
        if let Some(rest) = name.strip_prefix(EXTRACTION_PREFIX) {
            let target = to.join(format!("{}_{}{}", watershed, tag, rest));
            fs::rename(&path, &target)
                .with_context(|| format!("Failed to move {} to {}", path.display(), target.display()))?;
            moved.push(target);
        }
    }
    Ok(moved)
}

/// Downloads a subset job into the method's netCDF directory and moves its
/// extraction files into place.
pub fn download(params: &Parameters, watershed: &str, method: &Method, job: &str) -> Result<()> {
    let job = job_id(job)?;
    let layout = Layout::new(params, watershed);
    let destination = layout.netcdf(method);
    let remote = remote_path(&params.environment.ftp_root, &job);
    let local = destination.join(remote.trim_start_matches('/'));

    let mut ftp = FtpClient::connect(&params.environment.ftp_host)
        .with_context(|| format!("Failed to connect to {}", params.environment.ftp_host))?;
    info!("Connected to {}", params.environment.ftp_host);

    let count = mirror(&mut ftp, &remote, &local)?;
    ftp.quit()?;
    info!("Downloaded {} files from {}", count, remote);

    let moved = collect_extractions(&local.join(&method.archive_directory), &destination, watershed, &method.tag)?;
    if moved.is_empty() {
        bail!(
            "No extraction files in {}",
            local.join(&method.archive_directory).display()
        );
    }
    for path in moved {
        info!("Extracted {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use {super::*, tempdir::TempDir};

    #[test]
    fn valid_jobs() {
        assert_eq!(
            job_id("202102031234Nl3m_a_J8R3kl.job").unwrap(),
            "202102031234Nl3m_a_J8R3kl"
        );
        assert!(job_id("202102031234Nl3m_a_J8R3kl").is_ok());
    }

    #[test]
    fn invalid_jobs() {
        assert!(job_id("192102031234Nl3m_a_J8R3kl").is_err());
        assert!(job_id("202102031234Nl3m_a_J8R3").is_err());
        assert!(job_id("2021020312_abcdef").is_err());
    }

    #[test]
    fn remote() {
        assert_eq!(remote_path("/pub/dcp/subset/", "J1"), "/pub/dcp/subset/J1");
    }

    #[test]
    fn extractions() {
        let dir = TempDir::new("download").unwrap();
        let from = dir.path().join("bcca5");
        fs::create_dir_all(&from).unwrap();
        for name in &["Extraction_pr.nc", "Extraction_tasmax.nc", "MetaData.txt"] {
            fs::write(from.join(name), name).unwrap();
        }

        let moved = collect_extractions(&from, dir.path(), "GO1", "B").unwrap();
        assert_eq!(
            moved,
            vec![dir.path().join("GO1_B_pr.nc"), dir.path().join("GO1_B_tasmax.nc")]
        );
        assert!(from.join("MetaData.txt").exists());
        assert!(!from.join("Extraction_pr.nc").exists());
    }
}
