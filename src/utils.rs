use {
    anyhow::{Context, Result},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Files directly inside `dir` with extension `ext`, sorted by name.
pub fn files_with_extension<P: AsRef<Path>>(dir: P, ext: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = vec![];
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |e| e == ext) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// File name without its last extension, e.g. `H12.loss` for `H12.loss.dat`
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Recursively copies `from` into `to`, creating `to` and overwriting files.
pub fn copy_dir_all<A: AsRef<Path>, B: AsRef<Path>>(from: A, to: B) -> Result<()> {
    let (from, to) = (from.as_ref(), to.as_ref());
    fs::create_dir_all(to).with_context(|| format!("Failed to create {}", to.display()))?;

    for entry in fs::read_dir(from).with_context(|| format!("Failed to list {}", from.display()))? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

/// Number following the last `_` or leading letter of a hillslope name,
/// e.g. 12 for `p12`, `H12` or `070400010601_12`
pub fn hillslope_number(name: &str) -> Option<u32> {
    let digits = match name.rfind('_') {
        Some(i) => &name[i + 1..],
        None => name.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    digits.parse().ok()
}

#[cfg(test)]
pub(crate) fn assert_approx_eq_slice(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (i, e) in a.iter().enumerate() {
        approx::assert_abs_diff_eq!(*e, b[i], epsilon = 1.0E-9);
    }
}

#[cfg(test)]
mod test {
    use {super::*, tempdir::TempDir};

    #[test]
    fn numbers() {
        assert_eq!(hillslope_number("p12"), Some(12));
        assert_eq!(hillslope_number("H7"), Some(7));
        assert_eq!(hillslope_number("070400010601_31"), Some(31));
        assert_eq!(hillslope_number("pasture"), None);
    }

    #[test]
    fn stems() {
        assert_eq!(stem(Path::new("out/H12.loss.dat")), "H12.loss");
        assert_eq!(file_name(Path::new("out/H12.loss.dat")), "H12.loss.dat");
    }

    #[test]
    fn listing_and_copying() {
        let dir = TempDir::new("utils").unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("b.man"), "b").unwrap();
        fs::write(src.join("a.man"), "a").unwrap();
        fs::write(src.join("a.sol"), "s").unwrap();
        fs::write(src.join("nested").join("c.man"), "c").unwrap();

        let mans = files_with_extension(&src, "man").unwrap();
        assert_eq!(mans, vec![src.join("a.man"), src.join("b.man")]);

        let dst = dir.path().join("dst");
        copy_dir_all(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("nested").join("c.man")).unwrap(), "c");
        assert_eq!(fs::read_to_string(dst.join("a.sol")).unwrap(), "s");
    }
}
