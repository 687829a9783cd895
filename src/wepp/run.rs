use {
    crate::{
        layout::Layout,
        parameters::Parameters,
        utils::{files_with_extension, stem},
    },
    anyhow::{anyhow, Context, Result},
    log::{debug, info},
    rayon::prelude::*,
    std::{
        fs::{self, File},
        path::Path,
        process::{Command, Stdio},
    },
};

/// Runs WEPP in `runs` with `run_file` as its standard input.
pub fn run_hillslope(program: &Path, runs: &Path, run_file: &Path) -> Result<()> {
    let name = stem(run_file);
    let input = File::open(run_file).with_context(|| format!("Failed to open {}", run_file.display()))?;

    let output = Command::new(program)
        .current_dir(runs)
        .stdin(Stdio::from(input))
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to start {}", program.display()))?;

    if output.status.success() {
        debug!("Finished hillslope {}", name);
        Ok(())
    } else {
        Err(anyhow!(
            "WEPP failed on hillslope {} ({}): {}",
            name,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}

/// Runs every hillslope of a run directory, e.g. `CC/B3_59`, in parallel.
/// Returns the number of hillslopes simulated.
pub fn run(params: &Parameters, watershed: &str, run: &Path) -> Result<usize> {
    let layout = Layout::new(params, watershed);
    let runs = layout.runs(run);
    let output = layout.output(run);
    fs::create_dir_all(&output).with_context(|| format!("Failed to create {}", output.display()))?;

    let program = params.environment.resolve(&params.environment.wepp);
    let run_files = files_with_extension(&runs, "run")?;
    info!("Running {} hillslopes in {}", run_files.len(), runs.display());

    run_files
        .par_iter()
        .map(|run_file| run_hillslope(&program, &runs, run_file))
        .collect::<Result<()>>()?;

    Ok(run_files.len())
}

#[cfg(all(test, unix))]
mod test {
    use {super::*, std::path::PathBuf, tempdir::TempDir};

    #[test]
    fn failing_hillslope_is_named() {
        let dir = TempDir::new("wepp").unwrap();
        let run_file = dir.path().join("p7.run");
        fs::write(&run_file, "m\n").unwrap();

        assert!(run_hillslope(&PathBuf::from("true"), dir.path(), &run_file).is_ok());
        let e = run_hillslope(&PathBuf::from("false"), dir.path(), &run_file).unwrap_err();
        assert!(e.to_string().contains("hillslope p7"));
    }

    #[test]
    fn missing_program() {
        let dir = TempDir::new("wepp").unwrap();
        let run_file = dir.path().join("p1.run");
        fs::write(&run_file, "").unwrap();
        assert!(run_hillslope(&dir.path().join("wepp"), dir.path(), &run_file).is_err());
    }
}
