use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::app::Result;
use crate::hooks::{HookContext, HookRegistry};

/// Output path that means standard output.
pub const STDOUT: &str = "-";

/// Write the finished page. Extensions get the `output_write` hook first; if
/// one stops the chain the page is considered written. Files are written to
/// `<path>.new` and renamed over `path`, so readers never see a partial page.
pub fn write_output(
    output_file: &str,
    base: &Path,
    document: &str,
    hooks: &HookRegistry,
) -> Result<()> {
    let handled = hooks.dispatch(&mut HookContext::OutputWrite {
        path: output_file,
        document,
    })?;
    if handled {
        return Ok(());
    }

    if output_file == STDOUT {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", document)?;
        return Ok(());
    }

    let path = base.join(output_file);
    let mut staging = path.clone().into_os_string();
    staging.push(".new");
    let staging = PathBuf::from(staging);

    tracing::info!(path = %path.display(), "Writing output file");
    fs::write(&staging, format!("{}\n", document))?;
    fs::rename(&staging, &path)?;
    Ok(())
}
