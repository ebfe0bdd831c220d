use crate::cli::CliContext;
use crate::constants;
use crate::core::identity;
use crate::util::fs as app_fs;
use anyhow::Result;

pub fn run(ctx: &CliContext) -> Result<()> {
    let paths = &ctx.paths;
    let passphrase = ctx.passphrase(true)?;
    app_fs::ensure_dir(&paths.root, constants::DATA_DIR_MODE)?;

    if identity::ensure_certificate(&paths.cert, &paths.key, passphrase.as_bytes())? {
        println!("created {} and {}", paths.cert.display(), paths.key.display());
    } else {
        println!("using existing {}", paths.cert.display());
    }
    if paths.cert.exists() {
        println!("SHA-256 fingerprint: {}", identity::fingerprint(&paths.cert)?);
    }
    Ok(())
}
