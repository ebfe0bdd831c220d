use crate::cli::CliContext;
use crate::constants;
use crate::core::capabilities::ApiSet;
use crate::core::config_file;
use crate::util::fs as app_fs;
use anyhow::Result;

const MACROS_TEMPLATE: &str = r#"# Macro definitions: name = 'source'
#
#   "text"              type literal text
#   enter               tap a key
#   [tap t ctrl]        key chord (tap | down | up, key, modifiers)
#   {left click}        mouse: left|middle|right click|double|down|up,
#                       click X Y (move), drag X Y, scroll N up|down|left|right;
#                       +N / -N are relative to the pointer
#   (editor ...)        focus a window, run the steps, switch back

[macros]
"#;

pub fn run(ctx: &CliContext) -> Result<()> {
    let paths = &ctx.paths;
    app_fs::ensure_dir(&paths.root, constants::DATA_DIR_MODE)?;
    app_fs::ensure_dir(&paths.texts, constants::DATA_DIR_MODE)?;

    if paths.config_toml.exists() {
        println!("config exists: {}", paths.config_toml.display());
    } else {
        let mut config = ctx.config.clone();
        if config.apis.enabled.is_empty() {
            config.apis.enabled = ApiSet::suggested().to_text();
        }
        config_file::save(&paths.config_toml, &config)?;
        println!("wrote {}", paths.config_toml.display());
    }

    if !paths.macros_toml.exists() {
        app_fs::write_atomic(&paths.macros_toml, MACROS_TEMPLATE.as_bytes())?;
        println!("wrote {}", paths.macros_toml.display());
    }

    println!("keyrelay initialized at {}", paths.root.display());
    if !paths.auth.exists() {
        println!("next: keyrelay set-auth");
    }
    Ok(())
}
