fn main() {
    // Only fetch the mermaid bundle when the embed feature is enabled
    #[cfg(feature = "embed")]
    {
        use std::path::{Path, PathBuf};
        use std::process::Command;

        fn run_npm(args: &[&str], cwd: &Path) -> std::io::Result<std::process::Output> {
            #[cfg(target_os = "windows")]
            {
                Command::new("cmd")
                    .args(["/C", "npm"])
                    .args(args)
                    .current_dir(cwd)
                    .output()
            }
            #[cfg(not(target_os = "windows"))]
            {
                Command::new("npm").args(args).current_dir(cwd).output()
            }
        }

        println!("cargo:rerun-if-changed=build.rs");
        println!("cargo:rerun-if-changed=assets/package.json");
        println!("cargo:rerun-if-env-changed=MDFLUX_MERMAID_JS");

        // A pre-downloaded bundle skips npm entirely (offline builds)
        let bundle = if let Some(path) = std::env::var_os("MDFLUX_MERMAID_JS") {
            PathBuf::from(path)
        } else {
            let assets_dir = Path::new("assets");
            let bundle = assets_dir.join("node_modules/mermaid/dist/mermaid.min.js");
            if !bundle.exists() {
                let install = run_npm(&["install", "--no-audit", "--no-fund"], assets_dir)
                    .expect("failed to run npm install");
                assert!(
                    install.status.success(),
                    "failed to install mermaid:\n{}",
                    String::from_utf8_lossy(&install.stderr)
                );
            }
            bundle
        };

        let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
        std::fs::copy(&bundle, out_dir.join("mermaid.min.js"))
            .unwrap_or_else(|err| panic!("failed to copy {}: {err}", bundle.display()));
        println!("cargo:rerun-if-changed={}", bundle.display());
    }
}
