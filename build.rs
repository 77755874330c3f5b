use std::path::PathBuf;
use std::process::Command;

/// Embeds the short commit hash (with a `-dirty` suffix for modified trees)
/// as `PULSETOUCH_GIT_HASH` for `pulsetouch --version`.
fn main() {
    let version = match git(&["rev-parse", "--short", "HEAD"]).filter(|hash| !hash.is_empty()) {
        Some(hash) => {
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .is_some_and(|status| !status.is_empty());
            if dirty { format!("{hash}-dirty") } else { hash }
        }
        None => "unknown".to_string(),
    };
    println!("cargo:rustc-env=PULSETOUCH_GIT_HASH={version}");

    let git_dir = std::env::var_os("GIT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".git"));
    for name in ["HEAD", "index", "refs"] {
        let path = git_dir.join(name);
        if path.exists() {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
