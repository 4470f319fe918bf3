use std::path::{Path, PathBuf};
use std::process::Command;

const SHA_VAR: &str = "DAYBOOK_BUILD_SHA";

fn git(repo: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git").arg("-C").arg(repo).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let s = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!s.is_empty()).then_some(s)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let repo_root = PathBuf::from(manifest_dir).join("..");

    // Packaged builds have no .git; let the packager pass the SHA in.
    println!("cargo:rerun-if-env-changed={SHA_VAR}");
    let sha = std::env::var(SHA_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| git(&repo_root, &["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());

    // Rebuild when HEAD moves: on checkout (HEAD) and on commit (the branch ref).
    if let Some(git_dir) = git(&repo_root, &["rev-parse", "--absolute-git-dir"]) {
        let git_dir = PathBuf::from(git_dir);
        println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
        if let Some(head_ref) = git(&repo_root, &["symbolic-ref", "-q", "HEAD"]) {
            println!("cargo:rerun-if-changed={}", git_dir.join(head_ref).display());
        }
    }

    println!("cargo:rustc-env={SHA_VAR}={sha}");
}
