//! External command contracts for producing the toolchain bundle
//!
//! This module provides:
//! - Shallow checkout of the LLVM monorepo at a version tag
//! - CMake configure/build/install of clang and clang-tools-extra
//! - Target triple discovery from the built clang driver
//! - tar.xz bundling with the shared-library executable-bit fix-up
//!
//! Every step runs one external program and fails hard on a nonzero exit;
//! there is no decision logic here beyond "did the program succeed".

use crate::error::ToolError;
use regex::Regex;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Upstream LLVM monorepo
const LLVM_REPO_URL: &str = "https://github.com/llvm/llvm-project/";

/// Checkout directory name under the working directory
pub const SOURCE_DIR: &str = "llvm-project";

static TARGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Target: (?P<target>.*)$").unwrap());

static SHARED_LIBRARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.so(\.\d+)*$").unwrap());

/// Runs a program with arguments in a working directory, capturing output
/// and failing on a nonzero exit status.
fn run_checked(program: &str, args: &[&str], current_dir: &Path) -> Result<Vec<u8>, ToolError> {
    let output = Command::new(program)
        .args(args)
        .current_dir(current_dir)
        .output()
        .map_err(|e| ToolError::launch(program, e))?;

    if !output.status.success() {
        return Err(ToolError::failed(program, &output));
    }

    Ok(output.stdout)
}

/// Clones the LLVM monorepo at the given version tag, depth 1.
pub fn checkout_source(work_dir: &Path, version: &str) -> Result<(), ToolError> {
    let tag = format!("llvmorg-{}", version);
    run_checked(
        "git",
        &["clone", "--depth", "1", "-b", &tag, LLVM_REPO_URL],
        work_dir,
    )?;
    Ok(())
}

/// Configures and builds the toolchain, installing into `install_dir`.
///
/// See https://llvm.org/docs/CMake.html#llvm-specific-variables for the cache
/// variables defined by LLVM. A release build implies
/// LLVM_ENABLE_ASSERTIONS=OFF.
pub fn configure_and_build(
    work_dir: &Path,
    build_dir: &Path,
    install_dir: &Path,
) -> Result<(), ToolError> {
    let source = work_dir.join(SOURCE_DIR).join("llvm");
    let source_arg = source.display().to_string();
    let install_prefix = format!("-DCMAKE_INSTALL_PREFIX={}", install_dir.display());

    run_checked(
        "cmake",
        &[
            "-G",
            "Unix Makefiles",
            "-DCMAKE_BUILD_TYPE=Release",
            "-DLLVM_ENABLE_PROJECTS=clang;clang-tools-extra",
            &install_prefix,
            "-DLLVM_TARGETS_TO_BUILD=all",
            "-DLLVM_INCLUDE_EXAMPLES=OFF",
            "-DLLVM_INCLUDE_TESTS=OFF",
            "-DLLVM_INCLUDE_GO_TESTS=OFF",
            "-DLLVM_INCLUDE_DOCS=OFF",
            "-DLLVM_ENABLE_TERMINFO=OFF",
            "-DLLVM_ENABLE_ZLIB=OFF",
            "-DLLVM_ENABLE_LIBEDIT=OFF",
            "-DLLVM_ENABLE_LIBXML2=OFF",
            &source_arg,
        ],
        build_dir,
    )?;

    run_checked("cmake", &["--build", ".", "--target", "install"], build_dir)?;
    Ok(())
}

/// Extracts the target triple from `clang -###` diagnostic output.
pub fn parse_target(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        TARGET_RE
            .captures(line)
            .map(|caps| caps["target"].to_string())
    })
}

/// Discovers the target triple of the built toolchain.
///
/// The triple comes from the toolchain itself, not from the operator.
pub fn discover_target(install_dir: &Path) -> Result<String, ToolError> {
    let clang = install_dir.join("bin").join("clang");
    let output = Command::new(&clang)
        .arg("-###")
        .output()
        .map_err(|e| ToolError::launch(clang.display().to_string(), e))?;

    // clang -### writes its diagnostics to stderr
    let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stdout));

    parse_target(&text).ok_or_else(|| ToolError::no_output("clang", "cannot deduce target triple"))
}

/// Returns the expected bundle name for a version and target triple.
pub fn bundle_name(bundle_version: &str, target: &str) -> String {
    format!("clang+llvm-{}-{}", bundle_version, target)
}

/// Adds the executable bit to shared libraries under the install tree.
///
/// The .so files are not installed as executable; the bit is added wherever
/// the file is already readable.
fn fix_shared_library_modes(install_dir: &Path) -> Result<(), ToolError> {
    for entry in WalkDir::new(install_dir) {
        let entry = entry.map_err(|e| {
            ToolError::io(install_dir, e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "walk failed")
            }))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !SHARED_LIBRARY_RE.is_match(&name) {
            continue;
        }

        let metadata = entry
            .metadata()
            .map_err(|e| {
                ToolError::io(entry.path(), e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "metadata failed")
                }))
            })?;
        let mut permissions = metadata.permissions();
        let mode = permissions.mode();
        permissions.set_mode(mode | ((mode & 0o444) >> 2));
        std::fs::set_permissions(entry.path(), permissions)
            .map_err(|e| ToolError::io(entry.path(), e))?;
    }
    Ok(())
}

/// Bundles the install tree into a tar.xz archive with every path prefixed
/// by the bundle name.
pub fn bundle(
    install_dir: &Path,
    bundle_name: &str,
    archive_path: &Path,
) -> Result<(), ToolError> {
    fix_shared_library_modes(install_dir)?;

    let archive = archive_path.display().to_string();
    let directory = install_dir.display().to_string();
    let transform = format!("s,^\\./,{}/,", bundle_name);

    run_checked(
        "tar",
        &[
            "--create",
            "--xz",
            "--file",
            &archive,
            "--directory",
            &directory,
            "--transform",
            &transform,
            ".",
        ],
        install_dir,
    )?;
    Ok(())
}

/// The bundle archive filename for a version and target.
pub fn archive_name(bundle_version: &str, target: &str) -> String {
    format!("{}.tar.xz", bundle_name(bundle_version, target))
}

/// Install-relative paths of the binaries whose runtime footprint is audited.
pub fn audited_binaries(install_dir: &Path) -> Vec<(String, PathBuf)> {
    vec![
        (
            "libclang".to_string(),
            install_dir.join("lib").join("libclang.so"),
        ),
        ("clangd".to_string(), install_dir.join("bin").join("clangd")),
    ]
}
