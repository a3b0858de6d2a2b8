//! Build metadata shared across the pipeline.
//! Includes the generated version.rs from the build script.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Crate version as recorded at build time
pub fn package_version() -> &'static str {
    PACKAGE_VERSION
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// One-line build description used in startup log lines
pub fn build_description() -> String {
    format!(
        "postfetch {} (git {}, built {})",
        package_version(),
        git_hash(),
        build_time()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_description_contains_all_parts() {
        let description = build_description();
        assert!(description.starts_with("postfetch "));
        assert!(description.contains(package_version()));
        assert!(description.contains(git_hash()));
        assert!(description.contains(build_time()));
    }
}
